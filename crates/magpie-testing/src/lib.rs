//! Test utilities for Magpie
//!
//! This crate provides mocks, fixtures, and helpers for testing Magpie
//! components.
//!
//! # Mocks
//!
//! - [`MockConnectionSession`] - session backed by a test-driven broadcast
//!   channel, with resubscription counters and a failure switch
//! - [`MockMessageSender`] - records every text and image send
//! - [`MockMemberRoster`] - per-group member lists set by the test
//! - [`MockRankStore`] - in-memory interaction counts
//! - [`MockMessageStore`] - in-memory collected texts
//! - [`MockCloudRenderer`] - fixed PNG bytes, failure switch, call counter
//! - [`MockScheduler`] - holds jobs and runs them on [`MockScheduler::run_all`]
//!
//! # Fixtures
//!
//! - [`fixtures::heartbeat`] / [`fixtures::group_text`] - ready-made events
//! - [`fixtures::sample_message`] / [`fixtures::member`] - handler inputs
//!
//! # Usage
//!
//! ```no_run
//! use magpie_testing::{fixtures, MockConnectionSession};
//! use std::sync::Arc;
//!
//! let session = Arc::new(MockConnectionSession::new());
//! let mut events = magpie_ports::ConnectionSession::subscribe(session.as_ref());
//! session.emit(fixtures::heartbeat(5000));
//! ```

pub mod fixtures;
mod mocks;
pub mod proptest_config;

pub use mocks::{
    MockCloudRenderer, MockConnectionSession, MockJobHandle, MockMemberRoster, MockMessageSender,
    MockMessageStore, MockRankStore, MockScheduler,
};
