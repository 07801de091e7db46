//! Mock implementations for testing
//!
//! These mocks implement the port traits from `magpie-ports` and can be used
//! in unit and integration tests.
//!
//! - [`MockConnectionSession`] - broadcast-backed session with resubscription counters
//! - [`MockMessageSender`] - records text and image sends
//! - [`MockMemberRoster`] - per-group member lists set by the test
//! - [`MockRankStore`] / [`MockMessageStore`] - in-memory accumulation stores
//! - [`MockCloudRenderer`] - fixed-bytes renderer with a failure switch
//! - [`MockScheduler`] - manually ticked scheduler with stoppable handles

mod messaging;
mod scheduler;
mod session;
mod stores;

pub use messaging::{MockMemberRoster, MockMessageSender};
pub use scheduler::{MockJobHandle, MockScheduler};
pub use session::MockConnectionSession;
pub use stores::{MockCloudRenderer, MockMessageStore, MockRankStore};
