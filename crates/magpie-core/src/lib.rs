//! Magpie Core - Domain model for the bot event pipeline
//!
//! This crate contains the domain types shared by every other layer.
//! It has minimal dependencies and no infrastructure concerns.
//!
//! # Architecture
//!
//! - `event` - Inbound events decoded from the platform connection
//!   (heartbeats, group messages)
//! - `message` - Message segment model and plain-text extraction
//! - `ids` - Identifier newtypes (GroupId, UserId, MessageId)
//! - `error` - Domain error types
//!
//! # Related Crates
//!
//! - Port traits (ConnectionSession, MessageSender, etc.): `magpie-ports`
//! - Middleware and watchdog: `magpie-application`
//! - Config types: `magpie-config`

pub mod error;
pub mod event;
pub mod ids;
pub mod message;

pub use error::{Error, Result};
pub use event::{Event, GroupMessage, Heartbeat};
pub use ids::{GroupId, MessageId, UserId};
pub use message::{Segment, DEFAULT_SEGMENT_JOINER};
