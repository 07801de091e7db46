//! Port trait definitions for Magpie
//!
//! This crate contains all port (interface) traits following Clean Architecture.
//! Infrastructure adapters implement these traits, the application layer uses
//! them. Extracting them into their own crate keeps the application and testing
//! crates free of circular dependencies.
//!
//! # Port Types
//!
//! - **Session port**: the realtime platform connection (event stream,
//!   resubscription operations)
//! - **Messaging ports**: outbound sends and group roster lookup
//! - **Store ports**: per-group interaction and message-text accumulation
//! - **Render port**: external word-cloud image rendering
//! - **Scheduler port**: cron-style recurring jobs with stoppable handles

mod messaging;
mod render;
mod scheduler;
mod session;
mod store;

pub use messaging::{Member, MemberRoster, MessageSender};
pub use render::CloudRenderer;
pub use scheduler::{JobFn, JobHandle, Scheduler};
pub use session::ConnectionSession;
pub use store::{MessageStore, RankStore, UserCount};

// Type aliases for convenience
use std::sync::Arc;

/// Thread-safe reference to a connection session
pub type ConnectionSessionRef = Arc<dyn ConnectionSession + Send + Sync>;

/// Thread-safe reference to a message sender
pub type MessageSenderRef = Arc<dyn MessageSender + Send + Sync>;

/// Thread-safe reference to a member roster
pub type MemberRosterRef = Arc<dyn MemberRoster + Send + Sync>;

/// Thread-safe reference to a rank store
pub type RankStoreRef = Arc<dyn RankStore + Send + Sync>;

/// Thread-safe reference to a message store
pub type MessageStoreRef = Arc<dyn MessageStore + Send + Sync>;

/// Thread-safe reference to a cloud renderer
pub type CloudRendererRef = Arc<dyn CloudRenderer + Send + Sync>;

/// Thread-safe reference to a scheduler
pub type SchedulerRef = Arc<dyn Scheduler + Send + Sync>;
