//! Built-in message handlers
//!
//! Each handler implements [`crate::services::GroupHandler`], does its own
//! group and command gating, and owns its daily job through a
//! [`crate::services::JobSlot`].

mod rank;
mod word_cloud;

pub use rank::RankHandler;
pub use word_cloud::WordCloudHandler;
