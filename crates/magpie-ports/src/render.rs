//! Word-cloud rendering port

use async_trait::async_trait;
use magpie_core::error::Result;

/// Renders collected message texts into a shareable image.
///
/// The production adapter posts the texts to an external rendering service;
/// from the core's perspective it is texts in, PNG bytes out.
#[async_trait]
pub trait CloudRenderer: Send + Sync {
    /// Render `texts` into a PNG image
    async fn render(&self, texts: &[String]) -> Result<Vec<u8>>;
}
