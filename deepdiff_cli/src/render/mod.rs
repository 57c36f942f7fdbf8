//! Interchangeable output backends over the read-only result model.

mod html;
mod json;
mod text;

pub use html::HtmlRenderer;
pub use json::JsonRenderer;
pub use text::TextRenderer;

use anyhow::Result;
use deepdiff_common::{DiffResult, DiffStats};

/// A rendering backend. Implementations write to their own sink and must
/// not mutate the result or the stats.
pub trait Renderer {
    fn render(&mut self, result: &DiffResult) -> Result<()>;

    /// Summary-only mode (`--stat`).
    fn render_stats(&mut self, stats: &DiffStats) -> Result<()>;
}

/// Truncate a hex digest for display, or a dash when absent.
pub(crate) fn truncate_hash(digest: Option<&str>) -> &str {
    match digest {
        Some(hash) => &hash[..hash.len().min(8)],
        None => "-",
    }
}
