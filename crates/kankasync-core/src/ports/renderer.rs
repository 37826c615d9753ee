//! Markdown rendering port
//!
//! Converts document source text into the display format the remote API
//! stores (HTML for Kanka). Rendering is pure and synchronous.

/// Port trait for source-to-display conversion
pub trait IMarkdownRenderer: Send + Sync {
    /// Renders Markdown source into the remote display format
    fn render(&self, source: &str) -> String;
}
