//! Markdown → styled HTML.
//!
//! Every node type the renderer styles maps to one `Element` variant; the
//! renderer walks the comrak AST and dispatches on that variant.

pub mod elements;
pub mod handlers;
pub mod renderer;

pub use renderer::MarkdownRenderer;
