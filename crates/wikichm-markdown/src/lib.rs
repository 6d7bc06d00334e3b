//! # wikichm-markdown
//!
//! Renders GitHub wiki flavored Markdown to HTML fragments for `wikichm`.
//!
//! ```rust
//! use wikichm_markdown::{MarkdownOptions, MarkdownProcessor};
//!
//! let processor = MarkdownProcessor::new(MarkdownOptions::default());
//! let html = processor.render("# Hello\n\nSee [[Other Page]].");
//!
//! assert!(html.contains("<h1>Hello</h1>"));
//! ```
//!
//! The processor holds no mutable state. Every call to
//! [`MarkdownProcessor::render`] builds its own parse arena, so one instance
//! can be shared by reference between worker threads.
mod error;
mod processor;
mod types;

pub use error::MarkdownError;
pub use types::{MarkdownOptions, MarkdownOptionsBuilder, MarkdownProcessor};
