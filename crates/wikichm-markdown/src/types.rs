//! Type definitions for the Markdown processor.
//!
//! # Examples
//!
//! ```
//! use wikichm_markdown::{MarkdownOptions, MarkdownProcessor};
//!
//! let options = MarkdownOptions {
//!   wiki_links: false,
//!   ..Default::default()
//! };
//!
//! let processor = MarkdownProcessor::new(options);
//! ```

/// Options for configuring the Markdown processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct MarkdownOptions {
  /// Enable GitHub Flavored Markdown extensions (tables, strikethrough,
  /// autolinks, task lists, footnotes).
  pub gfm: bool,

  /// Render `[[Page]]` and `[[Label|Page]]` wiki links as anchors.
  pub wiki_links: bool,

  /// Pass raw HTML in the source through to the output. Wiki pages
  /// routinely embed HTML, so this is on by default.
  pub raw_html: bool,

  /// Render soft line breaks as `<br />`.
  pub hard_breaks: bool,
}

impl Default for MarkdownOptions {
  fn default() -> Self {
    Self {
      gfm:         true,
      wiki_links:  true,
      raw_html:    true,
      hard_breaks: false,
    }
  }
}

/// Main Markdown processor.
///
/// Cheap to copy and safe to share between threads; rendering never touches
/// shared mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownProcessor {
  pub(crate) options: MarkdownOptions,
}

/// Builder for constructing `MarkdownOptions` with method chaining.
#[derive(Debug, Clone)]
pub struct MarkdownOptionsBuilder {
  options: MarkdownOptions,
}

impl MarkdownOptionsBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self {
      options: MarkdownOptions::default(),
    }
  }

  /// Enable or disable GitHub Flavored Markdown.
  #[must_use]
  pub const fn gfm(mut self, enabled: bool) -> Self {
    self.options.gfm = enabled;
    self
  }

  /// Enable or disable wiki link syntax.
  #[must_use]
  pub const fn wiki_links(mut self, enabled: bool) -> Self {
    self.options.wiki_links = enabled;
    self
  }

  /// Enable or disable raw HTML passthrough.
  #[must_use]
  pub const fn raw_html(mut self, enabled: bool) -> Self {
    self.options.raw_html = enabled;
    self
  }

  /// Enable or disable hard line breaks.
  #[must_use]
  pub const fn hard_breaks(mut self, enabled: bool) -> Self {
    self.options.hard_breaks = enabled;
    self
  }

  /// Build the final `MarkdownOptions`.
  #[must_use]
  pub const fn build(self) -> MarkdownOptions {
    self.options
  }
}

impl Default for MarkdownOptionsBuilder {
  fn default() -> Self {
    Self::new()
  }
}
