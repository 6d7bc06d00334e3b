//! Rendering pipeline built on `comrak`.
use std::{fs, path::Path};

use comrak::{markdown_to_html, options::Options};
use log::trace;

use crate::{
  error::MarkdownError,
  types::{MarkdownOptions, MarkdownProcessor},
};

impl MarkdownProcessor {
  /// Create a new `MarkdownProcessor` with the given options.
  #[must_use]
  pub const fn new(options: MarkdownOptions) -> Self {
    Self { options }
  }

  /// Access processor options.
  #[must_use]
  pub const fn options(&self) -> &MarkdownOptions {
    &self.options
  }

  /// Render Markdown source to an HTML fragment (no `<html>`/`<body>`
  /// wrapper).
  #[must_use]
  pub fn render(&self, content: &str) -> String {
    let mut options = Options::default();
    self.configure(&mut options);
    markdown_to_html(content, &options)
  }

  /// Read a Markdown file and render it to an HTML fragment.
  ///
  /// # Errors
  ///
  /// Returns [`MarkdownError::Read`] if the file cannot be read as UTF-8.
  pub fn render_file(&self, path: &Path) -> Result<String, MarkdownError> {
    trace!("Rendering markdown file {}", path.display());
    let content =
      fs::read_to_string(path).map_err(|source| MarkdownError::Read {
        path: path.to_path_buf(),
        source,
      })?;
    Ok(self.render(&content))
  }

  fn configure(&self, options: &mut Options) {
    if self.options.gfm {
      options.extension.table = true;
      options.extension.strikethrough = true;
      options.extension.autolink = true;
      options.extension.tasklist = true;
      options.extension.footnotes = true;
    }

    // GitHub wikis put the label first: [[Label|Page]]
    options.extension.wikilinks_title_before_pipe = self.options.wiki_links;

    options.render.r#unsafe = self.options.raw_html;
    options.render.hardbreaks = self.options.hard_breaks;
  }
}
