use std::{io, path::PathBuf};

use thiserror::Error;

/// Error type for Markdown rendering operations.
#[derive(Debug, Error)]
pub enum MarkdownError {
  #[error("Failed to read markdown file {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}
