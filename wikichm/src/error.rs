use std::{fmt, io, path::PathBuf};

use thiserror::Error;
use wikichm_markdown::MarkdownError;

/// Top-level error type for the wikichm crate.
#[derive(Debug, Error)]
pub enum ChmError {
  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Root path doesn't exist: {}", .0.display())]
  MissingRoot(PathBuf),

  #[error("Found no pages in project root path: {}", .0.display())]
  EmptyProject(PathBuf),

  #[error("I/O error on {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Markdown(#[from] MarkdownError),

  #[error("Compiler error: {0}")]
  Compiler(String),

  #[error("Formatting error: {0}")]
  Fmt(#[from] fmt::Error),

  #[error("TOML error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("Serde error: {0}")]
  Serde(#[from] serde_json::Error),
}

impl ChmError {
  /// Wrap an I/O error together with the path it happened on.
  pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

/// Error type for the remote dependency download phase.
#[derive(Debug, Error)]
pub enum DownloadError {
  #[error("Failed to start the download runtime: {0}")]
  Runtime(#[source] io::Error),

  #[error("HTTP client error: {0}")]
  Client(#[from] reqwest::Error),

  #[error("{url} responded with {status}")]
  Status {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("Failed to write {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}
