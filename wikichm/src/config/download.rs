use serde::{Deserialize, Serialize};

const fn default_max_downloads() -> usize {
  8
}

/// Remote image download options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
  /// Number of transfers running at the same time.
  #[serde(default = "default_max_downloads")]
  pub max_downloads: usize,

  /// Skip TLS certificate verification.
  #[serde(default)]
  pub ignore_ssl: bool,

  /// Log connection level details of every transfer.
  #[serde(default)]
  pub verbose: bool,
}

impl Default for DownloadConfig {
  fn default() -> Self {
    Self {
      max_downloads: default_max_downloads(),
      ignore_ssl:    false,
      verbose:       false,
    }
  }
}
