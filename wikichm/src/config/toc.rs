use serde::{Deserialize, Serialize};

/// Where the table of contents comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TocSource {
  /// `_Sidebar.md` if the wiki has one, page headings otherwise.
  #[default]
  Auto,
  /// Always generate from pages and their headings.
  Headings,
}

const fn default_true() -> bool {
  true
}

/// Table of contents options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocConfig {
  #[serde(default)]
  pub source: TocSource,

  /// Name of a single top-level entry holding every page. Only used for
  /// generated tables of contents.
  #[serde(default)]
  pub root_item_name: Option<String>,

  /// Whether generated entries list the sections of each page.
  #[serde(default = "default_true")]
  pub section_links: bool,
}

impl Default for TocConfig {
  fn default() -> Self {
    Self {
      source:         TocSource::default(),
      root_item_name: None,
      section_links:  default_true(),
    }
  }
}
