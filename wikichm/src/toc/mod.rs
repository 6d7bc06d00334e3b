//! Table of contents tree shown next to the pages of the compiled help.
pub mod sidebar;

use std::path::Path;

use crate::{html::headings::extract_headings, project::FileId};

/// One entry of the table of contents.
///
/// The root item has no name and no link; its children are the top-level
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocItem {
  pub name:     String,
  /// Anchor inside the linked page.
  pub fragment: Option<String>,
  pub file:     Option<FileId>,
  pub children: Vec<TocItem>,
}

impl TocItem {
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  #[must_use]
  pub const fn with_file(mut self, file: FileId) -> Self {
    self.file = Some(file);
    self
  }

  #[must_use]
  pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
    self.fragment = Some(fragment.into());
    self
  }

  /// Total number of entries below this one.
  #[must_use]
  pub fn len(&self) -> usize {
    self
      .children
      .iter()
      .map(|child| 1 + child.len())
      .sum()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }
}

/// Display name of a page: its file name without extension, dashes turned
/// into spaces.
#[must_use]
pub fn page_title(target: &Path) -> String {
  target
    .file_stem()
    .map(|stem| stem.to_string_lossy().replace('-', " "))
    .unwrap_or_default()
}

/// Build the entry for one converted page.
///
/// With `section_links` the entry gets a child per heading that carries an
/// id. A page with a single heading gets none, since that link would only
/// repeat the page link.
#[must_use]
pub fn page_entry(
  file: FileId,
  target: &Path,
  html: &str,
  section_links: bool,
) -> TocItem {
  let mut entry = TocItem::new(page_title(target)).with_file(file);

  if section_links {
    entry.children = extract_headings(html)
      .into_iter()
      .map(|heading| {
        TocItem::new(heading.text)
          .with_file(file)
          .with_fragment(heading.id)
      })
      .collect();

    if entry.children.len() == 1 {
      entry.children.clear();
    }
  }

  entry
}

/// Arrange page entries into the final tree.
///
/// Entries keep the order they are given in, except the default page, which
/// always comes first. With `root_item_name` every entry goes under a single
/// wrapper item of that name, which links to the default page.
#[must_use]
pub fn assemble(
  entries: impl IntoIterator<Item = TocItem>,
  default_file: Option<FileId>,
  root_item_name: Option<&str>,
) -> TocItem {
  let mut container = TocItem::default();

  for entry in entries {
    if entry.file.is_some() && entry.file == default_file {
      container.children.insert(0, entry);
    } else {
      container.children.push(entry);
    }
  }

  match root_item_name {
    Some(name) => {
      let mut wrapper = container;
      wrapper.name = name.to_string();
      wrapper.file = default_file;
      TocItem {
        children: vec![wrapper],
        ..TocItem::default()
      }
    },
    None => container,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_title() {
    assert_eq!(page_title(Path::new("/t/Getting-Started.html")), "Getting Started");
    assert_eq!(page_title(Path::new("/t/guides/FAQ.html")), "FAQ");
  }

  #[test]
  fn test_page_entry_with_sections() {
    let html = r#"<h1 id="title">Title</h1><h2 id="usage">Usage</h2>"#;
    let entry = page_entry(FileId(2), Path::new("/t/My-Page.html"), html, true);

    assert_eq!(entry.name, "My Page");
    assert_eq!(entry.file, Some(FileId(2)));
    assert_eq!(entry.children.len(), 2);
    assert_eq!(entry.children[1].name, "Usage");
    assert_eq!(entry.children[1].fragment.as_deref(), Some("usage"));
    assert_eq!(entry.children[1].file, Some(FileId(2)));
  }

  #[test]
  fn test_single_heading_is_elided() {
    let html = r#"<h1 id="title">Title</h1><p>text</p>"#;
    let entry = page_entry(FileId(0), Path::new("/t/Home.html"), html, true);
    assert!(entry.children.is_empty());
  }

  #[test]
  fn test_section_links_disabled() {
    let html = r#"<h1 id="a">A</h1><h2 id="b">B</h2>"#;
    let entry = page_entry(FileId(0), Path::new("/t/Home.html"), html, false);
    assert!(entry.children.is_empty());
  }

  #[test]
  fn test_default_page_goes_first() {
    let entries = vec![
      TocItem::new("A").with_file(FileId(0)),
      TocItem::new("Home").with_file(FileId(1)),
      TocItem::new("B").with_file(FileId(2)),
    ];
    let root = assemble(entries, Some(FileId(1)), None);

    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Home", "A", "B"]);
    assert_eq!(root.len(), 3);
  }

  #[test]
  fn test_root_wrapper() {
    let entries = vec![
      TocItem::new("A").with_file(FileId(0)),
      TocItem::new("Home").with_file(FileId(1)),
    ];
    let root = assemble(entries, Some(FileId(1)), Some("My Wiki"));

    assert_eq!(root.children.len(), 1);
    let wrapper = &root.children[0];
    assert_eq!(wrapper.name, "My Wiki");
    assert_eq!(wrapper.file, Some(FileId(1)));
    assert_eq!(wrapper.children[0].name, "Home");
    assert_eq!(wrapper.children[1].name, "A");
  }
}
