//! Mapping link targets back to project pages.
use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use log::warn;

use super::{FileId, ProjectFile};
use crate::{
  url::ParsedUrl,
  utils::{local_path, relative_path, web_path},
};

#[derive(Debug)]
struct Entry {
  id:       FileId,
  /// Source path relative to the root, `/`-separated.
  original: String,
  slug:     String,
  target:   PathBuf,
}

/// Looks up pages by the loosely written paths wiki links use.
///
/// A link matches a page when its path equals the page's path relative to
/// the root, or failing that, when both normalise to the same slug (see
/// [`page_slug`]). Pages are tried in discovery order.
#[derive(Debug)]
pub struct Resolver {
  entries: Vec<Entry>,
}

impl Resolver {
  /// Index `files`. Targets must already be planned.
  #[must_use]
  pub fn new(root: &Path, files: &[ProjectFile]) -> Self {
    let entries: Vec<Entry> = files
      .iter()
      .enumerate()
      .map(|(index, file)| {
        let original = web_path(&relative_path(&file.original, root));
        Entry {
          id: FileId(index),
          slug: page_slug(&original),
          target: file.target.clone(),
          original,
        }
      })
      .collect();

    warn_ambiguous_slugs(&entries);
    Self { entries }
  }

  /// Find the page a link points to.
  ///
  /// Returns `None` for links with a host, links without a path (such as
  /// `#fragment`) and links that match no page.
  #[must_use]
  pub fn find_file(&self, raw: &str) -> Option<FileId> {
    self.find_parsed(&ParsedUrl::parse(raw))
  }

  /// Same as [`Resolver::find_file`] for an already parsed link.
  #[must_use]
  pub fn find_parsed(&self, url: &ParsedUrl) -> Option<FileId> {
    if !url.is_local() {
      return None;
    }

    let decoded = url.decoded_path();
    let path = local_path(&decoded);
    if path.is_empty() {
      return None;
    }

    if let Some(entry) = self.entries.iter().find(|e| e.original == path) {
      return Some(entry.id);
    }

    let slug = page_slug(path);
    self
      .entries
      .iter()
      .find(|entry| entry.slug == slug)
      .map(|entry| entry.id)
  }

  /// Planned target of a page.
  #[must_use]
  pub fn target(&self, id: FileId) -> Option<&Path> {
    self.entries.get(id.0).map(|entry| entry.target.as_path())
  }
}

fn warn_ambiguous_slugs(entries: &[Entry]) {
  let mut first_by_slug: HashMap<&str, &str> = HashMap::new();
  for entry in entries {
    if let Some(first) = first_by_slug.get(entry.slug.as_str()) {
      warn!(
        "Pages \"{first}\" and \"{}\" both match links to \"{}\"; links will \
         resolve to \"{first}\"",
        entry.original, entry.slug
      );
    } else {
      first_by_slug.insert(&entry.slug, &entry.original);
    }
  }
}

/// Normalise a page path for loose matching.
///
/// A trailing `.md` or `.html` is removed, letters and digits are
/// lower-cased, whitespace becomes `-`, `-` and `/` are kept and everything
/// else is dropped. `My-Page.md`, `my page` and `My%20Page` (once decoded)
/// all give `my-page`.
#[must_use]
pub fn page_slug(path: &str) -> String {
  let path = strip_page_extension(path.trim());
  let mut slug = String::with_capacity(path.len());

  for c in path.chars() {
    if c.is_whitespace() || c == '-' {
      slug.push('-');
    } else if c == '/' || c == '\\' {
      slug.push('/');
    } else if c.is_alphanumeric() {
      slug.extend(c.to_lowercase());
    }
  }

  slug
}

fn strip_page_extension(path: &str) -> &str {
  for ext in [".md", ".html"] {
    let Some(split) = path.len().checked_sub(ext.len()) else {
      continue;
    };
    if path.is_char_boundary(split) && path[split..].eq_ignore_ascii_case(ext) {
      return &path[..split];
    }
  }
  path
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page(root: &str, temp: &str, rel: &str, target: &str) -> ProjectFile {
    let mut file = ProjectFile::new(Path::new(root).join(rel));
    file.target = Path::new(temp).join(target);
    file
  }

  fn resolver(pages: &[(&str, &str)]) -> Resolver {
    let files: Vec<ProjectFile> = pages
      .iter()
      .map(|(rel, target)| page("/wiki", "/wiki/temp", rel, target))
      .collect();
    Resolver::new(Path::new("/wiki"), &files)
  }

  #[test]
  fn test_page_slug() {
    assert_eq!(page_slug("My-Page.md"), "my-page");
    assert_eq!(page_slug("my page"), page_slug("My-Page.md"));
    assert_eq!(page_slug("Guides/Set Up (Linux).HTML"), "guides/set-up-linux");
    assert_eq!(page_slug("C++ & Rust"), "c--rust");
  }

  #[test]
  fn test_exact_match() {
    let resolver = resolver(&[("Home.md", "Home.html"), ("Page.md", "Page.html")]);
    assert_eq!(resolver.find_file("Page.md"), Some(FileId(1)));
    assert_eq!(resolver.find_file("/Page.md"), Some(FileId(1)));
    assert_eq!(resolver.find_file("./Home.md#top"), Some(FileId(0)));
  }

  #[test]
  fn test_slug_match() {
    let resolver = resolver(&[
      ("Home.md", "Home.html"),
      ("Getting-Started.md", "Getting-Started.html"),
      ("guides/Advanced Usage.md", "guides/Advanced Usage.html"),
    ]);
    assert_eq!(resolver.find_file("Getting-Started"), Some(FileId(1)));
    assert_eq!(resolver.find_file("getting started"), Some(FileId(1)));
    assert_eq!(resolver.find_file("Getting%20Started"), Some(FileId(1)));
    assert_eq!(resolver.find_file("Getting-Started.html"), Some(FileId(1)));
    assert_eq!(
      resolver.find_file("guides/advanced-usage"),
      Some(FileId(2))
    );
  }

  #[test]
  fn test_rejects_non_local_and_empty() {
    let resolver = resolver(&[("Home.md", "Home.html")]);
    assert_eq!(resolver.find_file("https://github.com/Home"), None);
    assert_eq!(resolver.find_file("mailto:home@example.com"), None);
    assert_eq!(resolver.find_file("#section"), None);
    assert_eq!(resolver.find_file(""), None);
    assert_eq!(resolver.find_file("Missing"), None);
  }

  #[test]
  fn test_ambiguous_slug_takes_first() {
    let resolver = resolver(&[("My Page.md", "My Page.html"), ("My-Page.md", "My-Page.html")]);
    assert_eq!(resolver.find_file("my-page"), Some(FileId(0)));
    assert_eq!(resolver.find_file("My-Page.md"), Some(FileId(1)));
  }

  #[test]
  fn test_target() {
    let resolver = resolver(&[("guides/Intro.md", "guides/Intro.html")]);
    assert_eq!(
      resolver.target(FileId(0)),
      Some(Path::new("/wiki/temp/guides/Intro.html"))
    );
    assert_eq!(resolver.target(FileId(3)), None);
  }
}
