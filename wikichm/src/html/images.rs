//! `<img>` scanning for files the compiled help needs next to the pages.
use std::{path::Path, sync::LazyLock};

use log::{debug, warn};
use regex::Regex;

use super::never_matching_regex;
use crate::{
  project::Dependencies,
  url::{ParsedUrl, percent_decode},
  utils::{is_contained, local_path, relative_path, web_path},
};

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)<img\s+src="([^"]*)""#).unwrap_or_else(|e| {
    log::error!("Failed to compile IMG_SRC regex: {e}");
    never_matching_regex()
  })
});

static WEB_URL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/]*/?").unwrap_or_else(|e| {
    log::error!("Failed to compile WEB_URL regex: {e}");
    never_matching_regex()
  })
});

// http(s)://host.tld/any/path/name.ext with optional query/fragment; the
// capture is the last path segment.
static REMOTE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)^https?://[^/?#]*\.[^/?#]*/(?:[^?#]*/)?([^/?#]+\.[^/?#]+)(?:[?#].*)?$",
  )
  .unwrap_or_else(|e| {
    log::error!("Failed to compile REMOTE_IMAGE regex: {e}");
    never_matching_regex()
  })
});

/// Record every `<img src>` that names an existing file under `root` and
/// point the attribute at the copy, relative to `page_dir`.
///
/// The file will be copied to the same relative location under `temp`.
/// Sources that look like web URLs, that escape `root` or that do not exist
/// are left alone. Returns the number of rewritten attributes.
pub fn scan_local_dependencies(
  html: &mut String,
  root: &Path,
  temp: &Path,
  page_dir: &Path,
  deps: &Dependencies,
) -> usize {
  rewrite_sources(html, |src| {
    if WEB_URL.is_match(src) {
      return None;
    }

    let url = ParsedUrl::parse(src);
    if !url.is_local() {
      return None;
    }

    let decoded = url.decoded_path();
    let relative = Path::new(local_path(&decoded));
    if relative.as_os_str().is_empty() {
      return None;
    }
    if !is_contained(relative) {
      warn!("Skipping image \"{src}\": path leaves the project root");
      return None;
    }

    let original = root.join(relative);
    if !original.is_file() {
      warn!(
        "Image \"{src}\" not found at {}, it will be missing from the \
         compiled .chm file",
        original.display()
      );
      return None;
    }

    let target = deps.insert_local(original, &temp.join(relative));
    Some(web_path(&relative_path(&target, page_dir)))
  })
}

/// Record every `<img src>` pointing at an `http(s)` file and rewrite the
/// attribute to the local path the file will be downloaded to, relative to
/// `page_dir`. Downloads go to `temp`, named after the last path segment.
///
/// The same URL always maps to the same local file, and never to a file
/// already claimed by another dependency. Returns the number of rewritten
/// attributes.
pub fn scan_remote_dependencies(
  html: &mut String,
  temp: &Path,
  page_dir: &Path,
  deps: &Dependencies,
) -> usize {
  rewrite_sources(html, |link| {
    let file_name = remote_file_name(link)?;
    let target = deps.insert_remote(link, &file_name, temp);
    Some(web_path(&relative_path(&target, page_dir)))
  })
}

/// Replace every `<img src>` value for which `replace` returns something.
///
/// The scan resumes right after each replacement, so replaced text is never
/// scanned again whatever its length.
fn rewrite_sources(
  html: &mut String,
  mut replace: impl FnMut(&str) -> Option<String>,
) -> usize {
  let mut rewritten = 0;
  let mut cursor = 0;

  while cursor < html.len() {
    let (src, range, next) = {
      let Some(caps) = IMG_SRC.captures_at(html, cursor) else {
        break;
      };
      let (Some(whole), Some(src)) = (caps.get(0), caps.get(1)) else {
        break;
      };
      (src.as_str().to_string(), src.range(), whole.end())
    };

    let Some(replacement) = replace(&src) else {
      cursor = next;
      continue;
    };
    debug!("Image \"{src}\" -> \"{replacement}\"");

    let start = range.start;
    html.replace_range(range, &replacement);
    cursor = start + replacement.len();
    rewritten += 1;
  }

  rewritten
}

/// Local file name for a remote image, or `None` if the URL does not look
/// like a downloadable file.
fn remote_file_name(link: &str) -> Option<String> {
  let caps = REMOTE_IMAGE.captures(link)?;
  let name: String = percent_decode(&caps[1])
    .chars()
    .map(|c| {
      if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        || c.is_control()
      {
        '_'
      } else {
        c
      }
    })
    .collect();
  (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::{fs, path::PathBuf};

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn test_remote_dedup_rewrites_both() {
    let deps = Dependencies::default();
    let temp = Path::new("/w/temp");
    let mut html = String::from(
      r#"<p><img src="https://example.com/img/logo.png" alt="a"></p><p><img src="https://example.com/img/logo.png"></p>"#,
    );

    let count = scan_remote_dependencies(&mut html, temp, temp, &deps);

    assert_eq!(count, 2);
    assert_eq!(
      html,
      r#"<p><img src="logo.png" alt="a"></p><p><img src="logo.png"></p>"#
    );
    let lists = deps.into_lists();
    assert_eq!(lists.remote.len(), 1);
    assert_eq!(lists.remote[0].link, "https://example.com/img/logo.png");
    assert_eq!(lists.remote[0].target, PathBuf::from("/w/temp/logo.png"));
  }

  #[test]
  fn test_remote_rewrite_with_longer_replacement() {
    let deps = Dependencies::default();
    let temp = Path::new("/w/temp");
    let mut html = String::from(
      r#"<img src="http://a.io/x.png"><img src="http://b.io/x.png"><img src="local.png">"#,
    );

    scan_remote_dependencies(&mut html, temp, Path::new("/w/temp/guides"), &deps);

    assert_eq!(
      html,
      r#"<img src="../x.png"><img src="../x-1.png"><img src="local.png">"#
    );
  }

  #[test]
  fn test_remote_skips_non_files() {
    let deps = Dependencies::default();
    let original = r#"<img src="https://example.com/badge"><img src="https://localhost/a.png">"#;
    let mut html = original.to_string();

    let count = scan_remote_dependencies(&mut html, Path::new("/t"), Path::new("/t"), &deps);

    assert_eq!(count, 0);
    assert_eq!(html, original);
    assert!(deps.into_lists().remote.is_empty());
  }

  #[test]
  fn test_remote_file_name() {
    assert_eq!(
      remote_file_name("https://example.com/a/b/My%20Shot.png?raw=true"),
      Some("My Shot.png".to_string())
    );
    assert_eq!(remote_file_name("https://example.com/"), None);
    assert_eq!(remote_file_name("ftp://example.com/a.png"), None);
  }

  #[test]
  fn test_local_scan() {
    let dir = tempdir().expect("Failed to create temp dir in test");
    let root = dir.path();
    fs::create_dir_all(root.join("images")).expect("Failed to create images dir");
    fs::write(root.join("images/a.png"), b"png").expect("Failed to write image");

    let temp = root.join("temp");
    let deps = Dependencies::default();
    let mut html = String::from(
      r#"<img src="images/a.png"><img src="/images/a.png"><img src="images/missing.png"><img src="https://example.com/images/a.png"><img src="../outside.png">"#,
    );

    let rewritten = scan_local_dependencies(&mut html, root, &temp, &temp, &deps);

    assert_eq!(rewritten, 2);
    assert_eq!(
      html,
      r#"<img src="images/a.png"><img src="images/a.png"><img src="images/missing.png"><img src="https://example.com/images/a.png"><img src="../outside.png">"#
    );
    let lists = deps.into_lists();
    assert_eq!(lists.local.len(), 1);
    assert_eq!(lists.local[0].original, root.join("images/a.png"));
    assert_eq!(lists.local[0].target, temp.join("images/a.png"));
  }

  #[test]
  fn test_local_src_relative_to_nested_page() {
    let dir = tempdir().expect("Failed to create temp dir in test");
    let root = dir.path();
    fs::create_dir_all(root.join("images")).expect("Failed to create images dir");
    fs::write(root.join("images/a.png"), b"png").expect("Failed to write image");

    let temp = root.join("temp");
    let deps = Dependencies::default();
    let mut html = String::from(r#"<p><img src="images/a.png" alt="a"></p>"#);

    scan_local_dependencies(&mut html, root, &temp, &temp.join("guides"), &deps);

    assert_eq!(html, r#"<p><img src="../images/a.png" alt="a"></p>"#);
    assert_eq!(deps.into_lists().local[0].target, temp.join("images/a.png"));
  }

  #[test]
  fn test_local_and_remote_images_with_same_name() {
    let dir = tempdir().expect("Failed to create temp dir in test");
    let root = dir.path();
    fs::write(root.join("logo.png"), b"png").expect("Failed to write image");

    let temp = root.join("temp");
    let deps = Dependencies::default();
    let mut html = String::from(
      r#"<img src="logo.png"><img src="https://example.com/img/logo.png">"#,
    );

    scan_local_dependencies(&mut html, root, &temp, &temp, &deps);
    scan_remote_dependencies(&mut html, &temp, &temp, &deps);

    assert_eq!(html, r#"<img src="logo.png"><img src="logo-1.png">"#);
    let lists = deps.into_lists();
    assert_eq!(lists.local[0].target, temp.join("logo.png"));
    assert_eq!(lists.remote[0].target, temp.join("logo-1.png"));
    assert_ne!(lists.local[0].target, lists.remote[0].target);
  }
}
