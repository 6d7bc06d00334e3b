//! Anchor rewriting: wiki links to converted pages, web links to a new
//! window.
use std::{path::Path, sync::LazyLock};

use log::trace;
use regex::Regex;

use super::never_matching_regex;
use crate::{
  project::resolve::Resolver,
  url::ParsedUrl,
  utils::{relative_path, web_path},
};

static LINK_HREF: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)<a\s+href="([^"]*)""#).unwrap_or_else(|e| {
    log::error!("Failed to compile LINK_HREF regex: {e}");
    never_matching_regex()
  })
});

static TARGET_ATTR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\starget\s*=").unwrap_or_else(|e| {
    log::error!("Failed to compile TARGET_ATTR regex: {e}");
    never_matching_regex()
  })
});

/// Result of [`rewrite_links`].
#[derive(Debug, Default)]
pub struct LinkRewrite {
  pub html:       String,
  /// Local hrefs that matched no page, in document order.
  pub unresolved: Vec<String>,
  /// Web hrefs without a usable host, in document order.
  pub malformed:  Vec<String>,
}

/// Point every local `<a href>` that names a project page at that page's
/// converted target, keeping any query and fragment. The new href is
/// relative to `page_dir`, the directory the page being rewritten is written
/// to.
///
/// Hrefs with a host, hrefs without a path and hrefs that match nothing are
/// left byte-for-byte untouched. Unmatched hrefs are reported once each in
/// [`LinkRewrite::unresolved`], web hrefs that cannot be parsed once each in
/// [`LinkRewrite::malformed`].
#[must_use]
pub fn rewrite_links(
  html: &str,
  resolver: &Resolver,
  page_dir: &Path,
) -> LinkRewrite {
  let mut out = String::with_capacity(html.len());
  let mut unresolved: Vec<String> = Vec::new();
  let mut malformed: Vec<String> = Vec::new();
  let mut last = 0;

  for caps in LINK_HREF.captures_iter(html) {
    let Some(href) = caps.get(1) else {
      continue;
    };

    let url = ParsedUrl::parse(href.as_str());
    if url.is_malformed() {
      push_once(&mut malformed, href.as_str());
      continue;
    }
    if !url.is_local() || url.path().is_empty() {
      continue;
    }

    let Some(target) = resolver
      .find_parsed(&url)
      .and_then(|id| resolver.target(id))
    else {
      push_once(&mut unresolved, href.as_str());
      continue;
    };

    let rewritten = ParsedUrl {
      resource_path: Some(web_path(&relative_path(target, page_dir))),
      query: url.query,
      fragment: url.fragment,
      ..ParsedUrl::default()
    }
    .to_string();
    trace!("Link \"{}\" -> \"{rewritten}\"", href.as_str());

    out.push_str(&html[last..href.start()]);
    out.push_str(&rewritten);
    last = href.end();
  }

  out.push_str(&html[last..]);
  LinkRewrite {
    html: out,
    unresolved,
    malformed,
  }
}

fn push_once(list: &mut Vec<String>, href: &str) {
  if !list.iter().any(|seen| seen == href) {
    list.push(href.to_string());
  }
}

/// Add `target="_blank"` to anchors pointing at another host, so the help
/// viewer opens them in a browser. Malformed web links are left alone.
#[must_use]
pub fn mark_external_links(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut last = 0;

  for caps in LINK_HREF.captures_iter(html) {
    let Some(whole) = caps.get(0) else {
      continue;
    };

    let url = ParsedUrl::parse(&caps[1]);
    let host = url.host();
    if host.is_empty() || host == "." || url.is_malformed() {
      continue;
    }

    let tag_rest = html[whole.end()..]
      .split_once('>')
      .map_or("", |(rest, _)| rest);
    if TARGET_ATTR.is_match(tag_rest) {
      continue;
    }

    out.push_str(&html[last..whole.end()]);
    out.push_str(" target=\"_blank\"");
    last = whole.end();
  }

  out.push_str(&html[last..]);
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::ProjectFile;

  fn resolver() -> Resolver {
    let files: Vec<ProjectFile> = ["Home.md", "Getting-Started.md", "docs/Legacy.html"]
      .iter()
      .map(|rel| {
        let mut file = ProjectFile::new(Path::new("/wiki").join(rel));
        file.target = Path::new("/wiki/temp").join(rel).with_extension("html");
        file
      })
      .collect();
    Resolver::new(Path::new("/wiki"), &files)
  }

  #[test]
  fn test_rewrites_to_target() {
    let html = r#"<p><a href="Home.md">back</a> <a href="Getting-Started">go</a></p>"#;
    let result = rewrite_links(html, &resolver(), Path::new("/wiki/temp"));
    assert_eq!(
      result.html,
      r#"<p><a href="Home.html">back</a> <a href="Getting-Started.html">go</a></p>"#
    );
    assert!(result.unresolved.is_empty());
  }

  #[test]
  fn test_keeps_fragment_and_query() {
    let html = r#"<a href="getting started#install">x</a><a href="docs/Legacy.html?v=2">y</a>"#;
    let result = rewrite_links(html, &resolver(), Path::new("/wiki/temp"));
    assert_eq!(
      result.html,
      r#"<a href="Getting-Started.html#install">x</a><a href="docs/Legacy.html?v=2">y</a>"#
    );
  }

  #[test]
  fn test_leaves_remote_and_fragment_only_links() {
    let html = r##"<a href="https://github.com/Home">gh</a><a href="#top">top</a><a href="mailto:a@b.c">m</a>"##;
    let result = rewrite_links(html, &resolver(), Path::new("/wiki/temp"));
    assert_eq!(result.html, html);
    assert!(result.unresolved.is_empty());
  }

  #[test]
  fn test_unresolved_link_is_untouched_and_reported_once() {
    let html = r#"<a href="No Such Page">a</a> and again <a href="No Such Page">b</a>"#;
    let result = rewrite_links(html, &resolver(), Path::new("/wiki/temp"));
    assert_eq!(result.html, html);
    assert_eq!(result.unresolved, vec!["No Such Page".to_string()]);
  }

  #[test]
  fn test_malformed_links_are_untouched_and_reported_once() {
    let html = r#"<a href="http://">a</a><a href="https:///nohost">b</a><a href="http://">c</a>"#;
    let result = rewrite_links(html, &resolver(), Path::new("/wiki/temp"));
    assert_eq!(result.html, html);
    assert!(result.unresolved.is_empty());
    assert_eq!(result.malformed, ["http://", "https:///nohost"]);
    assert_eq!(mark_external_links(html), html);
  }

  #[test]
  fn test_relative_to_page_directory() {
    let html = r#"<a href="Home">up</a><a href="docs/Legacy.html">same</a>"#;
    let result = rewrite_links(html, &resolver(), Path::new("/wiki/temp/docs"));
    assert_eq!(
      result.html,
      r#"<a href="../Home.html">up</a><a href="Legacy.html">same</a>"#
    );
  }

  #[test]
  fn test_marks_external_links() {
    let html = r#"<a href="https://example.com/x">web</a><a href="Home.html">home</a>"#;
    assert_eq!(
      mark_external_links(html),
      r#"<a href="https://example.com/x" target="_blank">web</a><a href="Home.html">home</a>"#
    );
  }

  #[test]
  fn test_external_marking_skips_dot_host_and_existing_target() {
    let html = r#"<a href="file://./Home.md">a</a><a href="http://x.org/" target="_self">b</a>"#;
    assert_eq!(mark_external_links(html), html);
  }

  #[test]
  fn test_marking_is_idempotent() {
    let once = mark_external_links(r#"<a href="http://x.org/a">x</a>"#);
    assert_eq!(mark_external_links(&once), once);
  }
}
