//! Regex-driven passes over the HTML of a single converted page.
//!
//! None of these is a real HTML parser. They recognise the exact tag shapes
//! the Markdown renderer produces (`<h2>`, `<a href="...">`,
//! `<img src="...">`) and leave everything else untouched.
pub mod headings;
pub mod images;
pub mod links;

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"<[^>]*>").unwrap_or_else(|e| {
    log::error!("Failed to compile TAG regex: {e}");
    never_matching_regex()
  })
});

/// Build a regex that can never match anything.
///
/// Used as the fallback for statically known patterns, so a broken pattern
/// degrades into a no-op pass instead of a panic.
#[must_use]
pub fn never_matching_regex() -> Regex {
  #[allow(
    clippy::expect_used,
    reason = "This pattern is guaranteed to be valid"
  )]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}

/// Remove every tag from an HTML fragment, keeping the text between them.
#[must_use]
pub fn strip_tags(html: &str) -> String {
  TAG.replace_all(html, "").into_owned()
}

/// Visible text of an HTML fragment: tags stripped, entities decoded,
/// surrounding whitespace trimmed.
#[must_use]
pub fn text_content(html: &str) -> String {
  html_escape::decode_html_entities(&strip_tags(html))
    .trim()
    .to_string()
}

/// Wrap a rendered body in the minimal document skeleton the help compiler
/// expects.
#[must_use]
pub fn wrap_page(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
    html_escape::encode_text(title),
    body
  )
}
