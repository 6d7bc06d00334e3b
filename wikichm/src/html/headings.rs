//! Heading anchors: id injection for pages and extraction for the TOC.
use std::{collections::HashSet, sync::LazyLock};

use log::trace;
use regex::Regex;

use super::{never_matching_regex, text_content};

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?is)<(h[1-6])(\s[^>]*)?>(.*?)(</h[1-6]\s*>)").unwrap_or_else(
    |e| {
      log::error!("Failed to compile HEADING regex: {e}");
      never_matching_regex()
    },
  )
});

static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)(?:^|\s)id\s*=\s*"([^"]*)""#).unwrap_or_else(|e| {
    log::error!("Failed to compile ID_ATTR regex: {e}");
    never_matching_regex()
  })
});

/// A heading that carries an anchor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
  pub level: u8,
  pub id:    String,
  pub text:  String,
}

/// Give every `<h1>`..`<h6>` without an `id` attribute one derived from its
/// text. Ids already present in the page are never reused; repeats get a
/// `-1`, `-2`, ... suffix.
///
/// Running this on its own output returns the input unchanged.
#[must_use]
pub fn inject_heading_ids(html: &str) -> String {
  let mut seen: HashSet<String> = HEADING
    .captures_iter(html)
    .filter_map(|caps| {
      let attrs = caps.get(2)?.as_str();
      ID_ATTR.captures(attrs).map(|id| id[1].to_string())
    })
    .collect();

  let mut out = String::with_capacity(html.len() + 64);
  let mut last = 0;

  for caps in HEADING.captures_iter(html) {
    let attrs = caps.get(2).map_or("", |m| m.as_str());
    if ID_ATTR.is_match(attrs) {
      continue;
    }

    let Some(whole) = caps.get(0) else {
      continue;
    };
    let tag = &caps[1];
    let inner = &caps[3];
    let close = &caps[4];

    let id = unique_id(heading_slug(inner), &mut seen);
    trace!("Heading <{tag}> gets id \"{id}\"");

    out.push_str(&html[last..whole.start()]);
    out.push('<');
    out.push_str(tag);
    out.push_str(" id=\"");
    out.push_str(&id);
    out.push('"');
    out.push_str(attrs);
    out.push('>');
    out.push_str(inner);
    out.push_str(close);
    last = whole.end();
  }

  out.push_str(&html[last..]);
  out
}

/// Derive an anchor id from the inner HTML of a heading.
///
/// Letters and digits are lower-cased, whitespace runs become a single `-`,
/// anything else is dropped. Text that leaves nothing behind yields
/// `section`.
#[must_use]
pub fn heading_slug(inner_html: &str) -> String {
  let text = text_content(inner_html);
  let mut slug = String::with_capacity(text.len());
  let mut in_space = false;

  for c in text.chars() {
    if c.is_whitespace() {
      if !in_space {
        slug.push('-');
      }
      in_space = true;
    } else if c.is_alphanumeric() {
      slug.extend(c.to_lowercase());
      in_space = false;
    }
  }

  if slug.is_empty() {
    "section".to_string()
  } else {
    slug
  }
}

fn unique_id(base: String, seen: &mut HashSet<String>) -> String {
  if seen.insert(base.clone()) {
    return base;
  }
  let mut counter = 1;
  loop {
    let candidate = format!("{base}-{counter}");
    if seen.insert(candidate.clone()) {
      return candidate;
    }
    counter += 1;
  }
}

/// Collect headings that already carry an `id`, in document order. Headings
/// whose visible text is empty are skipped.
#[must_use]
pub fn extract_headings(html: &str) -> Vec<Heading> {
  HEADING
    .captures_iter(html)
    .filter_map(|caps| {
      let attrs = caps.get(2)?.as_str();
      let id = ID_ATTR.captures(attrs)?[1].to_string();
      let text = text_content(&caps[3]);
      if id.is_empty() || text.is_empty() {
        return None;
      }
      let level = caps[1][1..].parse().unwrap_or(1);
      Some(Heading { level, id, text })
    })
    .collect()
}
