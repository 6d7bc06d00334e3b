//! Table of contents from a wiki's `_Sidebar.md`.
//!
//! The rendered sidebar is read with a tiny tokenizer that only tells tags
//! from text. A state machine then rebuilds the nested `<ul>`/`<li>` bullet
//! structure as a [`TocItem`] tree, linking items through the anchors they
//! contain.
use std::{path::Path, sync::LazyLock};

use log::{debug, trace, warn};
use regex::Regex;
use wikichm_markdown::MarkdownProcessor;

use super::TocItem;
use crate::{
  error::ChmError,
  html::never_matching_regex,
  project::resolve::Resolver,
  url::ParsedUrl,
};

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)^a\s+href="([^"]*)""#).unwrap_or_else(|e| {
    log::error!("Failed to compile ANCHOR regex: {e}");
    never_matching_regex()
  })
});

/// Piece of HTML produced by [`Tokenizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
  /// Text between two tags, verbatim.
  Text(&'a str),
  /// Everything between `<` and `>`, trimmed.
  Tag(&'a str),
}

/// Splits HTML into tags and the text between them.
///
/// A `<` without a closing `>` is treated as text.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
  input: &'a str,
  pos:   usize,
}

impl<'a> Tokenizer<'a> {
  #[must_use]
  pub const fn new(input: &'a str) -> Self {
    Self { input, pos: 0 }
  }
}

impl<'a> Iterator for Tokenizer<'a> {
  type Item = Token<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    let rest = self.input.get(self.pos..)?;
    if rest.is_empty() {
      return None;
    }

    if let Some(after_open) = rest.strip_prefix('<') {
      if let Some(close) = after_open.find('>') {
        self.pos += close + 2;
        return Some(Token::Tag(after_open[..close].trim()));
      }
      self.pos = self.input.len();
      return Some(Token::Text(rest));
    }

    let end = rest.find('<').unwrap_or(rest.len());
    self.pos += end;
    Some(Token::Text(&rest[..end]))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  /// Between items, or after an item's name ended.
  OutsideItem,
  /// Inside `<li>`: text is collected as the item name.
  InsideItemName,
}

/// Rebuilds the sidebar's bullet tree from a token stream.
struct SidebarBuilder<'r> {
  resolver:  &'r Resolver,
  state:     State,
  pending:   TocItem,
  /// Whether `pending` has been attached to the tree already.
  was_added: bool,
  /// Open levels, root first. Items above the root are attached to their
  /// parent when their list closes.
  stack:     Vec<TocItem>,
  /// One entry per open `<ul>`: whether it opened a level on `stack`.
  lists:     Vec<bool>,
}

impl<'r> SidebarBuilder<'r> {
  fn new(resolver: &'r Resolver) -> Self {
    Self {
      resolver,
      state: State::OutsideItem,
      pending: TocItem::default(),
      was_added: false,
      stack: vec![TocItem::default()],
      lists: Vec::new(),
    }
  }

  fn feed(&mut self, token: Token<'_>) {
    match token {
      Token::Text(text) => {
        if self.state == State::InsideItemName {
          self.pending.name.push_str(text);
        }
      },
      Token::Tag("li") => self.open_item(),
      Token::Tag("/li") => self.close_item(),
      Token::Tag("ul") => self.open_list(),
      Token::Tag("/ul") => self.close_list(),
      Token::Tag(tag) => {
        if self.state == State::InsideItemName {
          self.link_anchor(tag);
        }
      },
    }
  }

  fn open_item(&mut self) {
    self.state = State::InsideItemName;
    self.pending = TocItem::default();
    self.was_added = false;
  }

  fn close_item(&mut self) {
    self.state = State::OutsideItem;
    if !self.was_added {
      let item = finish_item(&mut self.pending);
      self.top().children.push(item);
      self.was_added = true;
    }
  }

  fn open_list(&mut self) {
    self.state = State::OutsideItem;
    let nests = !self.was_added && !self.pending.name.is_empty();
    if nests {
      let item = finish_item(&mut self.pending);
      trace!("Sidebar item \"{}\" opens a nested list", item.name);
      self.stack.push(item);
      self.was_added = true;
    }
    self.lists.push(nests);
  }

  fn close_list(&mut self) {
    match self.lists.pop() {
      Some(true) => self.fold_top(),
      Some(false) => {},
      None => debug!("Ignoring unmatched </ul> in sidebar"),
    }
  }

  fn link_anchor(&mut self, tag: &str) {
    let Some(caps) = ANCHOR.captures(tag) else {
      return;
    };
    let href = html_escape::decode_html_entities(&caps[1]).into_owned();
    let url = ParsedUrl::parse(&href);

    match self.resolver.find_parsed(&url) {
      Some(file) => {
        self.pending.file = Some(file);
        self.pending.fragment = url.fragment;
      },
      None if url.is_local() => {
        warn!(
          "Sidebar link \"{href}\" points to no page, its entry will not be \
           linked"
        );
      },
      None => {},
    }
  }

  fn top(&mut self) -> &mut TocItem {
    if self.stack.is_empty() {
      self.stack.push(TocItem::default());
    }
    let last = self.stack.len() - 1;
    &mut self.stack[last]
  }

  /// Attach the innermost open level to its parent.
  fn fold_top(&mut self) {
    if self.stack.len() < 2 {
      return;
    }
    if let Some(item) = self.stack.pop() {
      self.top().children.push(item);
    }
  }

  fn finish(mut self) -> TocItem {
    if !self.was_added && !self.pending.name.trim().is_empty() {
      debug!("Sidebar item \"{}\" was never closed", self.pending.name.trim());
      let item = finish_item(&mut self.pending);
      self.top().children.push(item);
    }
    while self.stack.len() > 1 {
      self.fold_top();
    }
    self.stack.pop().unwrap_or_default()
  }
}

/// Take the pending item, cleaning up its name: `#` characters removed,
/// entities decoded, whitespace trimmed.
fn finish_item(pending: &mut TocItem) -> TocItem {
  let mut item = std::mem::take(pending);
  let name = item.name.replace('#', "");
  item.name = html_escape::decode_html_entities(&name).trim().to_string();
  item
}

/// Build the table of contents from rendered sidebar HTML.
#[must_use]
pub fn toc_from_sidebar_html(html: &str, resolver: &Resolver) -> TocItem {
  let mut builder = SidebarBuilder::new(resolver);
  for token in Tokenizer::new(html) {
    builder.feed(token);
  }
  builder.finish()
}

/// Render `_Sidebar.md` and build the table of contents from it.
///
/// # Errors
///
/// Returns an error if the sidebar cannot be read.
pub fn toc_from_sidebar(
  path: &Path,
  processor: &MarkdownProcessor,
  resolver: &Resolver,
) -> Result<TocItem, ChmError> {
  let html = processor.render_file(path)?;
  let toc = toc_from_sidebar_html(&html, resolver);
  debug!(
    "Sidebar {} produced {} table of contents entries",
    path.display(),
    toc.len()
  );
  Ok(toc)
}
