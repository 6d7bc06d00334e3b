//! Converting every page into the temp tree.
use std::{fs, path::Path};

use color_eyre::eyre::{Context, Result};
use log::{error, info, warn};
use rayon::prelude::*;
use wikichm_markdown::MarkdownProcessor;

use super::{
  ConversionKind,
  Dependencies,
  FileId,
  ProjectData,
  ProjectFile,
  resolve::Resolver,
};
use crate::{
  config::{Config, TocSource},
  html::{
    headings::inject_heading_ids,
    images::{scan_local_dependencies, scan_remote_dependencies},
    links::{mark_external_links, rewrite_links},
    wrap_page,
  },
  toc::{self, TocItem, page_title, sidebar::toc_from_sidebar},
};

/// Shared, read-only state of one conversion run.
struct PageContext<'a> {
  root:      &'a Path,
  temp:      &'a Path,
  processor: &'a MarkdownProcessor,
  resolver:  &'a Resolver,
  deps:      &'a Dependencies,
  /// `Some(section_links)` when every page contributes a TOC entry.
  toc_pages: Option<bool>,
}

/// Convert every page of `data` into the temp tree, build the table of
/// contents and copy local dependencies.
///
/// A page that fails to convert is logged and recorded in
/// [`ProjectData::failed`]; the run carries on without it.
///
/// # Errors
///
/// Returns an error if the temp directory or the worker pool cannot be
/// created.
pub fn convert_project_files(
  config: &Config,
  data: &mut ProjectData,
  processor: &MarkdownProcessor,
) -> Result<()> {
  let temp = config.temp_dir.as_path();
  fs::create_dir_all(temp).wrap_err_with(|| {
    format!("Failed to create temp directory: {}", temp.display())
  })?;

  let resolver = Resolver::new(&config.root, &data.files);
  let sidebar_toc = sidebar_toc(config, data, processor, &resolver);

  let deps = Dependencies::default();
  let ctx = PageContext {
    root: &config.root,
    temp,
    processor,
    resolver: &resolver,
    deps: &deps,
    toc_pages: sidebar_toc
      .is_none()
      .then_some(config.toc.section_links),
  };

  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(config.thread_count())
    .build()
    .wrap_err("Failed to create conversion thread pool")?;

  let results: Vec<(FileId, Result<Option<TocItem>>)> = pool.install(|| {
    data
      .files
      .par_iter()
      .enumerate()
      .map(|(index, file)| {
        let id = FileId(index);
        (id, convert_file(&ctx, id, file))
      })
      .collect()
  });

  let mut entries = Vec::with_capacity(results.len());
  for (id, result) in results {
    match result {
      Ok(entry) => entries.extend(entry),
      Err(e) => {
        error!(
          "Failed to convert {}: {e:#}",
          data.file(id).original.display()
        );
        data.failed.insert(id);
      },
    }
  }

  data.toc = sidebar_toc.unwrap_or_else(|| {
    toc::assemble(
      entries,
      data.default_file,
      config.toc.root_item_name.as_deref(),
    )
  });

  let lists = deps.into_lists();
  data.local_dependencies =
    pool.install(|| copy_local_dependencies(lists.local));
  data.remote_dependencies = lists.remote;

  info!(
    "Converted {} of {} pages, {} local and {} remote dependencies",
    data.files.len() - data.failed.len(),
    data.files.len(),
    data.local_dependencies.len(),
    data.remote_dependencies.len()
  );
  Ok(())
}

/// Table of contents from `_Sidebar.md`, if it should and can be used.
fn sidebar_toc(
  config: &Config,
  data: &ProjectData,
  processor: &MarkdownProcessor,
  resolver: &Resolver,
) -> Option<TocItem> {
  let sidebar = data.sidebar.as_deref()?;
  if config.toc.source == TocSource::Headings {
    info!(
      "Ignoring {}, generating the table of contents from pages",
      sidebar.display()
    );
    return None;
  }

  match toc_from_sidebar(sidebar, processor, resolver) {
    Ok(toc) => {
      info!("Table of contents taken from {}", sidebar.display());
      if config.toc.root_item_name.is_some() {
        warn!("toc root item is ignored when the sidebar defines the table of contents");
      }
      Some(toc)
    },
    Err(e) => {
      warn!(
        "Failed to read sidebar {}: {e}, generating the table of contents \
         from pages",
        sidebar.display()
      );
      None
    },
  }
}

fn convert_file(
  ctx: &PageContext<'_>,
  id: FileId,
  file: &ProjectFile,
) -> Result<Option<TocItem>> {
  let page_dir = file.target.parent().unwrap_or(ctx.temp);
  fs::create_dir_all(page_dir).wrap_err_with(|| {
    format!("Failed to create directory: {}", page_dir.display())
  })?;

  let html = match file.kind {
    ConversionKind::Copy => {
      fs::copy(&file.original, &file.target).wrap_err_with(|| {
        format!(
          "Failed to copy {} to {}",
          file.original.display(),
          file.target.display()
        )
      })?;
      if ctx.toc_pages.is_some() {
        let bytes = fs::read(&file.target).wrap_err_with(|| {
          format!("Failed to read {}", file.target.display())
        })?;
        String::from_utf8_lossy(&bytes).into_owned()
      } else {
        String::new()
      }
    },
    ConversionKind::Markdown => {
      let body = ctx.processor.render_file(&file.original)?;
      let body = process_page_html(ctx, file, body, page_dir);
      let page = wrap_page(&page_title(&file.target), &body);
      fs::write(&file.target, page).wrap_err_with(|| {
        format!("Failed to write {}", file.target.display())
      })?;
      body
    },
  };

  info!("Converted {}", file.original.display());

  let entry = ctx.toc_pages.map(|section_links| {
    toc::page_entry(id, &file.target, &html, section_links)
  });
  Ok(entry)
}

/// Run the HTML passes over a rendered page, in order: local images, remote
/// images, heading ids, page links, external links.
fn process_page_html(
  ctx: &PageContext<'_>,
  file: &ProjectFile,
  mut html: String,
  page_dir: &Path,
) -> String {
  scan_local_dependencies(&mut html, ctx.root, ctx.temp, page_dir, ctx.deps);
  scan_remote_dependencies(&mut html, ctx.temp, page_dir, ctx.deps);
  let html = inject_heading_ids(&html);

  let rewrite = rewrite_links(&html, ctx.resolver, page_dir);
  for href in &rewrite.unresolved {
    warn!(
      "Unknown link \"{href}\" in {}, it will be broken inside the compiled \
       .chm file",
      file.original.display()
    );
  }
  for href in &rewrite.malformed {
    warn!(
      "Failed to parse link \"{href}\" in {}, it is left as written",
      file.original.display()
    );
  }

  mark_external_links(&rewrite.html)
}

/// Copy local dependencies into the temp tree. Files that fail to copy are
/// logged and left out.
fn copy_local_dependencies(deps: Vec<ProjectFile>) -> Vec<ProjectFile> {
  deps
    .into_par_iter()
    .filter(|dep| {
      match copy_file(&dep.original, &dep.target) {
        Ok(()) => true,
        Err(e) => {
          warn!("Failed to copy dependency {}: {e:#}", dep.original.display());
          false
        },
      }
    })
    .collect()
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
  }
  fs::copy(from, to)
    .map(|_| ())
    .wrap_err_with(|| format!("Failed to copy to {}", to.display()))
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use tempfile::tempdir;

  use super::*;

  fn setup(pages: &[(&str, &str)]) -> (tempfile::TempDir, Config) {
    let dir = tempdir().expect("Failed to create temp dir in test");
    let root = dir.path().join("wiki");
    for (rel, content) in pages {
      let path = root.join(rel);
      fs::create_dir_all(path.parent().expect("Page has a parent"))
        .expect("Failed to create dir");
      fs::write(path, content).expect("Failed to write page");
    }
    let config = Config {
      root: root.clone(),
      temp_dir: dir.path().join("temp"),
      jobs: Some(2),
      ..Config::default()
    };
    (dir, config)
  }

  fn convert(config: &Config) -> ProjectData {
    let mut data = ProjectData::from_config(config).expect("Failed to create project");
    convert_project_files(config, &mut data, &MarkdownProcessor::default())
      .expect("Conversion failed");
    data
  }

  #[test]
  fn test_default_page_first_in_toc() {
    let (_dir, config) = setup(&[
      ("A.md", "# A\n"),
      ("Home.md", "# Home\n"),
      ("B.md", "# B\n"),
    ]);
    let data = convert(&config);

    let names: Vec<&str> = data.toc.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Home", "A", "B"]);
  }

  #[test]
  fn test_scanners_run_on_markdown_pages() {
    let (_dir, config) = setup(&[
      ("Home.md", "# Intro\n\n## Usage\n\nSee [guide](Guide) and ![logo](images/logo.png) and ![remote](https://example.com/img/r.png) at [site](https://example.com).\n"),
      ("Guide.md", "# Guide\n"),
      ("images/logo.png", "png"),
    ]);
    let data = convert(&config);
    let temp = &config.temp_dir;

    let home = fs::read_to_string(temp.join("Home.html")).expect("Home.html missing");
    assert!(home.starts_with("<!DOCTYPE html>"));
    assert!(home.contains("<title>Home</title>"));
    assert!(home.contains(r#"<h1 id="intro">Intro</h1>"#));
    assert!(home.contains(r#"<a href="Guide.html">guide</a>"#));
    assert!(home.contains(r#"<img src="r.png""#));
    assert!(home.contains(r#"<a href="https://example.com" target="_blank">site</a>"#));

    assert!(temp.join("images/logo.png").is_file());
    assert_eq!(data.local_dependencies.len(), 1);
    assert_eq!(data.remote_dependencies.len(), 1);
    assert_eq!(data.remote_dependencies[0].target, temp.join("r.png"));

    let home_entry = &data.toc.children[0];
    assert_eq!(home_entry.name, "Home");
    assert_eq!(home_entry.children.len(), 2);
    assert_eq!(home_entry.children[1].fragment.as_deref(), Some("usage"));
  }

  #[test]
  fn test_html_pages_are_copied_verbatim() {
    let original = "<html><body><h1>Old</h1><a href=\"Home\">x</a></body></html>";
    let (_dir, config) = setup(&[("Home.md", "home\n"), ("Old.html", original)]);
    convert(&config);

    let copied = fs::read_to_string(config.temp_dir.join("Old.html")).expect("Old.html missing");
    assert_eq!(copied, original);
  }

  #[test]
  fn test_sidebar_defines_toc() {
    let (_dir, config) = setup(&[
      ("Home.md", "# Home\n\n## One\n\n## Two\n"),
      ("Child.md", "# Child\n"),
      ("_Sidebar.md", "* [Start](Home)\n* Section\n  * [Child](Child)\n"),
    ]);
    let data = convert(&config);

    let names: Vec<&str> = data.toc.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Start", "Section"]);
    assert!(data.toc.children[0].children.is_empty());
    assert_eq!(data.toc.children[1].children[0].name, "Child");
    assert!(!config.temp_dir.join("_Sidebar.html").exists());
  }

  #[test]
  fn test_heading_toc_overrides_sidebar() {
    let (_dir, mut config) = setup(&[
      ("Home.md", "# Home\n"),
      ("_Sidebar.md", "* [Start](Home)\n"),
    ]);
    config.toc.source = TocSource::Headings;
    config.toc.root_item_name = Some("Wiki".to_string());
    let data = convert(&config);

    assert_eq!(data.toc.children.len(), 1);
    let wrapper = &data.toc.children[0];
    assert_eq!(wrapper.name, "Wiki");
    assert_eq!(wrapper.children[0].name, "Home");
  }

  #[test]
  fn test_nested_page_links_are_relative() {
    let (_dir, config) = setup(&[
      ("Home.md", "[intro](guides/Intro)\n"),
      ("guides/Intro.md", "[home](Home)\n"),
    ]);
    let data = convert(&config);

    let intro = fs::read_to_string(config.temp_dir.join("guides/Intro.html"))
      .expect("Intro.html missing");
    assert!(intro.contains(r#"<a href="../Home.html">home</a>"#));
    let home = fs::read_to_string(config.temp_dir.join("Home.html")).expect("Home.html missing");
    assert!(home.contains(r#"<a href="guides/Intro.html">intro</a>"#));

    let targets: Vec<&Path> = data.converted_files().map(|f| f.target.as_path()).collect();
    assert_eq!(targets, [
      config.temp_dir.join("Home.html").as_path(),
      config.temp_dir.join("guides/Intro.html").as_path(),
    ]);
  }
}
