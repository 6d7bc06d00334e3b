//! Project files read by the help compiler: the `.hhp` project, the `.hhc`
//! contents tree, plus a `.gitignore` for the temp directory.
//!
//! Format reference: <https://www.nongnu.org/chmspec/latest/INI.html>
use std::{
  fmt::{self, Write},
  fs,
  path::{Path, PathBuf},
};

use html_escape::encode_double_quoted_attribute;
use log::info;

use crate::{
  config::Config,
  error::ChmError,
  project::{ProjectData, ProjectFile},
  toc::TocItem,
  utils::{relative_path, web_path},
};

pub const PROJECT_FILE_NAME: &str = "proj.hhp";
pub const CONTENTS_FILE_NAME: &str = "proj.hhc";

/// Navigation pane style bits of a `[WINDOWS]` entry.
pub mod window_style {
  pub const TRI_PANE: u32 = 0x0000_0020;
  pub const SYNC_SIDEBAR_WITH_TOPIC: u32 = 0x0000_0100;
  pub const SEARCH_TAB: u32 = 0x0000_0400;
  pub const HTML_TITLE_IN_TITLEBAR: u32 = 0x0000_2000;
  pub const RESIZABLE: u32 = 0x0004_0000;
  pub const MARGIN: u32 = 0x1000_0000;

  pub const DEFAULT: u32 = TRI_PANE
    | SYNC_SIDEBAR_WITH_TOPIC
    | SEARCH_TAB
    | HTML_TITLE_IN_TITLEBAR
    | RESIZABLE
    | MARGIN;
}

/// Toolbar button bits of a `[WINDOWS]` entry.
pub mod toolbar_buttons {
  pub const HIDE_SHOW: u32 = 0x0000_0002;
  pub const BACK: u32 = 0x0000_0004;
  pub const FORWARD: u32 = 0x0000_0008;
  pub const HOME: u32 = 0x0000_0040;
  pub const LOCATE: u32 = 0x0000_0800;
  pub const OPTIONS: u32 = 0x0000_1000;
  pub const PRINT: u32 = 0x0000_2000;

  pub const DEFAULT: u32 =
    HIDE_SHOW | LOCATE | BACK | FORWARD | HOME | PRINT | OPTIONS;
}

/// Window style of the help window itself (`WS_*` flags).
const WINDOW_STYLE: u32 = 0x000B_0000;

/// Write `.gitignore`, the project file and the contents file into the temp
/// directory.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_project_files(
  config: &Config,
  data: &ProjectData,
) -> Result<PathBuf, ChmError> {
  let temp = &config.temp_dir;
  write(&temp.join(".gitignore"), "*")?;

  let project_file = temp.join(PROJECT_FILE_NAME);
  write(&project_file, &render_project(config, data)?)?;
  write(
    &temp.join(CONTENTS_FILE_NAME),
    &render_contents(&data.toc, data, temp)?,
  )?;

  info!("Project files written to {}", temp.display());
  Ok(project_file)
}

fn write(path: &Path, content: &str) -> Result<(), ChmError> {
  fs::write(path, content).map_err(|e| ChmError::io(path, e))
}

/// Page opened first: the default page if it converted, the first converted
/// page otherwise.
fn default_topic(data: &ProjectData) -> Option<&ProjectFile> {
  data
    .default_file
    .filter(|id| !data.failed.contains(id))
    .and_then(|id| data.get(id))
    .or_else(|| data.converted_files().next())
}

/// Render the `.hhp` project file.
///
/// # Errors
///
/// Only fails if formatting fails.
pub fn render_project(
  config: &Config,
  data: &ProjectData,
) -> Result<String, fmt::Error> {
  let temp = &config.temp_dir;
  let native = |path: &Path| relative_path(path, temp).display().to_string();
  let default_topic = default_topic(data)
    .map(|file| native(&file.target))
    .unwrap_or_default();

  let mut out = String::new();

  writeln!(out, "[OPTIONS]")?;
  writeln!(out, "Auto Index=Yes")?;
  writeln!(out, "Binary Index=Yes")?;
  writeln!(out, "Binary TOC=Yes")?;
  writeln!(out, "Compatibility=1.1 or later")?;
  writeln!(out, "Compiled file={}", native(&config.out_file))?;
  writeln!(out, "Contents file={CONTENTS_FILE_NAME}")?;
  writeln!(out, "Default Window=main")?;
  writeln!(out, "Default topic={default_topic}")?;
  writeln!(out, "Flat=No")?;
  writeln!(out, "Full-text search=Yes")?;
  writeln!(out, "Title={}", config.title)?;
  writeln!(out)?;

  // Fields: title, contents, index, default, home, jump1 file and text,
  // jump2 file and text, pane style, pane width, buttons, position, window
  // style, extended style, show state, pane closed, default tab, tabs on
  // top, unused.
  writeln!(out, "[WINDOWS]")?;
  writeln!(
    out,
    "main=\"{title}\",\"{CONTENTS_FILE_NAME}\",,\"{default_topic}\",\"{default_topic}\",,,,,0x{style:X},,0x{buttons:X},[,,,],0x{WINDOW_STYLE:X},,,,,,0",
    title = config.title,
    style = window_style::DEFAULT,
    buttons = toolbar_buttons::DEFAULT,
  )?;
  writeln!(out)?;

  writeln!(out, "[FILES]")?;
  for file in data.converted_files() {
    writeln!(out, "{}", native(&file.target))?;
  }
  for dep in &data.local_dependencies {
    writeln!(out, "{}", native(&dep.target))?;
  }
  for dep in data.finished_downloads() {
    writeln!(out, "{}", native(&dep.target))?;
  }

  Ok(out)
}

/// Render the `.hhc` sitemap mirroring the table of contents.
///
/// # Errors
///
/// Only fails if formatting fails.
pub fn render_contents(
  toc: &TocItem,
  data: &ProjectData,
  temp: &Path,
) -> Result<String, fmt::Error> {
  let mut out = String::new();

  writeln!(out, "<!DOCTYPE HTML PUBLIC \"-//IETF//DTD HTML//EN\">")?;
  writeln!(out, "<HTML>")?;
  writeln!(out, "<HEAD>")?;
  writeln!(
    out,
    "<meta name=\"GENERATOR\" content=\"wikichm {}\">",
    env!("CARGO_PKG_VERSION")
  )?;
  writeln!(out, "<!-- Sitemap 1.0 -->")?;
  writeln!(out, "</HEAD>")?;
  writeln!(out, "<BODY>")?;
  writeln!(out, "<OBJECT type=\"text/site properties\">")?;
  writeln!(out, "</OBJECT>")?;
  writeln!(out, "<UL>")?;
  for item in &toc.children {
    write_contents_entry(&mut out, item, data, temp)?;
  }
  writeln!(out, "</UL>")?;
  writeln!(out, "</BODY>")?;
  writeln!(out, "</HTML>")?;

  Ok(out)
}

fn write_contents_entry(
  out: &mut String,
  item: &TocItem,
  data: &ProjectData,
  temp: &Path,
) -> fmt::Result {
  writeln!(out, "<LI> <OBJECT type=\"text/sitemap\">")?;
  writeln!(
    out,
    "<param name=\"Name\" value=\"{}\">",
    encode_double_quoted_attribute(&item.name)
  )?;

  let linked = item
    .file
    .filter(|id| !data.failed.contains(id))
    .and_then(|id| data.get(id));
  if let Some(file) = linked {
    let mut local = web_path(&relative_path(&file.target, temp));
    if let Some(fragment) = &item.fragment {
      local.push('#');
      local.push_str(fragment);
    }
    writeln!(
      out,
      "<param name=\"Local\" value=\"{}\">",
      encode_double_quoted_attribute(&local)
    )?;
  }
  writeln!(out, "</OBJECT>")?;

  if !item.children.is_empty() {
    writeln!(out, "<UL>")?;
    for child in &item.children {
      write_contents_entry(out, child, data, temp)?;
    }
    writeln!(out, "</UL>")?;
  }

  Ok(())
}
