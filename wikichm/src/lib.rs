//! Expose wikichm's internal API for use in integration testing. The binary
//! drives the same pipeline through [`build_project`].
pub mod cli;
pub mod compiler;
pub mod config;
pub mod download;
pub mod error;
pub mod html;
pub mod manifest;
pub mod project;
pub mod toc;
pub mod url;
pub mod utils;

use color_eyre::eyre::{Context, Result};
use log::info;
use wikichm_markdown::{MarkdownOptions, MarkdownProcessor};

use crate::{
  config::Config,
  download::download_dependencies,
  manifest::write_project_files,
  project::{ProjectData, convert::convert_project_files},
};

/// Convert the wiki described by `config` into a compiler-ready temp
/// directory: pages, dependencies and project files.
///
/// # Errors
///
/// Returns an error if the project cannot be discovered, the temp directory
/// cannot be written or the downloader cannot be started. Individual pages
/// and downloads that fail are logged and skipped.
pub fn build_project(config: &Config) -> Result<ProjectData> {
  info!("Converting {} into {}", config.root.display(), config.temp_dir.display());

  let mut data = ProjectData::from_config(config).wrap_err_with(|| {
    format!("Failed to create project from {}", config.root.display())
  })?;

  let processor = MarkdownProcessor::new(MarkdownOptions::default());
  convert_project_files(config, &mut data, &processor)?;

  download_dependencies(&config.download, &mut data.remote_dependencies)
    .wrap_err("Failed to download remote dependencies")?;

  write_project_files(config, &data).wrap_err_with(|| {
    format!(
      "Failed to write project files to {}",
      config.temp_dir.display()
    )
  })?;

  Ok(data)
}
