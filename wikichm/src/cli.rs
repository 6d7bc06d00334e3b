use std::path::PathBuf;

use clap::Parser;

/// Command line interface for wikichm
#[derive(Parser, Debug, Default)]
#[command(
  author,
  version,
  about = "Convert a GitHub wiki into a compiled HTML help (.chm) file"
)]
pub struct Cli {
  /// Project name. Shown as the title of the compiled help file.
  #[arg(short = 'n', long = "name")]
  pub title: Option<String>,

  /// Wiki root directory (default: ".")
  #[arg(short, long)]
  pub root: Option<PathBuf>,

  /// Page opened when the help file is opened
  #[arg(short, long = "default-page")]
  pub default_page: Option<PathBuf>,

  /// Directory for converted pages and manifests (default: "./temp")
  #[arg(short, long = "temp-dir")]
  pub temp_dir: Option<PathBuf>,

  /// Output .chm file path (default: "./out.chm")
  #[arg(short, long = "out-file")]
  pub out_file: Option<PathBuf>,

  /// Number of parallel conversion jobs (default: number of CPU threads)
  #[arg(short, long, value_parser = clap::value_parser!(usize))]
  pub jobs: Option<usize>,

  /// Number of parallel image downloads (default: 8)
  #[arg(long = "max-downloads", value_parser = clap::value_parser!(usize))]
  pub max_downloads: Option<usize>,

  /// Do not verify TLS certificates when downloading images
  #[arg(long = "ignore-ssl")]
  pub ignore_ssl: bool,

  /// Log HTTP connection details while downloading
  #[arg(long = "http-verbose")]
  pub http_verbose: bool,

  /// Put every page under a single table of contents entry with this name.
  /// Ignored when the table of contents comes from `_Sidebar.md`.
  #[arg(long = "toc-root", value_name = "NAME")]
  pub toc_root: Option<String>,

  /// Build the table of contents from page headings even if the wiki has a
  /// `_Sidebar.md`
  #[arg(long = "toc-headings")]
  pub toc_headings: bool,

  /// Do not list page sections in the table of contents
  #[arg(long = "no-section-links")]
  pub no_section_links: bool,

  /// Stop after writing the project files, without running a compiler
  #[arg(long = "no-compile")]
  pub no_compile: bool,

  /// Path to a configuration file (TOML or JSON)
  #[arg(short = 'c', long = "config-file")]
  pub config_file: Option<PathBuf>,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
