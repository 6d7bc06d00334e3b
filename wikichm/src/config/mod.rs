pub mod download;
pub mod toc;

use std::{
  env,
  fs,
  path::{Component, Path, PathBuf},
};

pub use download::DownloadConfig;
use log::info;
use serde::{Deserialize, Serialize};
pub use toc::{TocConfig, TocSource};

use crate::{cli::Cli, error::ChmError};

/// Name of the configuration file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "wikichm.toml";

fn default_title() -> String {
  "Untitled project".to_string()
}

fn default_root() -> PathBuf {
  PathBuf::from(".")
}

fn default_temp_dir() -> PathBuf {
  PathBuf::from("temp")
}

fn default_out_file() -> PathBuf {
  PathBuf::from("out.chm")
}

const fn default_true() -> bool {
  true
}

/// Configuration options for wikichm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// Title shown by the help viewer
  #[serde(default = "default_title")]
  pub title: String,

  /// Wiki root directory
  #[serde(default = "default_root")]
  pub root: PathBuf,

  /// Page opened when the help file is opened
  #[serde(default)]
  pub default_page: Option<PathBuf>,

  /// Directory receiving converted pages, dependencies and manifests
  #[serde(default = "default_temp_dir")]
  pub temp_dir: PathBuf,

  /// Compiled help file
  #[serde(default = "default_out_file")]
  pub out_file: PathBuf,

  /// Number of threads converting pages
  #[serde(default)]
  pub jobs: Option<usize>,

  /// Whether to run a help compiler after writing the manifests
  #[serde(default = "default_true")]
  pub compile: bool,

  #[serde(default)]
  pub toc: TocConfig,

  #[serde(default)]
  pub download: DownloadConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      title:        default_title(),
      root:         default_root(),
      default_page: None,
      temp_dir:     default_temp_dir(),
      out_file:     default_out_file(),
      jobs:         None,
      compile:      default_true(),
      toc:          TocConfig::default(),
      download:     DownloadConfig::default(),
    }
  }
}

impl Config {
  /// Read a configuration file. TOML and JSON are supported, chosen by
  /// extension.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or has an
  /// unsupported extension.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ChmError> {
    let path = path.as_ref();
    let content =
      fs::read_to_string(path).map_err(|e| ChmError::io(path, e))?;

    let ext = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_ascii_lowercase);

    match ext.as_deref() {
      Some("toml") => Ok(toml::from_str(&content)?),
      Some("json") => Ok(serde_json::from_str(&content)?),
      Some(_) => {
        Err(ChmError::Config(format!(
          "Unsupported config file format: {}",
          path.display()
        )))
      },
      None => {
        Err(ChmError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Build the run configuration: config file (explicit or discovered),
  /// then command line overrides, then validation.
  ///
  /// # Errors
  ///
  /// Returns an error if the config file cannot be loaded or the result is
  /// invalid.
  pub fn load(cli: &Cli) -> Result<Self, ChmError> {
    let cwd = env::current_dir().map_err(|e| ChmError::io(".", e))?;

    let mut config = if let Some(config_path) = &cli.config_file {
      Self::from_file(config_path)?
    } else if let Some(discovered) = Self::find_config_file(&cwd) {
      info!("Using discovered config file: {}", discovered.display());
      Self::from_file(&discovered)?
    } else {
      Self::default()
    };

    config.merge_with_cli(cli);
    config.make_absolute(&cwd);
    config.validate()?;
    Ok(config)
  }

  /// Look for [`CONFIG_FILE_NAME`] in `dir`.
  #[must_use]
  pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
  }

  /// Merge CLI arguments into this config, prioritizing CLI values when
  /// present
  pub fn merge_with_cli(&mut self, cli: &Cli) {
    if let Some(title) = &cli.title {
      self.title.clone_from(title);
    }
    if let Some(root) = &cli.root {
      self.root.clone_from(root);
    }
    if let Some(default_page) = &cli.default_page {
      self.default_page = Some(default_page.clone());
    }
    if let Some(temp_dir) = &cli.temp_dir {
      self.temp_dir.clone_from(temp_dir);
    }
    if let Some(out_file) = &cli.out_file {
      self.out_file.clone_from(out_file);
    }

    self.jobs = cli.jobs.or(self.jobs);

    if let Some(max_downloads) = cli.max_downloads {
      self.download.max_downloads = max_downloads;
    }
    if cli.ignore_ssl {
      self.download.ignore_ssl = true;
    }
    if cli.http_verbose {
      self.download.verbose = true;
    }

    if let Some(toc_root) = &cli.toc_root {
      self.toc.root_item_name = Some(toc_root.clone());
    }
    if cli.toc_headings {
      self.toc.source = TocSource::Headings;
    }
    if cli.no_section_links {
      self.toc.section_links = false;
    }
    if cli.no_compile {
      self.compile = false;
    }
  }

  /// Resolve relative paths against `base`.
  pub fn make_absolute(&mut self, base: &Path) {
    self.root = absolute(base, &self.root);
    self.temp_dir = absolute(base, &self.temp_dir);
    self.out_file = absolute(base, &self.out_file);
    if let Some(default_page) = &self.default_page {
      self.default_page = Some(absolute(base, default_page));
    }
  }

  /// Check values that cannot be expressed in the types.
  ///
  /// # Errors
  ///
  /// Returns [`ChmError::Config`] listing every problem found.
  pub fn validate(&self) -> Result<(), ChmError> {
    let mut errors = Vec::new();

    if self.jobs == Some(0) {
      errors.push("jobs must be a positive number".to_string());
    }
    if self.download.max_downloads == 0 {
      errors.push("max_downloads must be a positive number".to_string());
    }
    if self.title.trim().is_empty() {
      errors.push("title must not be empty".to_string());
    }
    if self.temp_dir == self.root {
      errors.push(format!(
        "Temp directory must differ from the wiki root: {}",
        self.temp_dir.display()
      ));
    }
    if self.toc.root_item_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      errors.push("toc.root_item_name must not be empty".to_string());
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(ChmError::Config(errors.join("\n")))
    }
  }

  /// Worker thread count for page conversion.
  #[must_use]
  pub fn thread_count(&self) -> usize {
    self.jobs.unwrap_or_else(num_cpus::get)
  }
}

/// Join a relative path onto `base` and drop `.` components.
fn absolute(base: &Path, path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  };
  joined
    .components()
    .filter(|component| !matches!(component, Component::CurDir))
    .collect()
}
