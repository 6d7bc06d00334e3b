//! Discovering the pages of a wiki and planning where they go.
use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use log::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::{ConversionKind, FileId, ProjectData, ProjectFile};
use crate::{config::Config, error::ChmError, utils::relative_path};

/// File name of the wiki page that defines a custom table of contents.
pub const SIDEBAR_FILE_NAME: &str = "_Sidebar.md";

/// File name preferred as the default page.
pub const HOME_FILE_NAME: &str = "Home.md";

impl ProjectData {
  /// Discover the pages under `config.root`, plan their targets under
  /// `config.temp_dir` and pick the default page.
  ///
  /// # Errors
  ///
  /// Returns [`ChmError::MissingRoot`] if the root is not a directory and
  /// [`ChmError::EmptyProject`] if it holds no pages.
  pub fn from_config(config: &Config) -> Result<Self, ChmError> {
    let root = &config.root;
    if !root.is_dir() {
      return Err(ChmError::MissingRoot(root.clone()));
    }

    let mut data = Self::default();
    for path in discover(root, &config.temp_dir) {
      if path.file_name().is_some_and(|name| name == SIDEBAR_FILE_NAME) {
        debug!("Using sidebar {}", path.display());
        data.sidebar.get_or_insert(path);
        continue;
      }
      data.files.push(ProjectFile::new(path));
    }

    data.plan_targets(root, &config.temp_dir);

    if data.files.is_empty() {
      return Err(ChmError::EmptyProject(root.clone()));
    }

    data.default_file = data.pick_default_file(config.default_page.as_deref());
    if let Some(id) = data.default_file {
      info!("Default page: {}", data.file(id).original.display());
    }

    info!(
      "Found {} pages in {}",
      data.files.len(),
      root.display()
    );
    Ok(data)
  }

  /// Mirror every page under `temp`, `.md` becoming `.html`. A page whose
  /// target is already taken by an earlier one is dropped.
  fn plan_targets(&mut self, root: &Path, temp: &Path) {
    let mut taken: HashSet<PathBuf> = HashSet::new();

    self.files.retain_mut(|file| {
      file.target = target_for(&file.original, file.kind, root, temp);
      if taken.insert(file.target.clone()) {
        true
      } else {
        warn!(
          "Skipping {}: another page is already converted to {}",
          file.original.display(),
          file.target.display()
        );
        false
      }
    });
  }

  fn pick_default_file(&self, requested: Option<&Path>) -> Option<FileId> {
    if let Some(requested) = requested {
      if let Some(id) = self.find_original(requested) {
        return Some(id);
      }
      warn!(
        "Default page {} is not a page of this wiki, ignoring it",
        requested.display()
      );
    }

    self
      .file_ids()
      .find(|id| {
        self
          .file(*id)
          .original
          .file_name()
          .is_some_and(|name| name == HOME_FILE_NAME)
      })
      .or_else(|| self.file_ids().next())
  }

  fn find_original(&self, path: &Path) -> Option<FileId> {
    self
      .file_ids()
      .find(|id| self.file(*id).original.as_path() == path)
  }
}

/// Page sources under `root`, sorted by file name at every level. Hidden
/// directories and the temp directory are skipped.
fn discover(root: &Path, temp: &Path) -> Vec<PathBuf> {
  WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry, temp))
    .filter_map(|entry| {
      match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
          warn!("Failed to read directory entry: {e}");
          None
        },
      }
    })
    .filter(|entry| entry.file_type().is_file() && is_page(entry.path()))
    .map(DirEntry::into_path)
    .collect()
}

fn is_ignored_dir(entry: &DirEntry, temp: &Path) -> bool {
  if !entry.file_type().is_dir() {
    return false;
  }
  entry.path() == temp
    || entry
      .file_name()
      .to_str()
      .is_some_and(|name| name.starts_with('.'))
}

fn is_page(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("html"))
}

/// Where a page ends up under `temp`.
#[must_use]
pub fn target_for(
  original: &Path,
  kind: ConversionKind,
  root: &Path,
  temp: &Path,
) -> PathBuf {
  let target = temp.join(relative_path(original, root));
  match kind {
    ConversionKind::Markdown => target.with_extension("html"),
    ConversionKind::Copy => target,
  }
}
