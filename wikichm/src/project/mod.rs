//! Project model: discovered pages, their conversion targets and the
//! dependencies collected while converting them.
pub mod convert;
pub mod create;
pub mod resolve;

use std::{
  collections::HashSet,
  fmt,
  path::{Path, PathBuf},
  sync::{Mutex, PoisonError},
};

use log::debug;

use crate::toc::TocItem;

/// Stable handle to a page in [`ProjectData::files`].
///
/// The file list is fixed once discovery finishes, so handles stay valid for
/// the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub(crate) usize);

impl FileId {
  #[must_use]
  pub const fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for FileId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// How a source file becomes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
  /// Byte-for-byte copy.
  Copy,
  /// Markdown rendered to an HTML page.
  Markdown,
}

impl ConversionKind {
  /// Classify a file by its extension.
  #[must_use]
  pub fn for_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("md") => Self::Markdown,
      _ => Self::Copy,
    }
  }
}

/// A page or local dependency: where it comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
  pub original: PathBuf,
  pub target:   PathBuf,
  pub kind:     ConversionKind,
}

impl ProjectFile {
  /// A freshly discovered file. The target is planned later.
  #[must_use]
  pub fn new(original: PathBuf) -> Self {
    let kind = ConversionKind::for_path(&original);
    Self {
      original,
      target: PathBuf::new(),
      kind,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
  NotStarted,
  InProgress,
  Finished,
  Failed,
}

/// An image referenced by absolute URL that has to be fetched before
/// compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDependency {
  pub link:   String,
  pub target: PathBuf,
  pub state:  DownloadState,
}

#[derive(Debug, Default)]
pub struct DependencyLists {
  pub local:  Vec<ProjectFile>,
  pub remote: Vec<RemoteDependency>,
}

/// Dependency collections shared by the conversion workers.
///
/// Every insertion checks for an existing entry and appends under one lock,
/// so concurrent scanners never record the same dependency twice.
#[derive(Debug, Default)]
pub struct Dependencies {
  inner: Mutex<DependencyLists>,
}

impl Dependencies {
  /// Record a local file to be copied into the temp tree and return the
  /// path it will be copied to. A file seen before returns its existing
  /// target. If `preferred` already belongs to another dependency a
  /// numbered variant is used instead.
  pub fn insert_local(&self, original: PathBuf, preferred: &Path) -> PathBuf {
    let mut lists = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = lists.local.iter().find(|dep| dep.original == original) {
      return existing.target.clone();
    }

    let target = unique_target(preferred, &lists.targets());
    debug!(
      "New local dependency {} -> {}",
      original.display(),
      target.display()
    );
    lists.local.push(ProjectFile {
      original,
      target: target.clone(),
      kind: ConversionKind::Copy,
    });
    target
  }

  /// Record a remote file and return the local path it will be downloaded
  /// to. A URL seen before returns its existing target. A new URL whose file
  /// name is already taken, by a remote or a local dependency, gets a
  /// numbered variant.
  pub fn insert_remote(&self, link: &str, file_name: &str, dir: &Path) -> PathBuf {
    let mut lists = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = lists.remote.iter().find(|dep| dep.link == link) {
      return existing.target.clone();
    }

    let target = unique_target(&dir.join(file_name), &lists.targets());
    debug!("New remote dependency {link} -> {}", target.display());
    lists.remote.push(RemoteDependency {
      link:   link.to_string(),
      target: target.clone(),
      state:  DownloadState::NotStarted,
    });
    target
  }

  /// Hand over the collected lists once all workers are done.
  #[must_use]
  pub fn into_lists(self) -> DependencyLists {
    self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
  }
}

impl DependencyLists {
  /// Every target already handed out, local and remote.
  fn targets(&self) -> HashSet<&Path> {
    self
      .local
      .iter()
      .map(|dep| dep.target.as_path())
      .chain(self.remote.iter().map(|dep| dep.target.as_path()))
      .collect()
  }
}

/// `candidate`, or the first `stem-N.ext` next to it that is not taken.
fn unique_target(candidate: &Path, taken: &HashSet<&Path>) -> PathBuf {
  if !taken.contains(candidate) {
    return candidate.to_path_buf();
  }

  let stem = candidate
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let ext = candidate.extension().map(|e| e.to_string_lossy().into_owned());

  let mut counter = 1;
  loop {
    let numbered = match &ext {
      Some(ext) => format!("{stem}-{counter}.{ext}"),
      None => format!("{stem}-{counter}"),
    };
    let numbered = candidate.with_file_name(numbered);
    if !taken.contains(numbered.as_path()) {
      return numbered;
    }
    counter += 1;
  }
}

/// Everything known about the wiki being converted.
#[derive(Debug, Default)]
pub struct ProjectData {
  /// Pages in discovery order. Indexed by [`FileId`].
  pub files:               Vec<ProjectFile>,
  /// The page opened when the help file is opened.
  pub default_file:        Option<FileId>,
  /// Source of `_Sidebar.md`, if the wiki has one.
  pub sidebar:             Option<PathBuf>,
  pub toc:                 TocItem,
  pub local_dependencies:  Vec<ProjectFile>,
  pub remote_dependencies: Vec<RemoteDependency>,
  /// Pages whose conversion failed. They are left out of the manifests.
  pub failed:              HashSet<FileId>,
}

impl ProjectData {
  #[must_use]
  pub fn file(&self, id: FileId) -> &ProjectFile {
    &self.files[id.0]
  }

  #[must_use]
  pub fn get(&self, id: FileId) -> Option<&ProjectFile> {
    self.files.get(id.0)
  }

  /// Handles of all pages in discovery order.
  pub fn file_ids(&self) -> impl Iterator<Item = FileId> {
    (0..self.files.len()).map(FileId)
  }

  /// Pages that were converted successfully.
  pub fn converted_files(&self) -> impl Iterator<Item = &ProjectFile> {
    self
      .files
      .iter()
      .enumerate()
      .filter(|(index, _)| !self.failed.contains(&FileId(*index)))
      .map(|(_, file)| file)
  }

  pub fn finished_downloads(&self) -> impl Iterator<Item = &RemoteDependency> {
    self
      .remote_dependencies
      .iter()
      .filter(|dep| dep.state == DownloadState::Finished)
  }
}
