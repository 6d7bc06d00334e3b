use std::path::{Component, Path, PathBuf};

/// Join the components of a relative path with `/`, the separator used
/// inside HTML and the CHM manifests regardless of platform.
#[must_use]
pub fn web_path(path: &Path) -> String {
  path
    .components()
    .filter_map(|component| {
      match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        Component::ParentDir => Some("..".to_string()),
        Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
      }
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// Compute `path` relative to `base`, walking up with `..` where needed.
///
/// Both paths are expected to be absolute. If they share no common root
/// (e.g. different drives) `path` is returned unchanged.
#[must_use]
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
  if let Ok(stripped) = path.strip_prefix(base) {
    return stripped.to_path_buf();
  }

  let path_components: Vec<Component<'_>> = path.components().collect();
  let base_components: Vec<Component<'_>> = base.components().collect();

  let common = path_components
    .iter()
    .zip(&base_components)
    .take_while(|(a, b)| a == b)
    .count();

  if common == 0 {
    return path.to_path_buf();
  }

  let mut relative = PathBuf::new();
  for _ in common..base_components.len() {
    relative.push("..");
  }
  for component in &path_components[common..] {
    relative.push(component.as_os_str());
  }
  relative
}

/// Normalise the path of a local link or image source to a path relative
/// to the wiki root: surrounding whitespace, leading separators and leading
/// `./` segments are removed.
#[must_use]
pub fn local_path(path: &str) -> &str {
  let mut path = path.trim().trim_start_matches(['/', '\\']);
  while let Some(rest) = path.strip_prefix("./").or_else(|| path.strip_prefix(".\\")) {
    path = rest.trim_start_matches(['/', '\\']);
  }
  path
}

/// Whether a relative path stays inside the directory it is joined to.
#[must_use]
pub fn is_contained(relative: &Path) -> bool {
  relative
    .components()
    .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
