//! Locating and running an external help compiler.
use std::{
  env,
  ffi::OsString,
  path::{Path, PathBuf},
  process::Command,
};

use log::{debug, info, warn};

use crate::{config::Config, error::ChmError, manifest::PROJECT_FILE_NAME};

/// One command line argument of a compiler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerArg {
  Literal(&'static str),
  /// Replaced by the project file name.
  ProjectFile,
}

/// A help compiler known to understand the generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compiler {
  pub executable: &'static str,
  pub args:       &'static [CompilerArg],
}

impl Compiler {
  /// Arguments with placeholders substituted.
  #[must_use]
  pub fn arguments(&self) -> Vec<OsString> {
    self
      .args
      .iter()
      .map(|arg| {
        match arg {
          CompilerArg::Literal(text) => OsString::from(text),
          CompilerArg::ProjectFile => OsString::from(PROJECT_FILE_NAME),
        }
      })
      .collect()
  }
}

/// Microsoft HTML Help Workshop.
#[cfg(windows)]
const HHC: Compiler = Compiler {
  executable: "hhc",
  args:       &[CompilerArg::ProjectFile],
};

/// Free Pascal's CHM compiler.
const CHMCMD: Compiler = Compiler {
  executable: "chmcmd",
  args:       &[CompilerArg::ProjectFile, CompilerArg::Literal("--no-html-scan")],
};

/// Compilers tried in order of preference.
#[cfg(windows)]
pub const COMPILERS: &[Compiler] = &[HHC, CHMCMD];
#[cfg(not(windows))]
pub const COMPILERS: &[Compiler] = &[CHMCMD];

/// The first known compiler found on `PATH`, with its full path.
#[must_use]
pub fn find_compiler() -> Option<(Compiler, PathBuf)> {
  let path = env::var_os("PATH")?;
  let dirs: Vec<PathBuf> = env::split_paths(&path).collect();

  COMPILERS.iter().find_map(|compiler| {
    let found = find_executable(compiler.executable, &dirs)?;
    debug!("Found {} at {}", compiler.executable, found.display());
    Some((*compiler, found))
  })
}

/// Look for `name` in `dirs`.
#[must_use]
pub fn find_executable(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
  let file_name = if cfg!(windows) {
    format!("{name}.exe")
  } else {
    name.to_string()
  };

  dirs
    .iter()
    .map(|dir| dir.join(&file_name))
    .find(|candidate| candidate.is_file())
}

/// Run the first available compiler on the project in the temp directory.
///
/// Returns whether the compiler reported success. A compiler that runs but
/// exits with a failure code is logged, not treated as an error.
///
/// # Errors
///
/// Returns [`ChmError::Compiler`] if no compiler is installed or it cannot
/// be started.
pub fn compile(config: &Config) -> Result<bool, ChmError> {
  let Some((compiler, executable)) = find_compiler() else {
    let names: Vec<&str> = COMPILERS.iter().map(|c| c.executable).collect();
    return Err(ChmError::Compiler(format!(
      "No help compiler found on PATH, install one of: {}",
      names.join(", ")
    )));
  };

  run(&compiler, &executable, &config.temp_dir)
}

/// Run `compiler` from `executable` inside `temp`.
///
/// # Errors
///
/// Returns [`ChmError::Compiler`] if the process cannot be started.
pub fn run(compiler: &Compiler, executable: &Path, temp: &Path) -> Result<bool, ChmError> {
  info!("Compiling with {}", executable.display());

  let status = Command::new(executable)
    .args(compiler.arguments())
    .current_dir(temp)
    .status()
    .map_err(|e| {
      ChmError::Compiler(format!(
        "Failed to run {}: {e}",
        executable.display()
      ))
    })?;

  match status.code() {
    Some(0) => {
      info!("{} finished with exit code 0", compiler.executable);
      Ok(true)
    },
    Some(code) => {
      warn!("{} finished with exit code {code}", compiler.executable);
      Ok(false)
    },
    None => {
      warn!("{} was terminated by a signal", compiler.executable);
      Ok(false)
    },
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn test_chmcmd_arguments() {
    assert_eq!(CHMCMD.arguments(), [
      OsString::from("proj.hhp"),
      OsString::from("--no-html-scan")
    ]);
  }

  #[test]
  fn test_chmcmd_is_always_a_candidate() {
    assert_eq!(COMPILERS.last(), Some(&CHMCMD));
  }

  #[test]
  fn test_find_executable() {
    let first = tempdir().expect("Failed to create temp dir in test");
    let second = tempdir().expect("Failed to create temp dir in test");
    let name = if cfg!(windows) { "chmcmd.exe" } else { "chmcmd" };
    fs::write(second.path().join(name), "").expect("Failed to write file");

    let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    assert_eq!(
      find_executable("chmcmd", &dirs),
      Some(second.path().join(name))
    );
    assert_eq!(find_executable("hhc", &dirs), None);
  }

  #[cfg(unix)]
  #[test]
  fn test_run_reports_exit_code() {
    let dir = tempdir().expect("Failed to create temp dir in test");
    let succeed = Compiler {
      executable: "true",
      args:       &[],
    };
    let fail = Compiler {
      executable: "false",
      args:       &[],
    };

    assert!(run(&succeed, Path::new("true"), dir.path()).expect("Failed to run true"));
    assert!(!run(&fail, Path::new("false"), dir.path()).expect("Failed to run false"));
  }
}
