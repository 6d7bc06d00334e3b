//! Fetching remote images referenced by the converted pages.
use std::{
  io,
  path::{Path, PathBuf},
  time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use reqwest::{Client, redirect::Policy};
use tokio::{fs::File, io::AsyncWriteExt, task::JoinSet};

use crate::{
  config::DownloadConfig,
  error::DownloadError,
  project::{DownloadState, RemoteDependency},
};

const MAX_REDIRECTS: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Download every remote dependency to its target, at most
/// `config.max_downloads` at a time.
///
/// A transfer that fails is logged, its partial file removed and its state
/// set to [`DownloadState::Failed`]. Returns the number of finished
/// transfers.
///
/// # Errors
///
/// Returns an error only if the runtime or the HTTP client cannot be set up.
pub fn download_dependencies(
  config: &DownloadConfig,
  deps: &mut [RemoteDependency],
) -> Result<usize, DownloadError> {
  if deps.is_empty() {
    debug!("No remote dependencies to download");
    return Ok(0);
  }

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .map_err(DownloadError::Runtime)?;
  let client = build_client(config)?;

  let progress = progress_bar(deps.len());
  let downloaded = runtime.block_on(run_downloads(
    &client,
    config.max_downloads.max(1),
    deps,
    &progress,
  ));
  progress.finish_and_clear();

  info!("Downloaded {downloaded}/{} remote dependencies", deps.len());
  Ok(downloaded)
}

fn build_client(config: &DownloadConfig) -> Result<Client, DownloadError> {
  if config.ignore_ssl {
    warn!("TLS certificate verification is disabled for downloads");
  }

  Ok(
    Client::builder()
      .user_agent(concat!("wikichm/", env!("CARGO_PKG_VERSION")))
      .redirect(Policy::limited(MAX_REDIRECTS))
      .connect_timeout(CONNECT_TIMEOUT)
      .danger_accept_invalid_certs(config.ignore_ssl)
      .connection_verbose(config.verbose)
      .build()?,
  )
}

fn progress_bar(len: usize) -> ProgressBar {
  let style = ProgressStyle::with_template(
    "{spinner} Downloading [{bar:30}] {pos}/{len} {wide_msg}",
  )
  .unwrap_or_else(|_| ProgressStyle::default_bar());
  ProgressBar::new(len as u64).with_style(style)
}

/// Keep up to `max_downloads` transfers in flight; when one finishes the
/// next pending one is started.
async fn run_downloads(
  client: &Client,
  max_downloads: usize,
  deps: &mut [RemoteDependency],
  progress: &ProgressBar,
) -> usize {
  let mut join_set = JoinSet::new();
  let mut next = 0;
  let mut downloaded = 0;

  loop {
    while join_set.len() < max_downloads && next < deps.len() {
      let dep = &mut deps[next];
      dep.state = DownloadState::InProgress;

      let index = next;
      let client = client.clone();
      let link = dep.link.clone();
      let target = dep.target.clone();
      join_set.spawn(async move { (index, fetch(&client, &link, &target).await) });
      next += 1;
    }

    let Some(joined) = join_set.join_next().await else {
      break;
    };
    progress.inc(1);

    match joined {
      Ok((index, Ok(()))) => {
        let dep = &mut deps[index];
        debug!("Downloaded {} to {}", dep.link, dep.target.display());
        progress.set_message(dep.link.clone());
        dep.state = DownloadState::Finished;
        downloaded += 1;
      },
      Ok((index, Err(e))) => {
        let dep = &mut deps[index];
        warn!("Failed to download {}: {e}", dep.link);
        dep.state = DownloadState::Failed;
      },
      Err(e) => error!("Download task failed: {e}"),
    }
  }

  // Transfers whose task died never reported back.
  for dep in deps
    .iter_mut()
    .filter(|dep| dep.state == DownloadState::InProgress)
  {
    dep.state = DownloadState::Failed;
  }

  downloaded
}

/// Fetch `url` into `target`, removing whatever was written if it fails.
async fn fetch(client: &Client, url: &str, target: &Path) -> Result<(), DownloadError> {
  let result = write_response(client, url, target).await;
  if result.is_err() {
    match tokio::fs::remove_file(target).await {
      Ok(()) => debug!("Removed partial download {}", target.display()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {},
      Err(e) => {
        warn!(
          "Failed to remove partial download {}: {e}",
          target.display()
        );
      },
    }
  }
  result
}

async fn write_response(
  client: &Client,
  url: &str,
  target: &Path,
) -> Result<(), DownloadError> {
  let mut response = client.get(url).send().await?;
  let status = response.status();
  if !status.is_success() {
    return Err(DownloadError::Status {
      url: url.to_string(),
      status,
    });
  }

  let write_error = |source: io::Error| {
    DownloadError::Io {
      path: PathBuf::from(target),
      source,
    }
  };

  if let Some(parent) = target.parent() {
    tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
  }
  let mut file = File::create(target).await.map_err(write_error)?;
  while let Some(chunk) = response.chunk().await? {
    file.write_all(&chunk).await.map_err(write_error)?;
  }
  file.flush().await.map_err(write_error)?;

  Ok(())
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::{
    fs,
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread,
  };

  use tempfile::tempdir;

  use super::*;

  /// Serve `/ok.png` and answer 404 for everything else.
  fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");

    thread::spawn(move || {
      for stream in listener.incoming() {
        let Ok(mut stream) = stream else { continue };
        let mut reader = BufReader::new(stream.try_clone().expect("Failed to clone stream"));

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("Failed to read request");
        loop {
          let mut header = String::new();
          if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
            break;
          }
        }

        let response = if request_line.starts_with("GET /ok.png ") {
          "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPNG!"
        } else {
          "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        };
        let _ = stream.write_all(response.as_bytes());
      }
    });

    format!("http://{addr}")
  }

  fn dependency(link: String, target: PathBuf) -> RemoteDependency {
    RemoteDependency {
      link,
      target,
      state: DownloadState::NotStarted,
    }
  }

  #[test]
  fn test_no_dependencies() {
    let mut deps = Vec::new();
    let downloaded = download_dependencies(&DownloadConfig::default(), &mut deps)
      .expect("Empty download must succeed");
    assert_eq!(downloaded, 0);
  }

  #[test]
  fn test_downloads_and_failures() {
    let base = serve();
    let dir = tempdir().expect("Failed to create temp dir in test");
    let ok = dir.path().join("ok.png");
    let missing = dir.path().join("missing.png");

    let mut deps = vec![
      dependency(format!("{base}/ok.png"), ok.clone()),
      dependency(format!("{base}/missing.png"), missing.clone()),
    ];
    let config = DownloadConfig {
      max_downloads: 1,
      ..DownloadConfig::default()
    };

    let downloaded =
      download_dependencies(&config, &mut deps).expect("Failed to run downloads");

    assert_eq!(downloaded, 1);
    assert_eq!(deps[0].state, DownloadState::Finished);
    assert_eq!(deps[1].state, DownloadState::Failed);
    assert_eq!(fs::read(&ok).expect("Downloaded file missing"), b"PNG!");
    assert!(!missing.exists());
  }
}
