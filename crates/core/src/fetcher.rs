//! Ensures a raw source video exists on disk, downloading it at most once.
//!
//! Fetch failures never propagate: third-party hosted videos disappear or get
//! region-locked, and the batch must keep going. Each failure is written to
//! the run log and the status store instead.

use crate::naming;
use crate::runlog::RunLog;
use anyhow::{anyhow, Context};
use sqlx::SqlitePool;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::FetchState;
use tools::Downloader;
use tracing::{debug, info, warn};

const PARTIAL_DIR: &str = ".partial";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded,
    Failed(String),
}

impl FetchOutcome {
    pub fn is_available(&self) -> bool {
        !matches!(self, FetchOutcome::Failed(_))
    }

    fn state(&self) -> FetchState {
        match self {
            FetchOutcome::AlreadyPresent => FetchState::Present,
            FetchOutcome::Downloaded => FetchState::Downloaded,
            FetchOutcome::Failed(_) => FetchState::Failed,
        }
    }
}

pub struct VideoFetcher {
    raw_dir: PathBuf,
    downloader: Arc<dyn Downloader>,
    pool: SqlitePool,
    log: Arc<RunLog>,
}

impl VideoFetcher {
    pub fn new(
        raw_dir: &Path,
        downloader: Arc<dyn Downloader>,
        pool: SqlitePool,
        log: Arc<RunLog>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(raw_dir)
            .with_context(|| format!("create raw video dir {}", raw_dir.display()))?;
        Ok(Self {
            raw_dir: raw_dir.to_path_buf(),
            downloader,
            pool,
            log,
        })
    }

    pub fn raw_path(&self, raw_name: &str) -> PathBuf {
        self.raw_dir.join(raw_name)
    }

    pub async fn fetch(&self, raw_name: &str, url: &str) -> FetchOutcome {
        let target = self.raw_path(raw_name);
        let result = if !naming::is_plain_file_name(raw_name) {
            Err(anyhow!("url {url} does not yield a plain raw video file name"))
        } else if target.exists() {
            debug!(raw_name, "raw video already present");
            Ok(FetchOutcome::AlreadyPresent)
        } else {
            self.download(url, &target).await
        };
        let outcome = result.unwrap_or_else(|e| {
            let message = format!("Error downloading video {raw_name}: {e:#}");
            warn!("{message}");
            if let Err(log_err) = self.log.append(&message) {
                warn!(error = %log_err, "failed to write run log");
            }
            FetchOutcome::Failed(format!("{e:#}"))
        });

        let error = match &outcome {
            FetchOutcome::Failed(e) => Some(e.as_str()),
            _ => None,
        };
        if let Err(e) =
            storage::record_fetch(&self.pool, raw_name, url, outcome.state(), error).await
        {
            warn!(raw_name, error = %e, "failed to record fetch status");
        }
        outcome
    }

    /// Downloads beside the target, then publishes with create-if-absent so a
    /// raw file that already exists is never replaced.
    async fn download(&self, url: &str, target: &Path) -> anyhow::Result<FetchOutcome> {
        let partial_dir = self.raw_dir.join(PARTIAL_DIR);
        tokio::fs::create_dir_all(&partial_dir).await?;
        let file_name = target
            .file_name()
            .context("raw video path has no file name")?;
        let partial = partial_dir.join(file_name);
        let _ = tokio::fs::remove_file(&partial).await;

        let downloaded = self.downloader.download(url, &partial).await;
        if let Err(e) = downloaded {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        let published = publish(&partial, target, |from, to| std::fs::hard_link(from, to))
            .with_context(|| format!("publish {}", target.display()));
        let _ = tokio::fs::remove_file(&partial).await;
        if matches!(published, Ok(FetchOutcome::Downloaded)) {
            info!(path = %target.display(), "raw video downloaded");
        }
        published
    }
}

/// Moves a finished download into place without replacing an existing file.
///
/// `link` is the create-if-absent primitive. Filesystems without hard links
/// (FAT, exFAT, some network mounts) fall back to a rename after re-checking
/// the target; a raw name only ever has one fetch in flight.
fn publish(
    partial: &Path,
    target: &Path,
    link: impl Fn(&Path, &Path) -> std::io::Result<()>,
) -> std::io::Result<FetchOutcome> {
    match link(partial, target) {
        Ok(()) => Ok(FetchOutcome::Downloaded),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %target.display(), "raw video appeared during download, keeping it");
            Ok(FetchOutcome::AlreadyPresent)
        }
        Err(e) if matches!(e.kind(), ErrorKind::Unsupported | ErrorKind::PermissionDenied) => {
            debug!(error = %e, "hard link unavailable, renaming instead");
            if target.exists() {
                return Ok(FetchOutcome::AlreadyPresent);
            }
            std::fs::rename(partial, target)?;
            Ok(FetchOutcome::Downloaded)
        }
        Err(e) => Err(e),
    }
}
