//! Fakes for the external tools and a scratch workspace for unit tests.

use crate::runlog::RunLog;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tools::{Downloader, ToolError, Trimmer};

pub struct Scratch {
    _temp: tempfile::TempDir,
    pub raw_dir: PathBuf,
    pub clip_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub pool: SqlitePool,
    pub log: Arc<RunLog>,
}

pub async fn scratch() -> Scratch {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().to_path_buf();
    let pool = storage::connect(&root.join("status.db").to_string_lossy())
        .await
        .unwrap();
    storage::migrate(&pool).await.unwrap();
    let log = Arc::new(RunLog::open(&root.join("log.txt")).unwrap());
    Scratch {
        raw_dir: root.join("raw_videos"),
        clip_dir: root.join("videos"),
        labels_dir: root.join("labels"),
        _temp: temp,
        pool,
        log,
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    calls: AtomicUsize,
    failing: Vec<String>,
    /// Simulates another writer publishing the target mid-download.
    race_target: Option<PathBuf>,
}

impl FakeDownloader {
    pub fn failing<const N: usize>(ids: [&str; N]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn racing(target: PathBuf) -> Self {
        Self {
            race_target: Some(target),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|id| url.ends_with(id.as_str())) {
            return Err(ToolError::Exit {
                program: "fake-dl".into(),
                code: Some(1),
                stderr: "ERROR: Video unavailable".into(),
            });
        }
        if let Some(target) = &self.race_target {
            std::fs::write(target, b"other writer").unwrap();
        }
        std::fs::write(dest, url.as_bytes()).unwrap();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTrimmer {
    pub cuts: Mutex<Vec<(PathBuf, String, String, PathBuf)>>,
    failing: Vec<String>,
}

impl FakeTrimmer {
    /// Fails every cut whose output file name contains one of `needles`.
    pub fn failing<const N: usize>(needles: [&str; N]) -> Self {
        Self {
            failing: needles.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn cut_count(&self) -> usize {
        self.cuts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Trimmer for FakeTrimmer {
    async fn trim(
        &self,
        source: &Path,
        start: &str,
        end: &str,
        dest: &Path,
    ) -> Result<(), ToolError> {
        let name = dest.file_name().unwrap().to_string_lossy().into_owned();
        if self.failing.iter().any(|n| name.contains(n.as_str())) {
            return Err(ToolError::Exit {
                program: "fake-trim".into(),
                code: Some(1),
                stderr: "Invalid data found when processing input".into(),
            });
        }
        assert!(source.exists(), "cut started before raw video existed");
        std::fs::write(dest, format!("{start}-{end}")).unwrap();
        self.cuts.lock().unwrap().push((
            source.to_path_buf(),
            start.to_string(),
            end.to_string(),
            dest.to_path_buf(),
        ));
        Ok(())
    }
}
