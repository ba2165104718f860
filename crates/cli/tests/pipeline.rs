use dataset_core::config::{AppConfig, ClipFailurePolicy, DatabaseConfig, PathsConfig, RunConfig};
use dataset_core::manifest::Manifests;
use dataset_core::pipeline::Pipeline;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use tools::{Downloader, ToolError, Trimmer};

#[derive(Default)]
struct CountingDownloader {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Downloader for CountingDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::write(dest, url).unwrap();
        Ok(())
    }
}

struct CopyTrimmer;

#[async_trait::async_trait]
impl Trimmer for CopyTrimmer {
    async fn trim(
        &self,
        source: &Path,
        _start: &str,
        _end: &str,
        dest: &Path,
    ) -> Result<(), ToolError> {
        fs::copy(source, dest).unwrap();
        Ok(())
    }
}

const TRAIN: &str = r#"[
  {"url": "https://www.youtube.com/watch?v=vid1", "text": "hello", "label": 0,
   "start": 0, "end": 45, "start_time": 0.0, "end_time": 1.5, "signer_id": 1},
  {"url": "https://www.youtube.com/watch?v=vid1", "text": "nice", "label": 1,
   "start": 60, "end": 90, "start_time": 2.0, "end_time": 3.0, "signer_id": 1},
  {"url": "https://www.youtube.com/watch?v=vid2", "text": "hello", "label": 0,
   "start": 15, "end": 40, "start_time": 0.5, "end_time": 1.33, "signer_id": 2}
]"#;

const VAL: &str = r#"[
  {"url": "https://www.youtube.com/watch?v=vid2", "text": "deaf", "label": 2,
   "start": 100, "end": 130, "start_time": 3.3, "end_time": 4.3}
]"#;

fn write_inputs(root: &Path) -> PathsConfig {
    fs::write(root.join("train.json"), TRAIN).unwrap();
    fs::write(root.join("val.json"), VAL).unwrap();
    fs::write(root.join("test.json"), "[]").unwrap();
    fs::write(root.join("classes.json"), r#"["hello", "nice", "deaf"]"#).unwrap();
    PathsConfig {
        train_manifest: root.join("train.json"),
        val_manifest: root.join("val.json"),
        test_manifest: root.join("test.json"),
        classes: root.join("classes.json"),
        raw_dir: root.join("raw_videos"),
        clip_dir: root.join("videos"),
        labels_dir: root.join("labels"),
        log_path: root.join("log.txt"),
    }
}

fn config(root: &Path) -> AppConfig {
    AppConfig {
        paths: write_inputs(root),
        database: DatabaseConfig {
            path: root.join("status.db").to_string_lossy().into_owned(),
        },
        run: RunConfig {
            workers: 2,
            clip_failure: ClipFailurePolicy::Continue,
            progress: false,
        },
        ..AppConfig::default()
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_file())
        .count()
}

#[tokio::test]
async fn download_then_export_then_check() {
    let temp = tempdir().unwrap();
    let cfg = config(temp.path());

    // 1. Nothing downloaded yet.
    let before = cli::commands::check(&cfg).unwrap();
    assert_eq!(before.total_expected, 2);
    assert_eq!(before.missing, vec!["vid1.mp4", "vid2.mp4"]);

    // 2. Train split only: 3 records over 2 source videos.
    let pool = storage::connect(&cfg.database.path).await.unwrap();
    storage::migrate(&pool).await.unwrap();
    let downloader = Arc::new(CountingDownloader::default());
    let pipeline = Pipeline::new(&cfg, pool, downloader.clone(), Arc::new(CopyTrimmer)).unwrap();
    let manifests = Manifests::load(&cfg.paths).unwrap();
    let summary = pipeline
        .run(dataset_core::models::Split::Train, &manifests.train, &manifests.classes)
        .await
        .unwrap();

    assert_eq!(summary.clips_written, 3);
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 2);
    assert_eq!(count_files(&cfg.paths.raw_dir), 2);
    assert_eq!(count_files(&cfg.paths.clip_dir), 3);
    assert!(cfg
        .paths
        .clip_dir
        .join("vid1_nice_1_60_90.mp4")
        .exists());

    // 3. All splits: val reuses vid2, so nothing new is fetched.
    let summaries = pipeline.run_all(&manifests).await.unwrap();
    let splits: Vec<_> = summaries.iter().map(|s| s.split.as_str()).collect();
    assert_eq!(splits, vec!["train", "val", "test"]);
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 2);
    assert_eq!(count_files(&cfg.paths.clip_dir), 4);

    // 4. Label export.
    let exports = cli::commands::preprocess(&cfg, &[2, 100]).unwrap();
    let train_list = fs::read_to_string(exports[1].dir.join("train.txt")).unwrap();
    assert_eq!(train_list.lines().count(), 3);
    for line in train_list.lines() {
        let (path, label) = line.rsplit_once(' ').unwrap();
        assert!(Path::new(path).exists(), "{path} should have been clipped");
        assert!(["0", "1"].contains(&label));
    }
    let small_val = fs::read_to_string(exports[0].dir.join("val.txt")).unwrap();
    assert!(small_val.is_empty());
    let table = fs::read_to_string(exports[0].dir.join("labels.csv")).unwrap();
    assert_eq!(table.lines().collect::<Vec<_>>(), vec!["id,name", "0,hello", "1,nice"]);

    // 5. Completeness.
    let after = cli::commands::check(&cfg).unwrap();
    assert!(after.is_complete());
    fs::remove_file(cfg.paths.raw_dir.join("vid2.mp4")).unwrap();
    let partial = cli::commands::check(&cfg).unwrap();
    assert_eq!(partial.missing, vec!["vid2.mp4"]);

    // 6. Nothing failed, so nothing is listed.
    let failures = cli::commands::failures(&cfg).await.unwrap();
    assert!(failures.fetches.is_empty());
    assert!(failures.clips.is_empty());
}

#[tokio::test]
async fn malformed_manifest_fails_before_any_work() {
    let temp = tempdir().unwrap();
    let cfg = config(temp.path());
    fs::write(&cfg.paths.val_manifest, "{not json").unwrap();

    let err = cli::commands::download(&cfg, &dataset_core::models::Split::ALL)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("malformed JSON"));
    assert!(!cfg.paths.raw_dir.exists());
}
