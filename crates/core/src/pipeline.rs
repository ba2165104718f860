use crate::config::{AppConfig, ClipFailurePolicy, ToolsConfig};
use crate::extractor::ClipExtractor;
use crate::fetcher::{FetchOutcome, VideoFetcher};
use crate::manifest::Manifests;
use crate::models::{ClipRecord, Split};
use crate::naming;
use crate::runlog::RunLog;
use anyhow::{anyhow, Context};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storage::{connect, migrate, ClipState};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tools::ffmpeg::FfmpegConfig;
use tools::ytdlp::YtDlpConfig;
use tools::{Downloader, Ffmpeg, Trimmer, YtDlp};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitSummary {
    pub split: String,
    pub records: usize,
    pub raw_videos: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub fetch_failed: usize,
    pub clips_written: usize,
    pub clips_failed: usize,
    pub clips_skipped: usize,
}

impl SplitSummary {
    fn add(&mut self, other: &SplitSummary) {
        self.raw_videos += other.raw_videos;
        self.downloaded += other.downloaded;
        self.already_present += other.already_present;
        self.fetch_failed += other.fetch_failed;
        self.clips_written += other.clips_written;
        self.clips_failed += other.clips_failed;
        self.clips_skipped += other.clips_skipped;
    }
}

/// All clips of one source video. The fetch happens once, before any cut.
struct RawGroup {
    raw_name: String,
    url: String,
    records: Vec<ClipRecord>,
}

/// Groups records by raw name; groups keep first-appearance order and
/// records keep input order within a group.
fn group_by_raw(records: &[ClipRecord]) -> Vec<RawGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RawGroup> = Vec::new();
    for rec in records {
        let raw_name = naming::raw_name(rec);
        match index.get(&raw_name) {
            Some(&i) => groups[i].records.push(rec.clone()),
            None => {
                index.insert(raw_name.clone(), groups.len());
                groups.push(RawGroup {
                    raw_name,
                    url: rec.url.clone(),
                    records: vec![rec.clone()],
                });
            }
        }
    }
    groups
}

struct Shared {
    fetcher: VideoFetcher,
    extractor: ClipExtractor,
    pool: SqlitePool,
    log: Arc<RunLog>,
    clip_failure: ClipFailurePolicy,
    halted: AtomicBool,
}

pub struct Pipeline {
    shared: Arc<Shared>,
    workers: usize,
    progress: bool,
}

pub fn build_tools(cfg: &ToolsConfig) -> (Arc<dyn Downloader>, Arc<dyn Trimmer>) {
    let downloader = YtDlp::new(YtDlpConfig {
        program: cfg.downloader.clone(),
        timeout: cfg.timeout(),
    });
    let trimmer = Ffmpeg::new(FfmpegConfig {
        program: cfg.trimmer.clone(),
        timeout: cfg.timeout(),
    });
    (Arc::new(downloader), Arc::new(trimmer))
}

impl Pipeline {
    pub fn new(
        config: &AppConfig,
        pool: SqlitePool,
        downloader: Arc<dyn Downloader>,
        trimmer: Arc<dyn Trimmer>,
    ) -> anyhow::Result<Self> {
        let log = Arc::new(RunLog::open(&config.paths.log_path)?);
        let fetcher =
            VideoFetcher::new(&config.paths.raw_dir, downloader, pool.clone(), log.clone())?;
        let extractor =
            ClipExtractor::new(&config.paths.raw_dir, &config.paths.clip_dir, trimmer)?;
        Ok(Self {
            shared: Arc::new(Shared {
                fetcher,
                extractor,
                pool,
                log,
                clip_failure: config.run.clip_failure,
                halted: AtomicBool::new(false),
            }),
            workers: config.run.workers.max(1),
            progress: config.run.progress,
        })
    }

    /// Wires the real downloader and trimmer and opens the status store.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = connect(&config.database.path).await.context("db connect")?;
        migrate(&pool).await.context("db migrate")?;
        let (downloader, trimmer) = build_tools(&config.tools);
        Self::new(config, pool, downloader, trimmer)
    }

    /// Downloads and clips every split, train then val then test.
    pub async fn run_all(&self, manifests: &Manifests) -> anyhow::Result<Vec<SplitSummary>> {
        self.run_splits(manifests, &Split::ALL).await
    }

    pub async fn run_splits(
        &self,
        manifests: &Manifests,
        splits: &[Split],
    ) -> anyhow::Result<Vec<SplitSummary>> {
        let mut summaries = Vec::with_capacity(splits.len());
        for &split in splits {
            summaries.push(self.run(split, manifests.split(split), &manifests.classes).await?);
        }
        Ok(summaries)
    }

    /// Fetches and cuts one split. Work is grouped per raw video: groups start
    /// in order of first appearance and each group cuts its clips in input
    /// order, so with several records per video the cut order is grouped
    /// rather than the manifest's interleaved order, even with one worker.
    pub async fn run(
        &self,
        split: Split,
        records: &[ClipRecord],
        classes: &[String],
    ) -> anyhow::Result<SplitSummary> {
        info!(%split, records = records.len(), "Starting download phase...");
        let known: HashSet<&str> = classes.iter().map(String::as_str).collect();
        for rec in records.iter().filter(|r| !known.contains(r.text.as_str())) {
            warn!(class = %rec.text, url = %rec.url, "Class not found in class list");
        }

        self.shared.halted.store(false, Ordering::SeqCst);
        let pb = self.progress_bar(split, records.len())?;
        let groups = group_by_raw(records);
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<anyhow::Result<SplitSummary>> = JoinSet::new();

        for group in groups {
            let permit = semaphore.clone().acquire_owned().await?;
            if self.shared.halted.load(Ordering::SeqCst) {
                break;
            }
            let shared = self.shared.clone();
            let pb = pb.clone();
            tasks.spawn(async move {
                let _permit = permit;
                process_group(&shared, split, group, &pb).await
            });
        }

        let mut summary = SplitSummary {
            split: split.to_string(),
            records: records.len(),
            ..SplitSummary::default()
        };
        let mut first_error: Option<anyhow::Error> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined.context("clip task panicked")? {
                Ok(group_summary) => summary.add(&group_summary),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        pb.finish_and_clear();

        if let Some(e) = first_error {
            return Err(e.context(format!("{split} split halted on clip failure")));
        }
        info!(
            %split,
            downloaded = summary.downloaded,
            present = summary.already_present,
            fetch_failed = summary.fetch_failed,
            clipped = summary.clips_written,
            clip_failed = summary.clips_failed,
            skipped = summary.clips_skipped,
            "Download phase complete."
        );
        Ok(summary)
    }

    fn progress_bar(&self, split: Split, len: usize) -> anyhow::Result<ProgressBar> {
        if !self.progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(ProgressStyle::with_template(
            "{prefix:>5} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})",
        )?);
        pb.set_prefix(split.as_str());
        Ok(pb)
    }
}

async fn process_group(
    shared: &Shared,
    split: Split,
    group: RawGroup,
    pb: &ProgressBar,
) -> anyhow::Result<SplitSummary> {
    if shared.halted.load(Ordering::SeqCst) {
        return Ok(SplitSummary::default());
    }
    let mut summary = SplitSummary {
        raw_videos: 1,
        ..SplitSummary::default()
    };
    let outcome = shared.fetcher.fetch(&group.raw_name, &group.url).await;
    match &outcome {
        FetchOutcome::AlreadyPresent => summary.already_present += 1,
        FetchOutcome::Downloaded => summary.downloaded += 1,
        FetchOutcome::Failed(_) => summary.fetch_failed += 1,
    }

    for rec in &group.records {
        if shared.halted.load(Ordering::SeqCst) {
            break;
        }
        let clip_name = naming::clip_name(rec);
        let output = shared.extractor.output_path(&clip_name);
        let output_str = output.to_string_lossy();

        if !outcome.is_available() {
            debug!(raw_name = %group.raw_name, "raw video unavailable, skipping clip");
            record_clip(
                shared,
                &output_str,
                &group.raw_name,
                split,
                ClipState::Skipped,
                Some("raw video unavailable"),
            )
            .await;
            summary.clips_skipped += 1;
            pb.inc(1);
            continue;
        }

        let cut = if naming::is_plain_file_name(&clip_name) {
            shared
                .extractor
                .clip(&group.raw_name, rec.start_time, rec.end_time, &output)
                .await
                .map_err(anyhow::Error::new)
        } else {
            Err(anyhow!("clip name {clip_name:?} is not a plain file name"))
        };
        match cut {
            Ok(()) => {
                record_clip(
                    shared,
                    &output_str,
                    &group.raw_name,
                    split,
                    ClipState::Clipped,
                    None,
                )
                .await;
                summary.clips_written += 1;
            }
            Err(e) => {
                let message = format!(
                    "Error clipping video {} into {}: {e:#}",
                    group.raw_name, output_str
                );
                warn!("{message}");
                if let Err(log_err) = shared.log.append(&message) {
                    warn!(error = %log_err, "failed to write run log");
                }
                let error_text = format!("{e:#}");
                record_clip(
                    shared,
                    &output_str,
                    &group.raw_name,
                    split,
                    ClipState::Failed,
                    Some(&error_text),
                )
                .await;
                summary.clips_failed += 1;
                if shared.clip_failure == ClipFailurePolicy::Halt {
                    shared.halted.store(true, Ordering::SeqCst);
                    pb.inc(1);
                    return Err(e.context(message));
                }
            }
        }
        pb.inc(1);
    }
    Ok(summary)
}

async fn record_clip(
    shared: &Shared,
    output: &str,
    raw_name: &str,
    split: Split,
    state: ClipState,
    error: Option<&str>,
) {
    if let Err(e) =
        storage::record_clip(&shared.pool, output, raw_name, split.as_str(), state, error).await
    {
        warn!(output, error = %e, "failed to record clip status");
    }
}
