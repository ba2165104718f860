use anyhow::{Context, Result};
use dataset_core::checker::{self, CompletenessReport};
use dataset_core::config::AppConfig;
use dataset_core::exporter::{self, ExportContext, ExportSummary};
use dataset_core::manifest::Manifests;
use dataset_core::models::Split;
use dataset_core::pipeline::{Pipeline, SplitSummary};
use serde::Serialize;
use storage::{ClipRow, FetchRow};

fn load_manifests(cfg: &AppConfig) -> Result<Manifests> {
    Manifests::load(&cfg.paths).context("load dataset manifests")
}

/// Downloads raw videos and cuts clips for `splits`, in the given order.
pub async fn download(cfg: &AppConfig, splits: &[Split]) -> Result<Vec<SplitSummary>> {
    let manifests = load_manifests(cfg)?;
    let pipeline = Pipeline::from_config(cfg).await?;
    pipeline.run_splits(&manifests, splits).await
}

pub fn preprocess(cfg: &AppConfig, thresholds: &[usize]) -> Result<Vec<ExportSummary>> {
    let manifests = load_manifests(cfg)?;
    exporter::export_thresholds(&ExportContext::from_config(cfg), &manifests, thresholds)
}

pub fn check(cfg: &AppConfig) -> Result<CompletenessReport> {
    let manifests = load_manifests(cfg)?;
    Ok(checker::check(&manifests, &cfg.paths.raw_dir))
}

/// Human-readable completeness report, one line per entry.
pub fn render_report(report: &CompletenessReport, verbose: bool) -> String {
    let mut out = format!(
        "Total videos: {}\nTrain videos: {}\nVal videos: {}\nTest videos: {}\n",
        report.total_expected, report.train_expected, report.val_expected, report.test_expected
    );
    if report.is_complete() {
        out.push_str("All videos downloaded successfully!\n");
        return out;
    }
    out.push_str(&format!("Not downloaded videos: {}\n", report.missing.len()));
    if verbose {
        for name in &report.missing {
            out.push_str(name);
            out.push('\n');
        }
    }
    out
}

#[derive(Debug, Serialize)]
pub struct FailureListing {
    pub fetches: Vec<FetchRow>,
    pub clips: Vec<ClipRow>,
}

pub async fn failures(cfg: &AppConfig) -> Result<FailureListing> {
    let pool = storage::connect(&cfg.database.path).await.context("db connect")?;
    storage::migrate(&pool).await.context("db migrate")?;
    Ok(FailureListing {
        fetches: storage::failed_fetches(&pool).await?,
        clips: storage::unfinished_clips(&pool).await?,
    })
}
