//! Writes the per-threshold label manifests.
//!
//! For threshold `n` the directory `<labels_dir>/<prefix><n>` receives
//! `train.txt`, `val.txt` and `test.txt` with one `<clip path> <label>` line
//! per filtered record, plus a single `labels.csv` class table for that
//! threshold. Everything is rewritten on each export.

use crate::config::AppConfig;
use crate::manifest::Manifests;
use crate::models::{ClipRecord, Split};
use crate::naming;
use crate::split::{self, FilteredSplits};
use anyhow::Context;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CLASS_TABLE: &str = "labels.csv";

#[derive(Debug, Clone)]
pub struct ExportContext {
    pub labels_dir: PathBuf,
    pub clip_dir: PathBuf,
    pub dir_prefix: String,
}

impl ExportContext {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            labels_dir: config.paths.labels_dir.clone(),
            clip_dir: config.paths.clip_dir.clone(),
            dir_prefix: config.preprocess.dir_prefix.clone(),
        }
    }

    pub fn threshold_dir(&self, threshold: usize) -> PathBuf {
        self.labels_dir
            .join(format!("{}{}", self.dir_prefix, threshold))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub threshold: usize,
    pub dir: PathBuf,
    pub train: usize,
    pub val: usize,
    pub test: usize,
    pub classes: usize,
}

pub fn export(ctx: &ExportContext, filtered: &FilteredSplits) -> anyhow::Result<ExportSummary> {
    let dir = ctx.threshold_dir(filtered.threshold);
    fs::create_dir_all(&dir).with_context(|| format!("create label dir {}", dir.display()))?;

    let mut counts = [0usize; 3];
    for (i, split) in Split::ALL.iter().enumerate() {
        let path = dir.join(format!("{}.txt", split.as_str()));
        counts[i] = write_list(&path, &filtered.split(*split).records, &ctx.clip_dir)
            .with_context(|| format!("write {}", path.display()))?;
    }

    let table = dir.join(CLASS_TABLE);
    write_class_table(&table, filtered.classes())
        .with_context(|| format!("write {}", table.display()))?;

    let summary = ExportSummary {
        threshold: filtered.threshold,
        dir,
        train: counts[0],
        val: counts[1],
        test: counts[2],
        classes: filtered.classes().len(),
    };
    info!(
        threshold = summary.threshold,
        dir = %summary.dir.display(),
        train = summary.train,
        val = summary.val,
        test = summary.test,
        classes = summary.classes,
        "label files written"
    );
    Ok(summary)
}

/// Filters and exports each threshold in turn.
pub fn export_thresholds(
    ctx: &ExportContext,
    manifests: &Manifests,
    thresholds: &[usize],
) -> anyhow::Result<Vec<ExportSummary>> {
    thresholds
        .iter()
        .map(|&n| export(ctx, &split::filter_all(manifests, n)))
        .collect()
}

fn write_list(path: &Path, records: &[ClipRecord], clip_dir: &Path) -> anyhow::Result<usize> {
    let mut out = BufWriter::new(File::create(path)?);
    for rec in records {
        let clip = clip_dir.join(naming::clip_name(rec));
        writeln!(out, "{} {}", clip.display(), rec.label)?;
    }
    out.flush()?;
    Ok(records.len())
}

fn write_class_table(path: &Path, classes: &[String]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "name"])?;
    for (id, name) in classes.iter().enumerate() {
        writer.write_record([id.to_string().as_str(), name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
