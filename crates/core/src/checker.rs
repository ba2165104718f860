//! Compares the raw videos the manifests expect with what is on disk.

use crate::manifest::Manifests;
use crate::models::{ClipRecord, Split};
use crate::naming;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    /// Unique raw videos across all splits.
    pub total_expected: usize,
    pub train_expected: usize,
    pub val_expected: usize,
    pub test_expected: usize,
    /// Expected raw videos found in the raw directory.
    pub present: usize,
    pub missing: Vec<String>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Unique raw file names referenced by one split.
pub fn expected_raw_names(records: &[ClipRecord]) -> BTreeSet<String> {
    records.iter().map(naming::raw_name).collect()
}

/// Regular files directly inside `raw_dir`, symlinks resolved. A missing
/// directory lists as empty; other unreadable entries are logged and skipped.
pub fn list_raw_dir(raw_dir: &Path) -> BTreeSet<String> {
    if !raw_dir.exists() {
        return BTreeSet::new();
    }
    WalkDir::new(raw_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "cannot read raw video entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect()
}

pub fn check(manifests: &Manifests, raw_dir: &Path) -> CompletenessReport {
    let per_split: Vec<BTreeSet<String>> = Split::ALL
        .iter()
        .map(|s| expected_raw_names(manifests.split(*s)))
        .collect();
    let expected: BTreeSet<String> = per_split.iter().flatten().cloned().collect();
    let on_disk = list_raw_dir(raw_dir);
    let missing: Vec<String> = expected.difference(&on_disk).cloned().collect();

    CompletenessReport {
        total_expected: expected.len(),
        train_expected: per_split[0].len(),
        val_expected: per_split[1].len(),
        test_expected: per_split[2].len(),
        present: expected.len() - missing.len(),
        missing,
    }
}
