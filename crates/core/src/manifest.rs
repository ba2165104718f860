//! Loads the split manifests and the class list.
//!
//! Every failure here is an input precondition error: nothing has been
//! downloaded or written yet, and there is no recovery path.

use crate::config::PathsConfig;
use crate::models::{ClassList, ClipRecord, Split};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: record {index} has start_time {start_time} >= end_time {end_time}")]
    InvalidInterval {
        path: PathBuf,
        index: usize,
        start_time: f64,
        end_time: f64,
    },
}

/// All inputs of a run, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Manifests {
    pub train: Vec<ClipRecord>,
    pub val: Vec<ClipRecord>,
    pub test: Vec<ClipRecord>,
    pub classes: ClassList,
}

impl Manifests {
    pub fn load(paths: &PathsConfig) -> Result<Self, ManifestError> {
        let manifests = Self {
            train: load_records(&paths.train_manifest)?,
            val: load_records(&paths.val_manifest)?,
            test: load_records(&paths.test_manifest)?,
            classes: load_classes(&paths.classes)?,
        };
        info!(
            train = manifests.train.len(),
            val = manifests.val.len(),
            test = manifests.test.len(),
            classes = manifests.classes.len(),
            "manifests loaded"
        );
        Ok(manifests)
    }

    pub fn split(&self, split: Split) -> &[ClipRecord] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_records(path: &Path) -> Result<Vec<ClipRecord>, ManifestError> {
    let records: Vec<ClipRecord> = read_json(path)?;
    for (index, rec) in records.iter().enumerate() {
        // Also rejects NaN.
        if !(rec.start_time < rec.end_time) {
            return Err(ManifestError::InvalidInterval {
                path: path.to_path_buf(),
                index,
                start_time: rec.start_time,
                end_time: rec.end_time,
            });
        }
    }
    Ok(records)
}

pub fn load_classes(path: &Path) -> Result<ClassList, ManifestError> {
    read_json(path)
}
