//! Restricts splits to the first `n` classes.

use crate::manifest::Manifests;
use crate::models::{ClipRecord, Split};
use std::collections::HashSet;
use tracing::info;

/// One split restricted to a class prefix, together with that prefix so the
/// exported ids match the filter that produced the records.
#[derive(Debug, Clone, Default)]
pub struct FilteredSplit {
    pub records: Vec<ClipRecord>,
    pub classes: Vec<String>,
}

/// The three splits filtered with the same threshold.
#[derive(Debug, Clone)]
pub struct FilteredSplits {
    pub threshold: usize,
    pub train: FilteredSplit,
    pub val: FilteredSplit,
    pub test: FilteredSplit,
}

impl FilteredSplits {
    pub fn split(&self, split: Split) -> &FilteredSplit {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    /// Class prefix shared by all three splits.
    pub fn classes(&self) -> &[String] {
        &self.train.classes
    }
}

/// Keeps records whose class name is among `classes[..n]`. A threshold past
/// the end of the list is the whole list.
pub fn filter(records: &[ClipRecord], classes: &[String], n: usize) -> FilteredSplit {
    let prefix = &classes[..n.min(classes.len())];
    let allowed: HashSet<&str> = prefix.iter().map(String::as_str).collect();
    FilteredSplit {
        records: records
            .iter()
            .filter(|r| allowed.contains(r.text.as_str()))
            .cloned()
            .collect(),
        classes: prefix.to_vec(),
    }
}

pub fn filter_all(manifests: &Manifests, n: usize) -> FilteredSplits {
    let out = FilteredSplits {
        threshold: n,
        train: filter(&manifests.train, &manifests.classes, n),
        val: filter(&manifests.val, &manifests.classes, n),
        test: filter(&manifests.test, &manifests.classes, n),
    };
    info!(
        threshold = n,
        train = out.train.records.len(),
        val = out.val.records.len(),
        test = out.test.records.len(),
        "split filtered"
    );
    out
}
