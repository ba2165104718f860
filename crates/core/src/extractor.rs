//! Cuts labeled sub-clips out of raw videos.

use crate::naming::seconds_to_timestamp;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tools::{ToolError, Trimmer};
use tracing::debug;

pub struct ClipExtractor {
    raw_dir: PathBuf,
    clip_dir: PathBuf,
    trimmer: Arc<dyn Trimmer>,
}

impl ClipExtractor {
    pub fn new(raw_dir: &Path, clip_dir: &Path, trimmer: Arc<dyn Trimmer>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(clip_dir)
            .with_context(|| format!("create clip dir {}", clip_dir.display()))?;
        Ok(Self {
            raw_dir: raw_dir.to_path_buf(),
            clip_dir: clip_dir.to_path_buf(),
            trimmer,
        })
    }

    pub fn output_path(&self, clip_name: &str) -> PathBuf {
        self.clip_dir.join(clip_name)
    }

    /// Always regenerates `output_path`; there is no existence check.
    pub async fn clip(
        &self,
        raw_name: &str,
        start_time: f64,
        end_time: f64,
        output_path: &Path,
    ) -> Result<(), ToolError> {
        let start = seconds_to_timestamp(start_time);
        let end = seconds_to_timestamp(end_time);
        debug!(raw_name, %start, %end, output = %output_path.display(), "cutting clip");
        self.trimmer
            .trim(&self.raw_dir.join(raw_name), &start, &end, output_path)
            .await
    }
}
