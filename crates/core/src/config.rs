use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub database: DatabaseConfig,
    pub tools: ToolsConfig,
    pub run: RunConfig,
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub train_manifest: PathBuf,
    pub val_manifest: PathBuf,
    pub test_manifest: PathBuf,
    pub classes: PathBuf,
    /// One file per unique source video.
    pub raw_dir: PathBuf,
    /// One file per clip record.
    pub clip_dir: PathBuf,
    /// Parent of the per-threshold `MSASL_<n>` label directories.
    pub labels_dir: PathBuf,
    /// Append-only failure log.
    pub log_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            train_manifest: "MSASL_train.json".into(),
            val_manifest: "MSASL_val.json".into(),
            test_manifest: "MSASL_test.json".into(),
            classes: "MSASL_classes.json".into(),
            raw_dir: "raw_videos".into(),
            clip_dir: "videos".into(),
            labels_dir: ".".into(),
            log_path: "log.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "status.db".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub downloader: String,
    pub trimmer: String,
    /// Upper bound for a single tool invocation.
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".into(),
            trimmer: "ffmpeg".into(),
            timeout_secs: 1800,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipFailurePolicy {
    /// Log the failure and move on to the next record.
    #[default]
    Continue,
    /// Abort the batch on the first failed cut.
    Halt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Concurrent raw-video groups.
    pub workers: usize,
    pub clip_failure: ClipFailurePolicy,
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            clip_failure: ClipFailurePolicy::Continue,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub thresholds: Vec<usize>,
    /// Label directories are named `<dir_prefix><threshold>`.
    pub dir_prefix: String,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![100, 1000],
            dir_prefix: "MSASL_".into(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("MSASL").separator("__"));
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("partial.toml");
        std::fs::write(
            &file,
            "[run]\nworkers = 4\nclip_failure = \"halt\"\n\n[paths]\nraw_dir = \"/data/raw\"\n",
        )
        .unwrap();

        let cfg = load(Some(&file.to_string_lossy())).unwrap();
        assert_eq!(cfg.run.workers, 4);
        assert_eq!(cfg.run.clip_failure, ClipFailurePolicy::Halt);
        assert_eq!(cfg.paths.raw_dir, PathBuf::from("/data/raw"));
        assert_eq!(cfg.paths.clip_dir, PathBuf::from("videos"));
        assert_eq!(cfg.tools.downloader, "yt-dlp");
        assert_eq!(cfg.preprocess.thresholds, vec![100, 1000]);
    }
}
