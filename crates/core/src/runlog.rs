//! Append-only failure log kept across runs for post-hoc auditing.

use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open run log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one timestamped line. Embedded newlines are flattened so each
    /// failure stays on a single line.
    pub fn append(&self, message: &str) -> anyhow::Result<()> {
        let line = message.replace(['\r', '\n'], " ");
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("run log lock poisoned"))?;
        writeln!(file, "[{stamp}] {line}")?;
        file.flush()?;
        Ok(())
    }
}
