use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Raw file was already on disk; nothing was downloaded.
    Present,
    Downloaded,
    Failed,
}

impl FetchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchState::Present => "present",
            FetchState::Downloaded => "downloaded",
            FetchState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipState {
    Clipped,
    Failed,
    /// Not attempted because the raw video is unavailable.
    Skipped,
}

impl ClipState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipState::Clipped => "clipped",
            ClipState::Failed => "failed",
            ClipState::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FetchRow {
    pub raw_name: String,
    pub url: String,
    pub status: String,
    pub error: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClipRow {
    pub output_path: String,
    pub raw_name: String,
    pub split: String,
    pub status: String,
    pub error: Option<String>,
    pub updated_at: i64,
}
