use serde::{Deserialize, Serialize};
use std::fmt;

/// A label or ordinal as it appears in the manifest: MS-ASL uses integers,
/// other exports use strings. Rendered verbatim into file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Number(n) => write!(f, "{n}"),
            Tag::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Tag {
    fn from(v: i64) -> Self {
        Tag::Number(v.into())
    }
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::Text(v.to_string())
    }
}

/// One manifest entry: a labeled sign instance inside a source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub url: String,
    /// Class name.
    pub text: String,
    pub label: Tag,
    pub start: Tag,
    pub end: Tag,
    pub start_time: f64,
    pub end_time: f64,
}

/// Ordered class names; the position is the canonical class id.
pub type ClassList = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// Processing order for whole-dataset runs.
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "val" => Ok(Split::Val),
            "test" => Ok(Split::Test),
            other => Err(format!("unknown split: {other}")),
        }
    }
}
