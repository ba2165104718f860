use crate::{run_tool, ToolError, Trimmer};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    pub program: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    cfg: FfmpegConfig,
}

impl Ffmpeg {
    pub fn new(cfg: FfmpegConfig) -> Self {
        Self { cfg }
    }

    /// Stream-copy cut. `-y` because clips are always regenerated.
    pub fn args(source: &Path, start: &str, end: &str, dest: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-ss".into(),
            start.into(),
            "-to".into(),
            end.into(),
            "-i".into(),
            source.to_string_lossy().into_owned(),
            "-c".into(),
            "copy".into(),
            dest.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait::async_trait]
impl Trimmer for Ffmpeg {
    async fn trim(
        &self,
        source: &Path,
        start: &str,
        end: &str,
        dest: &Path,
    ) -> Result<(), ToolError> {
        run_tool(
            &self.cfg.program,
            &Self::args(source, start, end, dest),
            self.cfg.timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_is_stream_copy_between_timestamps() {
        let args = Ffmpeg::args(
            Path::new("raw/abc.mp4"),
            "00:00:01.500",
            "00:00:03.000",
            Path::new("clips/out.mp4"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-ss 00:00:01.500 -to 00:00:03.000 -i raw/abc.mp4"));
        assert!(joined.ends_with("-c copy clips/out.mp4"));
        assert_eq!(args[0], "-y");
    }
}
