//! Deterministic artifact names derived from a clip record.

use crate::models::ClipRecord;
use std::ffi::OsStr;
use std::path::Path;

/// Video id: the part of the url after the final `=`.
pub fn video_id(url: &str) -> &str {
    url.rsplit('=').next().unwrap_or(url)
}

/// File name of the raw (undivided) source video.
pub fn raw_name(record: &ClipRecord) -> String {
    format!("{}.mp4", video_id(&record.url))
}

/// File name of the trimmed clip.
pub fn clip_name(record: &ClipRecord) -> String {
    format!(
        "{}_{}_{}_{}_{}.mp4",
        video_id(&record.url),
        record.text,
        record.label,
        record.start,
        record.end
    )
}

/// True when `name` is a single plain path component, so joining it onto a
/// directory stays inside that directory.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// `HH:MM:SS.mmm`, hours and minutes zero-padded, seconds to three decimals.
/// Rounds to whole milliseconds first so a carry reaches minutes and hours.
pub fn seconds_to_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> ClipRecord {
        ClipRecord {
            url: url.into(),
            text: "hello".into(),
            label: 0.into(),
            start: 10.into(),
            end: 42.into(),
            start_time: 0.3,
            end_time: 1.4,
        }
    }

    #[test]
    fn timestamps() {
        assert_eq!(seconds_to_timestamp(3661.25), "01:01:01.250");
        assert_eq!(seconds_to_timestamp(0.0), "00:00:00.000");
        assert_eq!(seconds_to_timestamp(59.999), "00:00:59.999");
        assert_eq!(seconds_to_timestamp(754.5), "00:12:34.500");
    }

    #[test]
    fn rounding_carries_into_minutes_and_hours() {
        assert_eq!(seconds_to_timestamp(59.9996), "00:01:00.000");
        assert_eq!(seconds_to_timestamp(3599.9999), "01:00:00.000");
        assert_eq!(seconds_to_timestamp(1.33), "00:00:01.330");
    }

    #[test]
    fn urls_without_equals_do_not_give_plain_names() {
        let rec = record("https://youtu.be/abc");
        assert!(!is_plain_file_name(&raw_name(&rec)));
        assert!(is_plain_file_name(&raw_name(&record("https://www.youtube.com/watch?v=abc"))));

        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name("a\\b.mp4"));
        assert!(!is_plain_file_name("../x.mp4"));
        assert!(is_plain_file_name("..x.mp4"));
    }

    #[test]
    fn names_use_last_equals_segment() {
        let rec = record("https://www.youtube.com/watch?v=oxhz4M4Gaxo");
        assert_eq!(raw_name(&rec), "oxhz4M4Gaxo.mp4");
        assert_eq!(clip_name(&rec), "oxhz4M4Gaxo_hello_0_10_42.mp4");

        let rec = record("www.youtube.com/watch?feature=x&v=abc");
        assert_eq!(raw_name(&rec), "abc.mp4");
    }

    #[test]
    fn names_are_pure_functions_of_fields() {
        let a = record("https://www.youtube.com/watch?v=abc");
        let b = a.clone();
        assert_eq!(raw_name(&a), raw_name(&b));
        assert_eq!(clip_name(&a), clip_name(&b));

        let mut c = a.clone();
        c.start = 11.into();
        assert_eq!(raw_name(&a), raw_name(&c));
        assert_ne!(clip_name(&a), clip_name(&c));
    }
}
