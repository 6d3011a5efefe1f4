use anyhow::{Context, Result, ensure};
use morsescope_messages::DecodeResult;
use std::fs;
use std::path::Path;

use crate::regions::RegionIndex;

/// Longest recording a decode result may describe, seconds
pub const MAX_DURATION: f64 = 3_600.0;

/// Load a decoder result from a JSON file and check its events.
pub fn load_decode_result<P: AsRef<Path>>(path: P) -> Result<DecodeResult> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let result = DecodeResult::from_json(&json).with_context(|| format!("parsing {}", path.display()))?;
    RegionIndex::new(result.events.clone()).with_context(|| format!("invalid events in {}", path.display()))?;
    let end = result.events.last().map_or(0.0, |ev| ev.end);
    ensure!(
        end <= MAX_DURATION,
        "{}: events run until {end:.0}s, longer than {MAX_DURATION:.0}s",
        path.display()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_decode_result() {
        let file = write_json(
            r#"{"full_text": "E", "frequency": 700, "wpm": 15,
                "events": [{"start": 0.1, "end": 0.2, "char": "E"}]}"#,
        );
        let result = load_decode_result(file.path()).unwrap();
        assert_eq!(result.full_text, "E");
        assert_eq!(result.events[0].ch, 'E');
    }

    #[test]
    fn test_load_rejects_overlapping_events() {
        let file = write_json(
            r#"{"events": [{"start": 0.0, "end": 0.3, "char": "A"},
                           {"start": 0.2, "end": 0.4, "char": "B"}]}"#,
        );
        let err = load_decode_result(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("overlap"));
    }

    #[test]
    fn test_load_rejects_absurd_duration() {
        let file = write_json(r#"{"events": [{"start": 0.0, "end": 1e9, "char": "E"}]}"#);
        let err = load_decode_result(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("longer than"));

        let file = write_json(r#"{"events": [{"start": 3599.0, "end": 3600.0, "char": "E"}]}"#);
        assert!(load_decode_result(file.path()).is_ok());
    }

    #[test]
    fn test_load_reports_bad_json_and_missing_file() {
        let file = write_json("{ not json");
        assert!(load_decode_result(file.path()).is_err());
        assert!(load_decode_result("/nonexistent/decode.json").is_err());
    }
}
