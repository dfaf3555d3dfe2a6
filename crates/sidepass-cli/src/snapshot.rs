//! Loading recorded planning snapshots.
//!
//! A snapshot file holds either one JSON [`Frame`], a JSON array of frames,
//! or (with a `.jsonl` extension) one frame per line.

use std::path::Path;

use anyhow::{Context, Result};

use sidepass_core::frame::Frame;

/// Parse frames from `content`. `json_lines` selects one-frame-per-line.
pub fn parse_frames(content: &str, json_lines: bool) -> Result<Vec<Frame>> {
    if json_lines {
        return content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                Frame::from_json_str(line)
                    .with_context(|| format!("invalid frame on line {}", idx + 1))
            })
            .collect();
    }

    if content.trim_start().starts_with('[') {
        serde_json::from_str(content).context("invalid frame array")
    } else {
        Ok(vec![Frame::from_json_str(content).context("invalid frame")?])
    }
}

/// Read every frame stored in `path`.
pub fn load_frames(path: &Path) -> Result<Vec<Frame>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file {}", path.display()))?;
    let json_lines = path.extension().is_some_and(|ext| ext == "jsonl");
    parse_frames(&content, json_lines).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: &str = r#"{
        "sequence_num": 3,
        "reference_line_info": [{
            "adc_sl_boundary": {"start_s": 0.0, "end_s": 5.0, "start_l": -1.0, "end_l": 1.0},
            "distance_to_destination": 120.0
        }],
        "obstacles": [{
            "id": "van",
            "is_static": true,
            "perception_sl_boundary": {"start_s": 10.0, "end_s": 14.0, "start_l": -1.0, "end_l": 1.0}
        }]
    }"#;

    #[test]
    fn parses_single_frame_with_defaults() {
        let frames = parse_frames(FRAME, false).unwrap();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.sequence_num, 3);
        assert_eq!(frame.obstacles[0].id, "van");
        assert!(!frame.obstacles[0].is_virtual);
        assert_eq!(frame.reference_line_info[0].lane_left_width, 1.75);
    }

    #[test]
    fn parses_frame_array() {
        let content = format!("[{FRAME}, {FRAME}]");
        assert_eq!(parse_frames(&content, false).unwrap().len(), 2);
    }

    #[test]
    fn parses_json_lines_and_reports_bad_line() {
        let one_line = FRAME.replace('\n', " ");
        let content = format!("{one_line}\n\n{one_line}\n");
        assert_eq!(parse_frames(&content, true).unwrap().len(), 2);

        let broken = format!("{one_line}\n{{not json}}\n");
        let msg = format!("{:#}", parse_frames(&broken, true).unwrap_err());
        assert!(msg.contains("line 2"), "unexpected error: {msg}");
    }

    #[test]
    fn load_frames_reads_jsonl_by_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("drive.jsonl");
        let one_line = FRAME.replace('\n', " ");
        std::fs::write(&path, format!("{one_line}\n{one_line}\n{one_line}\n")).unwrap();

        assert_eq!(load_frames(&path).unwrap().len(), 3);
    }

    #[test]
    fn load_frames_missing_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = load_frames(&tmp.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read snapshot file"));
    }
}
