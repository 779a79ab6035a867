//! Sprite-sheet animation clips and deterministic frame advancement.
//!
//! A clip is a list of sheet frame indices with per-frame durations. Timing is
//! kept in integer microseconds so advancing by the same deltas always lands on
//! the same frame.
//!
//! Sheet definition files store `duration_ms` for readability; on load this is
//! converted to `duration_us`.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Longest frame a clip file may declare. Keeps every microsecond total well
/// inside `u64`.
pub const MAX_FRAME_DURATION_MS: u64 = 60 * 60 * 1000;

/// Convert a file-level millisecond duration to microseconds. `None` when it
/// exceeds `MAX_FRAME_DURATION_MS`.
pub fn frame_duration_us(duration_ms: u64) -> Option<u64> {
    if duration_ms > MAX_FRAME_DURATION_MS {
        return None;
    }
    duration_ms.checked_mul(1000)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipFrame {
    /// Index into the sheet grid, row-major.
    pub index: usize,
    pub duration_us: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    pub frames: Vec<ClipFrame>,
    pub looping: bool,
}

impl AnimationClip {
    /// Every frame in `0..frame_count` with the same duration.
    pub fn uniform(frame_count: usize, frame_duration_us: u64, looping: bool) -> Self {
        Self {
            frames: (0..frame_count)
                .map(|index| ClipFrame {
                    index,
                    duration_us: frame_duration_us,
                })
                .collect(),
            looping,
        }
    }

    pub fn total_duration_us(&self) -> u64 {
        self.frames
            .iter()
            .fold(0u64, |total, f| total.saturating_add(f.duration_us))
    }
}

/// Playback cursor for one clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationState {
    pub cursor: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by `dt_us` and return the sheet frame index now showing.
    pub fn tick(&mut self, dt_us: u64, clip: &AnimationClip) -> usize {
        if clip.frames.is_empty() {
            return 0;
        }
        if self.finished {
            return self.current_index(clip);
        }

        self.elapsed_us = self.elapsed_us.saturating_add(dt_us);
        if clip.looping {
            // Whole cycles land back on the same frame.
            let cycle = clip.total_duration_us();
            if cycle == 0 {
                return self.current_index(clip);
            }
            self.elapsed_us %= cycle;
        }
        loop {
            let frame = &clip.frames[self.cursor];
            if self.elapsed_us < frame.duration_us {
                break;
            }
            self.elapsed_us -= frame.duration_us;
            self.cursor += 1;

            if self.cursor >= clip.frames.len() {
                if clip.looping {
                    self.cursor = 0;
                } else {
                    self.cursor = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        clip.frames[self.cursor].index
    }

    pub fn current_index(&self, clip: &AnimationClip) -> usize {
        clip.frames
            .get(self.cursor)
            .or(clip.frames.last())
            .map(|f| f.index)
            .unwrap_or(0)
    }
}

/// Grid layout plus named clips for one sheet texture.
#[derive(Debug, Clone)]
pub struct SheetDefinition {
    pub version: String,
    pub sheet_id: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub clips: HashMap<String, AnimationClip>,
}

#[derive(Debug, Deserialize)]
struct SheetFileJson {
    version: String,
    sheet_id: String,
    frame_width: u32,
    frame_height: u32,
    clips: HashMap<String, ClipJson>,
}

#[derive(Debug, Deserialize)]
struct ClipJson {
    frames: Vec<FrameJson>,
    #[serde(default)]
    looping: bool,
}

#[derive(Debug, Deserialize)]
struct FrameJson {
    index: usize,
    duration_ms: u64,
}

pub fn load_sheet_file(path: &Path) -> Result<SheetDefinition, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sheet file {}: {e}", path.display()))?;
    parse_sheet_definition(&raw)
        .map_err(|e| format!("Invalid sheet file {}: {e}", path.display()))
}

pub fn parse_sheet_definition(raw: &str) -> Result<SheetDefinition, String> {
    let json: SheetFileJson =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse sheet JSON: {e}"))?;
    validate_sheet_json(&json)?;

    let mut clips = HashMap::with_capacity(json.clips.len());
    for (name, clip) in json.clips {
        let frames = clip
            .frames
            .into_iter()
            .map(|f| {
                frame_duration_us(f.duration_ms)
                    .map(|duration_us| ClipFrame {
                        index: f.index,
                        duration_us,
                    })
                    .ok_or_else(|| {
                        format!("clip '{name}' duration_ms {} is too large", f.duration_ms)
                    })
            })
            .collect::<Result<Vec<_>, String>>()?;
        clips.insert(
            name,
            AnimationClip {
                frames,
                looping: clip.looping,
            },
        );
    }

    Ok(SheetDefinition {
        version: json.version,
        sheet_id: json.sheet_id,
        frame_width: json.frame_width,
        frame_height: json.frame_height,
        clips,
    })
}

fn validate_sheet_json(json: &SheetFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Sheet validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.sheet_id.is_empty() {
        return Err("Sheet validation failed: sheet_id is empty".to_string());
    }
    if json.frame_width == 0 || json.frame_height == 0 {
        return Err("Sheet validation failed: frame size must be > 0".to_string());
    }
    for (name, clip) in &json.clips {
        if clip.frames.is_empty() {
            return Err(format!(
                "Sheet validation failed: clip '{}' has no frames",
                name
            ));
        }
        if let Some(i) = clip.frames.iter().position(|f| f.duration_ms == 0) {
            return Err(format!(
                "Sheet validation failed: clip '{}' frame {} has zero duration",
                name, i
            ));
        }
        if let Some(i) = clip
            .frames
            .iter()
            .position(|f| f.duration_ms > MAX_FRAME_DURATION_MS)
        {
            return Err(format!(
                "Sheet validation failed: clip '{}' frame {} is longer than {} ms",
                name, i, MAX_FRAME_DURATION_MS
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "spw_sheet_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn make_clip(durations_ms: &[u64], looping: bool) -> AnimationClip {
        AnimationClip {
            frames: durations_ms
                .iter()
                .enumerate()
                .map(|(i, &d)| ClipFrame {
                    index: i * 2,
                    duration_us: d * 1000,
                })
                .collect(),
            looping,
        }
    }

    #[test]
    fn tick_advances_through_frames() {
        let clip = make_clip(&[100, 100, 100], true);
        let mut state = AnimationState::new();

        assert_eq!(state.tick(0, &clip), 0);
        assert_eq!(state.tick(50_000, &clip), 0);
        // 110ms total
        assert_eq!(state.tick(60_000, &clip), 2);
    }

    #[test]
    fn looping_wraps_around() {
        let clip = make_clip(&[100, 100], true);
        let mut state = AnimationState::new();
        assert_eq!(state.tick(250_000, &clip), 0);
        assert!(!state.finished);
    }

    #[test]
    fn one_shot_holds_last_frame() {
        let clip = make_clip(&[100, 100], false);
        let mut state = AnimationState::new();
        assert_eq!(state.tick(300_000, &clip), 2);
        assert!(state.finished);
        assert_eq!(state.tick(100_000, &clip), 2);
    }

    #[test]
    fn uniform_clip_covers_every_frame() {
        let clip = AnimationClip::uniform(4, 50_000, true);
        assert_eq!(clip.frames.len(), 4);
        assert_eq!(clip.total_duration_us(), 200_000);
        let mut state = AnimationState::new();
        assert_eq!(state.tick(150_000, &clip), 3);
    }

    #[test]
    fn identical_deltas_give_identical_frames() {
        let clip = make_clip(&[100, 150, 80], true);
        let mut a = AnimationState::new();
        let mut b = AnimationState::new();
        for _ in 0..100 {
            assert_eq!(a.tick(16_667, &clip), b.tick(16_667, &clip));
        }
        assert_eq!(a, b);
    }

    #[test]
    fn empty_clip_yields_frame_zero() {
        let clip = AnimationClip {
            frames: Vec::new(),
            looping: true,
        };
        let mut state = AnimationState::new();
        assert_eq!(state.tick(1_000, &clip), 0);
    }

    #[test]
    fn load_sheet_file_parses_valid_json() {
        let path = temp_file_path("valid");
        let json = r#"
        {
          "version": "0.1",
          "sheet_id": "hero",
          "frame_width": 16,
          "frame_height": 24,
          "clips": {
            "walk": {
              "frames": [
                { "index": 0, "duration_ms": 100 },
                { "index": 1, "duration_ms": 120 }
              ],
              "looping": true
            }
          }
        }
        "#;
        fs::write(&path, json).expect("write temp file");

        let sheet = load_sheet_file(&path).expect("should parse");
        assert_eq!(sheet.sheet_id, "hero");
        assert_eq!(sheet.frame_width, 16);
        let walk = &sheet.clips["walk"];
        assert!(walk.looping);
        assert_eq!(walk.frames[1].duration_us, 120_000);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn parse_rejects_zero_duration_and_bad_version() {
        let zero = r#"{"version":"0.1","sheet_id":"s","frame_width":8,"frame_height":8,
            "clips":{"idle":{"frames":[{"index":0,"duration_ms":0}]}}}"#;
        let err = parse_sheet_definition(zero).expect_err("zero duration should fail");
        assert!(err.contains("zero duration"));

        let version = r#"{"version":"2.0","sheet_id":"s","frame_width":8,"frame_height":8,"clips":{}}"#;
        let err = parse_sheet_definition(version).expect_err("bad version should fail");
        assert!(err.contains("unsupported version"));
    }

    #[test]
    fn parse_rejects_oversized_duration() {
        let raw = r#"{"version":"0.1","sheet_id":"s","frame_width":8,"frame_height":8,
            "clips":{"idle":{"frames":[{"index":0,"duration_ms":18446744073709551615}]}}}"#;
        let err = parse_sheet_definition(raw).expect_err("huge duration should fail");
        assert!(err.contains("longer than"));
        assert_eq!(frame_duration_us(MAX_FRAME_DURATION_MS), Some(3_600_000_000));
        assert_eq!(frame_duration_us(u64::MAX), None);
    }

    #[test]
    fn tick_saturates_huge_deltas() {
        let clip = make_clip(&[100, 100], true);
        let mut state = AnimationState::new();
        state.tick(u64::MAX, &clip);
        assert!(state.cursor < clip.frames.len());
        assert!(state.elapsed_us < clip.total_duration_us());

        let once = make_clip(&[100, 100], false);
        let mut state = AnimationState::new();
        assert_eq!(state.tick(u64::MAX, &once), 2);
        assert!(state.finished);
    }

    #[test]
    fn parse_rejects_zero_frame_size() {
        let raw = r#"{"version":"0.1","sheet_id":"s","frame_width":0,"frame_height":8,"clips":{}}"#;
        let err = parse_sheet_definition(raw).expect_err("zero frame width should fail");
        assert!(err.contains("frame size"));
    }
}
