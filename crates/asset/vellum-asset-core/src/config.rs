//! Runtime configuration and the fixed frame clock.

use serde::{Deserialize, Serialize};

/// Keys are authored on a fixed 60 Hz frame grid.
pub const FRAMES_PER_SECOND: u32 = 60;

/// Wall-clock length of one frame in seconds.
pub const FRAME_DURATION: f32 = 1.0 / FRAMES_PER_SECOND as f32;

/// Seconds at which `frame` starts.
#[inline]
pub fn frame_to_seconds(frame: u32) -> f32 {
    frame as f32 * FRAME_DURATION
}

/// Frame containing the instant `seconds` (negative times map to frame 0).
#[inline]
pub fn seconds_to_frame(seconds: f32) -> u32 {
    if seconds <= 0.0 {
        return 0;
    }
    // Nudge to absorb float error right on a frame boundary.
    (seconds / FRAME_DURATION + 1e-4).floor() as u32
}

/// Configuration shared by an asset instance and every nested instance it builds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How many reference elements deep nested instances may be built.
    /// References beyond this depth are left unresolved, which also breaks
    /// assets that (transitively) reference themselves.
    pub max_reference_depth: usize,

    /// Timeline length used by `play_clip_timeline` when the caller gives none.
    /// `None` falls back to the clip's last key time.
    pub default_timeline_duration: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_reference_depth: 8,
            default_timeline_duration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_clock_round_trips() {
        assert_eq!(seconds_to_frame(frame_to_seconds(0)), 0);
        assert_eq!(seconds_to_frame(frame_to_seconds(59)), 59);
        assert_eq!(seconds_to_frame(1.0), 60);
        assert_eq!(seconds_to_frame(-3.0), 0);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "max_reference_depth": 2 }"#).unwrap();
        assert_eq!(cfg.max_reference_depth, 2);
        assert_eq!(cfg.default_timeline_duration, None);
    }
}
