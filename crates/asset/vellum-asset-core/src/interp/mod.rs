//! Easing curves and value interpolation.
//!
//! Every non-hold segment is eased with a cubic-bezier timing curve chosen by
//! the left key's [`TimingInterpolation`], then values are blended linearly.

pub mod functions;

use serde::{Deserialize, Serialize};

/// Timing curve applied to the normalized position inside a key segment.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TimingInterpolation {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl TimingInterpolation {
    /// Bezier control points `(x1, y1, x2, y2)` of this curve.
    #[inline]
    pub fn control_points(self) -> [f32; 4] {
        match self {
            TimingInterpolation::Linear => [0.0, 0.0, 1.0, 1.0],
            TimingInterpolation::EaseIn => [0.42, 0.0, 1.0, 1.0],
            TimingInterpolation::EaseOut => [0.0, 0.0, 0.58, 1.0],
            TimingInterpolation::EaseInOut => [0.42, 0.0, 0.58, 1.0],
        }
    }

    /// Map a linear ratio in `[0, 1]` through the curve.
    #[inline]
    pub fn ease(self, t: f32) -> f32 {
        let [x1, y1, x2, y2] = self.control_points();
        functions::bezier_ease_t(t, x1, y1, x2, y2)
    }
}
