//! Interpolation helpers:
//! - lerp_f32 / lerp_color (component-wise)
//! - bezier_ease_t (cubic-bezier timing)
//! - interpolate_value (hold for discrete kinds, blend otherwise)

use crate::value::{Color, TrackValue};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

/// Component-wise blend in `a`'s color space; `b` is converted first if needed.
#[inline]
pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let b = b.to_space(a.space);
    Color {
        space: a.space,
        components: lerp_vec4(a.components, b.components, t),
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

/// Blend two key values at an already-eased ratio.
///
/// Bool and string values never blend: the left value is returned unchanged.
/// Mismatched kinds also fall back to the left value.
pub fn interpolate_value(a: &TrackValue, b: &TrackValue, t: f32) -> TrackValue {
    match (a, b) {
        (TrackValue::Float(va), TrackValue::Float(vb)) => TrackValue::Float(lerp_f32(*va, *vb, t)),
        (TrackValue::Color(ca), TrackValue::Color(cb)) => TrackValue::Color(lerp_color(*ca, *cb, t)),
        _ => a.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::TimingInterpolation;

    #[test]
    fn easing_hits_endpoints() {
        for timing in [
            TimingInterpolation::Linear,
            TimingInterpolation::EaseIn,
            TimingInterpolation::EaseOut,
            TimingInterpolation::EaseInOut,
        ] {
            assert!(timing.ease(0.0).abs() < 1e-4, "{timing:?}");
            assert!((timing.ease(1.0) - 1.0).abs() < 1e-4, "{timing:?}");
        }
    }

    #[test]
    fn ease_in_lags_linear_at_midpoint() {
        assert!(TimingInterpolation::EaseIn.ease(0.5) < 0.5);
        assert!(TimingInterpolation::EaseOut.ease(0.5) > 0.5);
        assert!((TimingInterpolation::EaseInOut.ease(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn discrete_values_hold_left() {
        let a = TrackValue::String("idle".into());
        let b = TrackValue::String("walk".into());
        assert_eq!(interpolate_value(&a, &b, 0.99), a);
        assert_eq!(
            interpolate_value(&TrackValue::Bool(false), &TrackValue::Bool(true), 0.7),
            TrackValue::Bool(false)
        );
    }

    #[test]
    fn colors_blend_per_component() {
        let a = Color::srgb(0.0, 0.0, 0.0, 1.0);
        let b = Color::srgb(1.0, 0.5, 0.25, 0.0);
        let mid = lerp_color(a, b, 0.5);
        assert_eq!(mid.components, [0.5, 0.25, 0.125, 0.5]);
    }
}
