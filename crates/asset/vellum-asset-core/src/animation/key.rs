//! A single keyframed sample.

use serde::{Deserialize, Serialize};

use crate::config::frame_to_seconds;
use crate::error::AssetError;
use crate::interp::TimingInterpolation;
use crate::value::{Color, TrackValue};

/// One key: frame index, exactly one typed value and its hold/easing policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKey", into = "RawKey")]
pub struct AnimationKey {
    pub frame: u32,
    value: TrackValue,
    /// Freeze the output at this key's value until the next key.
    pub maintain_value: bool,
    pub timing: TimingInterpolation,
}

impl AnimationKey {
    pub fn new(frame: u32, value: impl Into<TrackValue>) -> Self {
        Self {
            frame,
            value: value.into(),
            maintain_value: false,
            timing: TimingInterpolation::Linear,
        }
    }

    pub fn with_maintain_value(mut self, maintain: bool) -> Self {
        self.maintain_value = maintain;
        self
    }

    pub fn with_timing(mut self, timing: TimingInterpolation) -> Self {
        self.timing = timing;
        self
    }

    #[inline]
    pub fn value(&self) -> &TrackValue {
        &self.value
    }

    /// Replace the key's value; the previous value (of any kind) is dropped.
    #[inline]
    pub fn set_value(&mut self, value: impl Into<TrackValue>) {
        self.value = value.into();
    }

    /// Start of this key in seconds.
    #[inline]
    pub fn time(&self) -> f32 {
        frame_to_seconds(self.frame)
    }
}

// ----- storage schema (serde) -----

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawKey {
    frame: u32,
    #[serde(default)]
    maintain_value: bool,
    #[serde(default)]
    timing_interpolation: TimingInterpolation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    f: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    c: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s: Option<String>,
}

impl TryFrom<RawKey> for AnimationKey {
    type Error = AssetError;

    fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
        let mut values = [
            raw.b.map(TrackValue::Bool),
            raw.f.map(TrackValue::Float),
            raw.c.map(TrackValue::Color),
            raw.s.map(TrackValue::String),
        ]
        .into_iter()
        .flatten();

        let value = values
            .next()
            .ok_or(AssetError::NoDefinedValue { frame: raw.frame })?;
        if values.next().is_some() {
            return Err(AssetError::AmbiguousValue { frame: raw.frame });
        }
        Ok(AnimationKey {
            frame: raw.frame,
            value,
            maintain_value: raw.maintain_value,
            timing: raw.timing_interpolation,
        })
    }
}

impl From<AnimationKey> for RawKey {
    fn from(key: AnimationKey) -> Self {
        let mut raw = RawKey {
            frame: key.frame,
            maintain_value: key.maintain_value,
            timing_interpolation: key.timing,
            b: None,
            f: None,
            c: None,
            s: None,
        };
        match key.value {
            TrackValue::Bool(v) => raw.b = Some(v),
            TrackValue::Float(v) => raw.f = Some(v),
            TrackValue::Color(v) => raw.c = Some(v),
            TrackValue::String(v) => raw.s = Some(v),
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_value_replaces_kind() {
        let mut key = AnimationKey::new(4, true);
        key.set_value(2.5f32);
        assert_eq!(key.value(), &TrackValue::Float(2.5));
        let stored = serde_json::to_value(&key).unwrap();
        assert!(stored.get("b").is_none());
        assert_eq!(stored["f"], json!(2.5));
    }

    #[test]
    fn decode_without_value_fails() {
        let err = serde_json::from_value::<AnimationKey>(json!({ "frame": 7 })).unwrap_err();
        assert!(err.to_string().contains("no defined value"), "{err}");
    }

    #[test]
    fn decode_with_two_values_fails() {
        let err = serde_json::from_value::<AnimationKey>(json!({ "frame": 1, "b": true, "s": "x" }))
            .unwrap_err();
        assert!(err.to_string().contains("more than one value"), "{err}");
    }

    #[test]
    fn decode_applies_policy_defaults() {
        let key: AnimationKey = serde_json::from_value(json!({ "frame": 30, "s": "walk" })).unwrap();
        assert!(!key.maintain_value);
        assert_eq!(key.timing, TimingInterpolation::Linear);
        assert!((key.time() - 0.5).abs() < 1e-6);
    }
}
