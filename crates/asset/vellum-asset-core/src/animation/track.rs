//! Ordered key sequence for one (element, property) pair.
//!
//! Evaluation model (see [`AnimationTrack::sample`]):
//! - an exact key hit returns that key's value,
//! - before the first key the first value holds,
//! - after the last key, or after a `maintain_value` key, the left value holds,
//! - otherwise the left key's timing curve eases the segment ratio and the
//!   values are blended (bool/string hold left).

use serde::{Deserialize, Serialize};

use crate::animation::key::{AnimationKey, RawKey};
use crate::config::frame_to_seconds;
use crate::element::AssetElement;
use crate::error::AssetError;
use crate::interp::functions::interpolate_value;
use crate::schedule::TrackSchedule;
use crate::value::{TrackValue, ValueKind};

/// Keys for one property, sorted ascending by frame with no duplicate frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrack", into = "RawTrack")]
pub struct AnimationTrack {
    property: String,
    keys: Vec<AnimationKey>,
}

impl AnimationTrack {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            keys: Vec::new(),
        }
    }

    /// Build a track from keys in any order. Duplicate frames are rejected.
    pub fn with_keys(
        property: impl Into<String>,
        keys: impl IntoIterator<Item = AnimationKey>,
    ) -> Result<Self, AssetError> {
        let mut track = Self::new(property);
        for key in keys {
            track.add_key(key)?;
        }
        Ok(track)
    }

    #[inline]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[inline]
    pub fn keys(&self) -> &[AnimationKey] {
        &self.keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Kind of the values this track carries, if it has any keys.
    pub fn value_kind(&self) -> Option<ValueKind> {
        self.keys.first().map(|k| k.value().kind())
    }

    /// Frame of the last key.
    pub fn last_frame(&self) -> Option<u32> {
        self.keys.last().map(|k| k.frame)
    }

    /// Seconds from frame 0 to the last key.
    pub fn duration(&self) -> f32 {
        self.last_frame().map(frame_to_seconds).unwrap_or(0.0)
    }

    /// Insert a key, keeping frame order. A key already at that frame, or a
    /// value of a different kind than the existing keys, leaves the track
    /// unchanged and returns an error.
    pub fn add_key(&mut self, key: AnimationKey) -> Result<(), AssetError> {
        if let Some(expected) = self.value_kind() {
            let actual = key.value().kind();
            if actual != expected {
                return Err(AssetError::TypeMismatch {
                    property: self.property.clone(),
                    expected,
                    actual,
                });
            }
        }
        match self.keys.binary_search_by_key(&key.frame, |k| k.frame) {
            Ok(_) => Err(AssetError::DuplicateKeyFrame {
                property: self.property.clone(),
                frame: key.frame,
            }),
            Err(pos) => {
                self.keys.insert(pos, key);
                Ok(())
            }
        }
    }

    /// Insert or replace the key at `key.frame`, returning the replaced key.
    /// The new value must match the track's kind even when it replaces the
    /// only key.
    pub fn upsert_key(&mut self, key: AnimationKey) -> Result<Option<AnimationKey>, AssetError> {
        if let Some(expected) = self.value_kind() {
            let actual = key.value().kind();
            if actual != expected {
                return Err(AssetError::TypeMismatch {
                    property: self.property.clone(),
                    expected,
                    actual,
                });
            }
        }
        let replaced = self.remove_key(key.frame);
        if let Err(err) = self.add_key(key) {
            if let Some(old) = replaced {
                // Restore; the frame slot is free again so this cannot collide.
                let pos = self.keys.partition_point(|k| k.frame < old.frame);
                self.keys.insert(pos, old);
            }
            return Err(err);
        }
        Ok(replaced)
    }

    pub fn remove_key(&mut self, frame: u32) -> Option<AnimationKey> {
        let pos = self.keys.iter().position(|k| k.frame == frame)?;
        Some(self.keys.remove(pos))
    }

    #[inline]
    pub fn get_key(&self, frame: u32) -> Option<&AnimationKey> {
        self.keys.iter().find(|k| k.frame == frame)
    }

    #[inline]
    pub fn get_key_mut(&mut self, frame: u32) -> Option<&mut AnimationKey> {
        self.keys.iter_mut().find(|k| k.frame == frame)
    }

    /// First key strictly after `frame`.
    #[inline]
    pub fn next_key(&self, frame: u32) -> Option<&AnimationKey> {
        self.keys.iter().find(|k| k.frame > frame)
    }

    /// Last key strictly before `frame`.
    #[inline]
    pub fn prev_key(&self, frame: u32) -> Option<&AnimationKey> {
        self.keys.iter().rev().find(|k| k.frame < frame)
    }

    /// Evaluate the track at `frame`; `None` when the track has no keys.
    pub fn sample(&self, frame: u32) -> Option<TrackValue> {
        let first = self.keys.first()?;
        let next_idx = match self.keys.binary_search_by_key(&frame, |k| k.frame) {
            Ok(hit) => return Some(self.keys[hit].value().clone()),
            Err(idx) => idx,
        };
        if next_idx == 0 {
            return Some(first.value().clone());
        }
        let prev = &self.keys[next_idx - 1];
        if next_idx == self.keys.len() || prev.maintain_value {
            return Some(prev.value().clone());
        }
        let next = &self.keys[next_idx];
        let span = (next.frame - prev.frame) as f32;
        let ratio = ((frame - prev.frame) as f32 / span).clamp(0.0, 1.0);
        let eased = prev.timing.ease(ratio);
        Some(interpolate_value(prev.value(), next.value(), eased))
    }

    /// Evaluate at `frame`, falling back to the element's authored value for
    /// this property when the track has no keys.
    pub fn value_at(&self, frame: u32, element: &AssetElement) -> Option<TrackValue> {
        self.sample(frame)
            .or_else(|| element.property_value(&self.property))
    }

    /// Compile this track into a timed playback schedule filling `duration` seconds.
    pub fn compile_schedule(&self, duration: f32) -> TrackSchedule {
        TrackSchedule::compile(self, duration)
    }

    pub(crate) fn set_property(&mut self, property: impl Into<String>) {
        self.property = property.into();
    }
}

// ----- storage schema (serde) -----

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct RawTrack {
    #[serde(rename = "type")]
    property: String,
    #[serde(default)]
    keys: Vec<RawKey>,
}

impl TryFrom<RawTrack> for AnimationTrack {
    type Error = AssetError;

    fn try_from(raw: RawTrack) -> Result<Self, Self::Error> {
        let mut track = AnimationTrack::new(raw.property);
        for key in raw.keys {
            track.add_key(AnimationKey::try_from(key)?)?;
        }
        Ok(track)
    }
}

impl From<AnimationTrack> for RawTrack {
    fn from(track: AnimationTrack) -> Self {
        RawTrack {
            property: track.property,
            keys: track.keys.into_iter().map(RawKey::from).collect(),
        }
    }
}
