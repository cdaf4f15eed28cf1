//! Named clip: tracks keyed by (element id, property).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::animation::key::AnimationKey;
use crate::animation::track::{AnimationTrack, RawTrack};
use crate::error::AssetError;
use crate::ids::ElementId;

/// Address of one track inside a clip. Stored as `"<elementId>:<property>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub element: ElementId,
    pub property: String,
}

impl TrackKey {
    pub fn new(element: ElementId, property: impl Into<String>) -> Self {
        Self {
            element,
            property: property.into(),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.element, self.property)
    }
}

impl FromStr for TrackKey {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AssetError::MalformedTrackKey { key: s.to_string() };
        let (element, property) = s.split_once(':').ok_or_else(malformed)?;
        if property.is_empty() {
            return Err(malformed());
        }
        let element = element.parse::<ElementId>().map_err(|_| malformed())?;
        Ok(TrackKey::new(element, property))
    }
}

/// A named animation: per-element, per-property keyframe tracks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClip", into = "RawClip")]
pub struct AssetAnimation {
    tracks: BTreeMap<TrackKey, AnimationTrack>,
    /// Derived: every element id with at least one track.
    referenced: BTreeSet<ElementId>,
}

impl AssetAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    fn recompute_referenced(&mut self) {
        self.referenced = self.tracks.keys().map(|k| k.element).collect();
    }

    /// Element ids touched by this clip.
    #[inline]
    pub fn referenced_element_ids(&self) -> &BTreeSet<ElementId> {
        &self.referenced
    }

    #[inline]
    pub fn touches(&self, element: ElementId) -> bool {
        self.referenced.contains(&element)
    }

    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&TrackKey, &AnimationTrack)> {
        self.tracks.iter()
    }

    /// All tracks keyed to `element`.
    pub fn tracks_for_element(
        &self,
        element: ElementId,
    ) -> impl Iterator<Item = &AnimationTrack> + '_ {
        self.tracks
            .iter()
            .filter(move |(k, _)| k.element == element)
            .map(|(_, t)| t)
    }

    pub fn track(&self, element: ElementId, property: &str) -> Option<&AnimationTrack> {
        self.tracks.get(&TrackKey::new(element, property))
    }

    pub fn track_mut(&mut self, element: ElementId, property: &str) -> Option<&mut AnimationTrack> {
        self.tracks.get_mut(&TrackKey::new(element, property))
    }

    /// Insert a track for `element`, replacing any existing one for the same property.
    pub fn insert_track(
        &mut self,
        element: ElementId,
        track: AnimationTrack,
    ) -> Option<AnimationTrack> {
        let key = TrackKey::new(element, track.property());
        let previous = self.tracks.insert(key, track);
        self.recompute_referenced();
        previous
    }

    /// Add a key to the (element, property) track, creating the track if needed.
    pub fn add_key(
        &mut self,
        element: ElementId,
        property: &str,
        key: AnimationKey,
    ) -> Result<(), AssetError> {
        let track_key = TrackKey::new(element, property);
        if let Some(track) = self.tracks.get_mut(&track_key) {
            return track.add_key(key);
        }
        let mut track = AnimationTrack::new(property);
        track.add_key(key)?;
        self.tracks.insert(track_key, track);
        self.recompute_referenced();
        Ok(())
    }

    pub fn remove_track(&mut self, element: ElementId, property: &str) -> Option<AnimationTrack> {
        let removed = self.tracks.remove(&TrackKey::new(element, property));
        if removed.is_some() {
            self.recompute_referenced();
        }
        removed
    }

    /// Drop every track keyed to `element`, returning how many were removed.
    pub fn remove_element_tracks(&mut self, element: ElementId) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|k, _| k.element != element);
        let removed = before - self.tracks.len();
        if removed > 0 {
            self.recompute_referenced();
        }
        removed
    }

    /// Rekey tracks whose element id appears in `mapping`. Key data is untouched.
    pub fn remap_element_ids(&mut self, mapping: &HashMap<ElementId, ElementId>) {
        if mapping.is_empty() {
            return;
        }
        let tracks = std::mem::take(&mut self.tracks);
        self.tracks = tracks
            .into_iter()
            .map(|(mut key, track)| {
                if let Some(new_id) = mapping.get(&key.element) {
                    key.element = *new_id;
                }
                (key, track)
            })
            .collect();
        self.recompute_referenced();
    }

    /// Copy every track of `from` onto `to`, replacing tracks `to` already had.
    pub fn copy_element_tracks(&mut self, from: ElementId, to: ElementId) -> usize {
        let copies: Vec<AnimationTrack> = self.tracks_for_element(from).cloned().collect();
        let copied = copies.len();
        for track in copies {
            self.tracks.insert(TrackKey::new(to, track.property()), track);
        }
        if copied > 0 {
            self.recompute_referenced();
        }
        copied
    }

    /// Last keyed frame across all tracks.
    pub fn last_frame(&self) -> Option<u32> {
        self.tracks.values().filter_map(|t| t.last_frame()).max()
    }
}

// ----- storage schema (serde) -----

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct RawClip {
    #[serde(default)]
    tracks: BTreeMap<String, RawTrack>,
}

impl TryFrom<RawClip> for AssetAnimation {
    type Error = AssetError;

    fn try_from(raw: RawClip) -> Result<Self, Self::Error> {
        let mut clip = AssetAnimation::new();
        for (key, raw_track) in raw.tracks {
            let track_key: TrackKey = key.parse()?;
            let mut track = AnimationTrack::try_from(raw_track)?;
            if track.property() != track_key.property {
                log::warn!(
                    "track '{key}' declares type '{}', using the key's property",
                    track.property()
                );
                track.set_property(track_key.property.clone());
            }
            clip.tracks.insert(track_key, track);
        }
        clip.recompute_referenced();
        Ok(clip)
    }
}

impl From<AssetAnimation> for RawClip {
    fn from(clip: AssetAnimation) -> Self {
        RawClip {
            tracks: clip
                .tracks
                .into_iter()
                .map(|(k, t)| (k.to_string(), RawTrack::from(t)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track_type::names;

    #[test]
    fn track_key_parses_display_form() {
        let key = TrackKey::new(ElementId::new(), names::OFFSET_X);
        let parsed: TrackKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn malformed_track_keys_rejected() {
        for bad in ["no-colon", "not-a-uuid:visible"] {
            assert!(matches!(
                bad.parse::<TrackKey>(),
                Err(AssetError::MalformedTrackKey { .. })
            ));
        }
        let dangling = format!("{}:", ElementId::new());
        assert!(dangling.parse::<TrackKey>().is_err());
    }

    #[test]
    fn referenced_ids_follow_track_edits() {
        let a = ElementId::new();
        let b = ElementId::new();
        let mut clip = AssetAnimation::new();
        clip.add_key(a, names::VISIBLE, AnimationKey::new(0, true)).unwrap();
        clip.add_key(b, names::OFFSET_X, AnimationKey::new(0, 1.0f32)).unwrap();
        clip.add_key(b, names::OFFSET_Y, AnimationKey::new(0, 1.0f32)).unwrap();
        assert_eq!(clip.referenced_element_ids().len(), 2);

        clip.remove_track(a, names::VISIBLE);
        assert!(!clip.touches(a));
        assert_eq!(clip.remove_element_tracks(b), 2);
        assert!(clip.referenced_element_ids().is_empty());
    }

    #[test]
    fn add_key_reports_duplicates() {
        let a = ElementId::new();
        let mut clip = AssetAnimation::new();
        clip.add_key(a, names::COLOR_BLEND, AnimationKey::new(3, 0.5f32)).unwrap();
        let err = clip
            .add_key(a, names::COLOR_BLEND, AnimationKey::new(3, 0.7f32))
            .unwrap_err();
        assert!(matches!(err, AssetError::DuplicateKeyFrame { frame: 3, .. }));
    }
}
