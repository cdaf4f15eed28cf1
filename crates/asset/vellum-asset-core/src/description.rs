//! Asset description: the authored element tree plus its named clips.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::animation::{AnimationKey, AssetAnimation, RawClip};
use crate::element::AssetElement;
use crate::error::AssetError;
use crate::ids::{AssetId, ElementId};
use crate::track_type::TrackTypeRegistry;
use crate::tree::{ElementDoc, ElementTree};

/// Occupied map-tile extent `[width, height]`.
pub type Footprint = [u32; 2];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescription", into = "RawDescription")]
pub struct AssetDescription {
    pub id: AssetId,
    pub name: String,
    pub footprint: Footprint,
    elements: ElementTree,
    animations: BTreeMap<String, AssetAnimation>,
}

fn default_footprint() -> Footprint {
    [1, 1]
}

impl AssetDescription {
    pub fn new(name: impl Into<String>, root: AssetElement) -> Self {
        Self {
            id: AssetId::new(),
            name: name.into(),
            footprint: default_footprint(),
            elements: ElementTree::new(root),
            animations: BTreeMap::new(),
        }
    }

    /// Parse and validate against the global track type registry.
    ///
    /// The document is decoded into its storage form first, so key, track and
    /// tree errors reach the caller as their own variants.
    pub fn from_json(s: &str) -> Result<Self, AssetError> {
        let raw: RawDescription = serde_json::from_str(s)?;
        let description = AssetDescription::try_from(raw)?;
        description.validate(TrackTypeRegistry::global())?;
        log::debug!(
            "loaded asset '{}' ({} elements, {} animations)",
            description.name,
            description.elements.len(),
            description.animations.len()
        );
        Ok(description)
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every track against the registry and the element tree: the
    /// property must be registered and eligible for the element's kind, the
    /// element must exist, and keys must carry the registered value kind.
    pub fn validate(&self, registry: &TrackTypeRegistry) -> Result<(), AssetError> {
        for clip in self.animations.values() {
            for (key, track) in clip.tracks() {
                let track_type = registry.lookup(&key.property)?;
                let element = self
                    .elements
                    .get(key.element)
                    .ok_or(AssetError::UnknownElement { id: key.element })?;
                let element_type = element.element_type();
                if !element_type.is_eligible(&key.property) {
                    return Err(AssetError::IneligibleTrack {
                        property: key.property.clone(),
                        element_type: element_type.as_str().to_string(),
                    });
                }
                if let Some(actual) = track.value_kind() {
                    if actual != track_type.value_kind {
                        return Err(AssetError::TypeMismatch {
                            property: key.property.clone(),
                            expected: track_type.value_kind,
                            actual,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    // ----- elements -----

    #[inline]
    pub fn elements(&self) -> &ElementTree {
        &self.elements
    }

    #[inline]
    pub fn root_id(&self) -> ElementId {
        self.elements.root_id()
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> Option<&AssetElement> {
        self.elements.get(id)
    }

    /// Mutable access to an element's authored fields. Tree links are not
    /// reachable through it.
    #[inline]
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut AssetElement> {
        self.elements.get_mut(id)
    }

    pub fn add_element(
        &mut self,
        parent: ElementId,
        element: AssetElement,
    ) -> Result<ElementId, AssetError> {
        self.elements.insert(parent, element)
    }

    /// Remove an element and its subtree, purging every track keyed to any
    /// removed id from every clip.
    pub fn remove_element(&mut self, id: ElementId) -> Result<Vec<AssetElement>, AssetError> {
        let removed = self.elements.remove(id)?;
        let mut purged = 0;
        for clip in self.animations.values_mut() {
            for e in &removed {
                purged += clip.remove_element_tracks(e.id());
            }
        }
        log::debug!(
            "removed {} element(s) from '{}', purged {purged} track(s)",
            removed.len(),
            self.name
        );
        Ok(removed)
    }

    pub fn move_element(
        &mut self,
        id: ElementId,
        new_parent: ElementId,
        index: usize,
    ) -> Result<(), AssetError> {
        self.elements.reparent(id, new_parent, index)
    }

    /// Copy the subtree at `id` with fresh ids, placed right after the
    /// original under the same parent. Tracks of every copied element are
    /// duplicated onto its copy in every clip. Returns the copy's root id.
    pub fn duplicate_element(&mut self, id: ElementId) -> Result<ElementId, AssetError> {
        let parent = self.elements.parent(id).ok_or(AssetError::RootElement)?;
        let (copies, mapping) = self.elements.clone_subtree(id)?;
        let index = self
            .elements
            .children(parent)
            .iter()
            .position(|c| *c == id)
            .map(|i| i + 1)
            .unwrap_or(usize::MAX);

        let mut copy_root = None;
        for copy in copies {
            let copy_parent = match copy.parent() {
                Some(p) => p,
                None => parent,
            };
            let at = if copy_root.is_none() {
                index
            } else {
                usize::MAX
            };
            let new_id = self.elements.insert_at(copy_parent, at, copy)?;
            copy_root.get_or_insert(new_id);
        }
        for clip in self.animations.values_mut() {
            for (old, new) in &mapping {
                clip.copy_element_tracks(*old, *new);
            }
        }
        copy_root.ok_or(AssetError::UnknownElement { id })
    }

    /// Give an element a fresh id. Clip tracks still reference the old id;
    /// follow with [`remap_element_ids`](Self::remap_element_ids).
    pub fn renew_element_id(&mut self, id: ElementId) -> Result<ElementId, AssetError> {
        self.elements.renew_id(id)
    }

    /// Rekey every track in every clip according to `mapping`.
    pub fn remap_element_ids(&mut self, mapping: &HashMap<ElementId, ElementId>) {
        for clip in self.animations.values_mut() {
            clip.remap_element_ids(mapping);
        }
    }

    // ----- animations -----

    pub fn animation(&self, name: &str) -> Option<&AssetAnimation> {
        self.animations.get(name)
    }

    pub fn animation_mut(&mut self, name: &str) -> Option<&mut AssetAnimation> {
        self.animations.get_mut(name)
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn animations(&self) -> impl Iterator<Item = (&str, &AssetAnimation)> {
        self.animations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace a clip, returning the previous clip of that name.
    pub fn add_animation(
        &mut self,
        name: impl Into<String>,
        animation: AssetAnimation,
    ) -> Option<AssetAnimation> {
        self.animations.insert(name.into(), animation)
    }

    pub fn remove_animation(&mut self, name: &str) -> Option<AssetAnimation> {
        self.animations.remove(name)
    }

    pub fn rename_animation(&mut self, from: &str, to: &str) -> Result<(), AssetError> {
        if self.animations.contains_key(to) {
            return Err(AssetError::DuplicateAnimation {
                name: to.to_string(),
            });
        }
        let clip = self
            .animations
            .remove(from)
            .ok_or_else(|| AssetError::UnknownAnimation {
                name: from.to_string(),
            })?;
        self.animations.insert(to.to_string(), clip);
        Ok(())
    }

    /// Key `property` on `element` in clip `animation`, creating the clip if
    /// needed. The property must be registered, eligible for the element and
    /// the key's value must match the registered kind.
    pub fn set_key(
        &mut self,
        animation: &str,
        element: ElementId,
        property: &str,
        key: AnimationKey,
    ) -> Result<(), AssetError> {
        let track_type = TrackTypeRegistry::global().lookup(property)?;
        let target = self
            .elements
            .get(element)
            .ok_or(AssetError::UnknownElement { id: element })?;
        let element_type = target.element_type();
        if !element_type.is_eligible(property) {
            return Err(AssetError::IneligibleTrack {
                property: property.to_string(),
                element_type: element_type.as_str().to_string(),
            });
        }
        let actual = key.value().kind();
        if actual != track_type.value_kind {
            return Err(AssetError::TypeMismatch {
                property: property.to_string(),
                expected: track_type.value_kind,
                actual,
            });
        }
        self.animations
            .entry(animation.to_string())
            .or_default()
            .add_key(element, property, key)
    }
}

// ----- storage schema (serde) -----

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawDescription {
    uuid: AssetId,
    name: String,
    #[serde(default = "default_footprint")]
    footprint: Footprint,
    root: ElementDoc,
    #[serde(default)]
    animations: BTreeMap<String, RawClip>,
}

impl TryFrom<RawDescription> for AssetDescription {
    type Error = AssetError;

    fn try_from(raw: RawDescription) -> Result<Self, Self::Error> {
        let mut animations = BTreeMap::new();
        for (name, clip) in raw.animations {
            animations.insert(name, AssetAnimation::try_from(clip)?);
        }
        Ok(AssetDescription {
            id: raw.uuid,
            name: raw.name,
            footprint: raw.footprint,
            elements: ElementTree::try_from(raw.root)?,
            animations,
        })
    }
}

impl From<AssetDescription> for RawDescription {
    fn from(description: AssetDescription) -> Self {
        RawDescription {
            uuid: description.id,
            name: description.name,
            footprint: description.footprint,
            root: ElementDoc::from(description.elements),
            animations: description
                .animations
                .into_iter()
                .map(|(name, clip)| (name, RawClip::from(clip)))
                .collect(),
        }
    }
}
