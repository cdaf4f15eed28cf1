//! Track type registry: the process-wide table of animatable property names.
//!
//! The global registry is built on first use with the builtin types already
//! registered. It is append-only; there is no removal.

use std::sync::{PoisonError, RwLock};

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::value::ValueKind;

/// Builtin property names.
pub mod names {
    pub const VISIBLE: &str = "visible";
    pub const OFFSET_X: &str = "offset.x";
    pub const OFFSET_Y: &str = "offset.y";
    pub const OFFSET_Z: &str = "offset.z";
    pub const SPRITE: &str = "sprite";
    pub const ANCHOR_X: &str = "anchor.x";
    pub const ANCHOR_Y: &str = "anchor.y";
    pub const COLOR: &str = "color";
    pub const COLOR_BLEND: &str = "colorBlend";
    pub const VOLUME_OFFSET_X: &str = "volumeOffset.x";
    pub const VOLUME_OFFSET_Y: &str = "volumeOffset.y";
    pub const VOLUME_OFFSET_Z: &str = "volumeOffset.z";
    pub const VOLUME_SIZE_X: &str = "volumeSize.x";
    pub const VOLUME_SIZE_Y: &str = "volumeSize.y";
    pub const VOLUME_SIZE_Z: &str = "volumeSize.z";
    pub const ANIMATION_STATE: &str = "animationState";
}

/// Metadata for one animatable property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackType {
    pub name: String,
    pub display_name: String,
    pub value_kind: ValueKind,
}

impl TrackType {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        value_kind: ValueKind,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            value_kind,
        }
    }
}

const BUILTINS: &[(&str, &str, ValueKind)] = &[
    (names::VISIBLE, "Visible", ValueKind::Bool),
    (names::OFFSET_X, "Offset X", ValueKind::Float),
    (names::OFFSET_Y, "Offset Y", ValueKind::Float),
    (names::OFFSET_Z, "Offset Z", ValueKind::Float),
    (names::SPRITE, "Sprite", ValueKind::String),
    (names::ANCHOR_X, "Anchor X", ValueKind::Float),
    (names::ANCHOR_Y, "Anchor Y", ValueKind::Float),
    (names::COLOR, "Color", ValueKind::Color),
    (names::COLOR_BLEND, "Color Blend", ValueKind::Float),
    (names::VOLUME_OFFSET_X, "Volume Offset X", ValueKind::Float),
    (names::VOLUME_OFFSET_Y, "Volume Offset Y", ValueKind::Float),
    (names::VOLUME_OFFSET_Z, "Volume Offset Z", ValueKind::Float),
    (names::VOLUME_SIZE_X, "Volume Size X", ValueKind::Float),
    (names::VOLUME_SIZE_Y, "Volume Size Y", ValueKind::Float),
    (names::VOLUME_SIZE_Z, "Volume Size Z", ValueKind::Float),
    (names::ANIMATION_STATE, "Animation State", ValueKind::String),
];

static GLOBAL: Lazy<TrackTypeRegistry> = Lazy::new(TrackTypeRegistry::with_builtins);

/// Name-keyed table of [`TrackType`]s.
#[derive(Debug, Default)]
pub struct TrackTypeRegistry {
    types: RwLock<HashMap<String, TrackType>>,
}

impl TrackTypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the builtin property types.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut types = registry.types.write().unwrap_or_else(PoisonError::into_inner);
            for (name, display, kind) in BUILTINS {
                types.insert((*name).to_string(), TrackType::new(*name, *display, *kind));
            }
        }
        log::debug!("registered {} builtin track types", BUILTINS.len());
        registry
    }

    /// The process-wide registry.
    pub fn global() -> &'static TrackTypeRegistry {
        &GLOBAL
    }

    /// Add a new type. Fails if the name is already taken.
    pub fn register(&self, track_type: TrackType) -> Result<(), AssetError> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if types.contains_key(&track_type.name) {
            return Err(AssetError::AlreadyRegistered {
                name: track_type.name,
            });
        }
        log::debug!("registered track type '{}'", track_type.name);
        types.insert(track_type.name.clone(), track_type);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<TrackType, AssetError> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::UnknownTrackType {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicates() {
        let reg = TrackTypeRegistry::new();
        reg.register(TrackType::new("glow", "Glow", ValueKind::Float))
            .unwrap();
        let err = reg
            .register(TrackType::new("glow", "Glow again", ValueKind::Bool))
            .unwrap_err();
        assert_eq!(err, AssetError::AlreadyRegistered { name: "glow".into() });
        assert_eq!(reg.lookup("glow").unwrap().value_kind, ValueKind::Float);
    }

    #[test]
    fn lookup_unknown_fails() {
        let reg = TrackTypeRegistry::new();
        assert!(matches!(
            reg.lookup("nope"),
            Err(AssetError::UnknownTrackType { .. })
        ));
    }

    #[test]
    fn global_has_builtins() {
        let reg = TrackTypeRegistry::global();
        assert_eq!(reg.lookup(names::COLOR).unwrap().value_kind, ValueKind::Color);
        assert!(reg.contains(names::ANIMATION_STATE));
        assert!(matches!(
            reg.register(TrackType::new(names::VISIBLE, "Visible", ValueKind::Bool)),
            Err(AssetError::AlreadyRegistered { .. })
        ));
    }
}
