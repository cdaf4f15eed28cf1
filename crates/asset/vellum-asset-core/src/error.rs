//! Error types for asset loading, editing and instancing.

use crate::ids::ElementId;
use crate::value::ValueKind;

/// Coarse classification of an [`AssetError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or unregistered data; aborts the load of the offending asset.
    Schema,
    /// Editing or instancing precondition failed.
    Structural,
    /// A value of the wrong kind was offered for a property.
    Type,
}

/// Errors produced by the asset runtime.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AssetError {
    #[error("track type '{name}' is already registered")]
    AlreadyRegistered { name: String },

    #[error("unknown track type '{name}'")]
    UnknownTrackType { name: String },

    #[error("animation key at frame {frame} has no defined value")]
    NoDefinedValue { frame: u32 },

    #[error("animation key at frame {frame} defines more than one value")]
    AmbiguousValue { frame: u32 },

    #[error("malformed track key '{key}'")]
    MalformedTrackKey { key: String },

    #[error("track '{property}' already has a key at frame {frame}")]
    DuplicateKeyFrame { property: String, frame: u32 },

    #[error("element {id} is already present")]
    DuplicateElement { id: ElementId },

    #[error("unknown element {id}")]
    UnknownElement { id: ElementId },

    #[error("unknown parent element {id}")]
    UnknownParent { id: ElementId },

    #[error("the root element cannot be removed or moved")]
    RootElement,

    #[error("moving element {id} under {parent} would create a cycle")]
    CyclicHierarchy { id: ElementId, parent: ElementId },

    #[error("unknown animation '{name}'")]
    UnknownAnimation { name: String },

    #[error("animation '{name}' already exists")]
    DuplicateAnimation { name: String },

    #[error("value type mismatch for '{property}': expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("'{property}' is not animatable on {element_type} elements")]
    IneligibleTrack {
        property: String,
        element_type: String,
    },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl AssetError {
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyRegistered { .. }
            | Self::UnknownTrackType { .. }
            | Self::NoDefinedValue { .. }
            | Self::AmbiguousValue { .. }
            | Self::MalformedTrackKey { .. }
            | Self::Serialization { .. } => ErrorCategory::Schema,
            Self::DuplicateKeyFrame { .. }
            | Self::DuplicateElement { .. }
            | Self::UnknownElement { .. }
            | Self::UnknownParent { .. }
            | Self::RootElement
            | Self::CyclicHierarchy { .. }
            | Self::UnknownAnimation { .. }
            | Self::DuplicateAnimation { .. } => ErrorCategory::Structural,
            Self::TypeMismatch { .. } | Self::IneligibleTrack { .. } => ErrorCategory::Type,
        }
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
