//! Runtime instances: per-element override slots and whole-asset playback.

pub mod asset_instance;
pub mod element_instance;
pub mod overridable;

pub use asset_instance::AssetInstance;
pub use element_instance::{ElementInstance, InstanceState, ReferenceState, SpriteState};
pub use overridable::Overridable;
