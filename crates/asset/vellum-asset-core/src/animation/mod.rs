//! Keyframe data model: keys, per-property tracks and named clips.

pub mod clip;
pub mod key;
pub mod track;

pub use clip::{AssetAnimation, TrackKey};
pub use key::AnimationKey;
pub use track::AnimationTrack;

pub(crate) use clip::RawClip;
