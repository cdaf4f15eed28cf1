//! Vellum asset core (host-agnostic)
//!
//! Authored asset descriptions (element trees plus keyframe clips), the track
//! type registry, and runtime instances that evaluate clips into overrides and
//! push the results to a host scene layer through [`NodeHost`].

pub mod animation;
pub mod config;
pub mod database;
pub mod description;
pub mod element;
pub mod error;
pub mod ids;
pub mod instance;
pub mod interp;
pub mod node;
pub mod schedule;
pub mod track_type;
pub mod tree;
pub mod value;

// Re-exports for hosts and tools
pub use animation::{AnimationKey, AnimationTrack, AssetAnimation, TrackKey};
pub use config::{frame_to_seconds, seconds_to_frame, Config, FRAMES_PER_SECOND};
pub use database::{AssetDatabase, AssetResolver};
pub use description::{AssetDescription, Footprint};
pub use element::{
    AssetElement, CombinedGroup, ElementKind, ElementType, ReferenceProperties, SpriteProperties,
};
pub use error::{AssetError, ErrorCategory};
pub use ids::{AssetId, ElementId, NodeId};
pub use instance::{AssetInstance, ElementInstance, Overridable};
pub use interp::TimingInterpolation;
pub use node::{NodeAttributes, NodeCommand, NodeCommandBuffer, NodeHost, NullHost};
pub use schedule::{CombinedSchedule, ElementTimeline, ScheduleStep, TrackSchedule};
pub use track_type::{names, TrackType, TrackTypeRegistry};
pub use tree::ElementTree;
pub use value::{AssetLocator, Color, ColorSpace, TrackValue, ValueKind};
