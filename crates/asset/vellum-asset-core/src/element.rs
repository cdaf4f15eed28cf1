//! Authored elements: shared base fields plus a per-kind payload.
//!
//! Property access is dispatched by `match` on the kind. Each kind declares
//! which properties may be keyed and which of those form combined groups
//! (axes that are resampled together).

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::ids::ElementId;
use crate::track_type::names;
use crate::value::{AssetLocator, Color, TrackValue, ValueKind};

/// Axes that must be resampled and applied together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombinedGroup {
    pub name: &'static str,
    pub axes: &'static [&'static str],
}

pub const OFFSET_GROUP: CombinedGroup = CombinedGroup {
    name: "offset",
    axes: &[names::OFFSET_X, names::OFFSET_Y, names::OFFSET_Z],
};

pub const ANCHOR_GROUP: CombinedGroup = CombinedGroup {
    name: "anchor",
    axes: &[names::ANCHOR_X, names::ANCHOR_Y],
};

pub const VOLUME_OFFSET_GROUP: CombinedGroup = CombinedGroup {
    name: "volumeOffset",
    axes: &[
        names::VOLUME_OFFSET_X,
        names::VOLUME_OFFSET_Y,
        names::VOLUME_OFFSET_Z,
    ],
};

pub const VOLUME_SIZE_GROUP: CombinedGroup = CombinedGroup {
    name: "volumeSize",
    axes: &[
        names::VOLUME_SIZE_X,
        names::VOLUME_SIZE_Y,
        names::VOLUME_SIZE_Z,
    ],
};

const BASE_TRACKS: &[&str] = &[
    names::VISIBLE,
    names::OFFSET_X,
    names::OFFSET_Y,
    names::OFFSET_Z,
];

const SPRITE_TRACKS: &[&str] = &[
    names::VISIBLE,
    names::OFFSET_X,
    names::OFFSET_Y,
    names::OFFSET_Z,
    names::SPRITE,
    names::ANCHOR_X,
    names::ANCHOR_Y,
    names::COLOR,
    names::COLOR_BLEND,
    names::VOLUME_OFFSET_X,
    names::VOLUME_OFFSET_Y,
    names::VOLUME_OFFSET_Z,
    names::VOLUME_SIZE_X,
    names::VOLUME_SIZE_Y,
    names::VOLUME_SIZE_Z,
];

const REFERENCE_TRACKS: &[&str] = &[
    names::VISIBLE,
    names::OFFSET_X,
    names::OFFSET_Y,
    names::OFFSET_Z,
    names::ANIMATION_STATE,
];

const BASE_GROUPS: &[CombinedGroup] = &[OFFSET_GROUP];
const SPRITE_GROUPS: &[CombinedGroup] =
    &[OFFSET_GROUP, ANCHOR_GROUP, VOLUME_OFFSET_GROUP, VOLUME_SIZE_GROUP];

/// Discriminant of [`ElementKind`], also the `"type"` tag in storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Transform,
    Sprite,
    Reference,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Transform => "transform",
            ElementType::Sprite => "sprite",
            ElementType::Reference => "reference",
        }
    }

    /// Properties an author may key on elements of this type.
    pub fn eligible_track_types(self) -> &'static [&'static str] {
        match self {
            ElementType::Transform => BASE_TRACKS,
            ElementType::Sprite => SPRITE_TRACKS,
            ElementType::Reference => REFERENCE_TRACKS,
        }
    }

    /// Combined groups among the eligible properties.
    pub fn combined_groups(self) -> &'static [CombinedGroup] {
        match self {
            ElementType::Transform | ElementType::Reference => BASE_GROUPS,
            ElementType::Sprite => SPRITE_GROUPS,
        }
    }

    pub fn is_eligible(self, property: &str) -> bool {
        self.eligible_track_types().contains(&property)
    }

    /// The combined group `property` belongs to, if any.
    pub fn combined_group_of(self, property: &str) -> Option<&'static CombinedGroup> {
        self.combined_groups()
            .iter()
            .find(|g| g.axes.contains(&property))
    }
}

/// Sprite payload: render volume, sprite frame, anchor and tint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteProperties {
    #[serde(default, rename = "volumeWorldOffset")]
    pub volume_offset: [f32; 3],
    #[serde(default, rename = "volumeWorldSize")]
    pub volume_size: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<AssetLocator>,
    #[serde(default = "default_anchor")]
    pub anchor_point: [f32; 2],
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub color_blend: f32,
}

fn default_anchor() -> [f32; 2] {
    [0.5, 0.5]
}

impl Default for SpriteProperties {
    fn default() -> Self {
        Self {
            volume_offset: [0.0; 3],
            volume_size: [0.0; 3],
            sprite: None,
            anchor_point: default_anchor(),
            color: Color::WHITE,
            color_blend: 0.0,
        }
    }
}

/// Reference payload: another asset description and the state to play in it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceProperties {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_state_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Transform,
    Sprite(SpriteProperties),
    Reference(ReferenceProperties),
}

/// One authored node. Parent/children links are maintained by the owning
/// [`ElementTree`](crate::tree::ElementTree).
#[derive(Clone, Debug, PartialEq)]
pub struct AssetElement {
    pub(crate) id: ElementId,
    pub name: String,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub visible: bool,
    pub world_offset: [f32; 3],
    pub horizontally_flipped: bool,
    pub kind: ElementKind,
}

fn string_or_empty(s: Option<&str>) -> TrackValue {
    TrackValue::String(s.unwrap_or_default().to_string())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub(crate) fn axis(property: &str) -> Option<usize> {
    match property.rsplit_once('.').map(|(_, a)| a) {
        Some("x") => Some(0),
        Some("y") => Some(1),
        Some("z") => Some(2),
        _ => None,
    }
}

impl AssetElement {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            name: name.into(),
            parent: None,
            children: Vec::new(),
            visible: true,
            world_offset: [0.0; 3],
            horizontally_flipped: false,
            kind,
        }
    }

    pub fn transform(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Transform)
    }

    pub fn sprite(name: impl Into<String>, props: SpriteProperties) -> Self {
        Self::new(name, ElementKind::Sprite(props))
    }

    pub fn reference(name: impl Into<String>, props: ReferenceProperties) -> Self {
        Self::new(name, ElementKind::Reference(props))
    }

    pub fn with_id(mut self, id: ElementId) -> Self {
        self.id = id;
        self
    }

    pub fn with_offset(mut self, offset: [f32; 3]) -> Self {
        self.world_offset = offset;
        self
    }

    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Assign a fresh id and return it. Tree links and clip tracks keyed by
    /// the old id are the caller's to remap.
    pub fn renew_id(&mut self) -> ElementId {
        self.id = ElementId::new();
        self.id
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Transform => ElementType::Transform,
            ElementKind::Sprite(_) => ElementType::Sprite,
            ElementKind::Reference(_) => ElementType::Reference,
        }
    }

    #[inline]
    pub fn eligible_track_types(&self) -> &'static [&'static str] {
        self.element_type().eligible_track_types()
    }

    #[inline]
    pub fn combined_groups(&self) -> &'static [CombinedGroup] {
        self.element_type().combined_groups()
    }

    pub fn as_sprite(&self) -> Option<&SpriteProperties> {
        match &self.kind {
            ElementKind::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceProperties> {
        match &self.kind {
            ElementKind::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Authored (static) value of `property`, or `None` if this kind lacks it.
    pub fn property_value(&self, property: &str) -> Option<TrackValue> {
        match property {
            names::VISIBLE => return Some(TrackValue::Bool(self.visible)),
            names::OFFSET_X | names::OFFSET_Y | names::OFFSET_Z => {
                return axis(property).map(|i| TrackValue::Float(self.world_offset[i]))
            }
            _ => {}
        }
        match &self.kind {
            ElementKind::Transform => None,
            ElementKind::Sprite(s) => match property {
                names::SPRITE => Some(string_or_empty(s.sprite.as_ref().map(|l| l.as_str()))),
                names::ANCHOR_X => Some(TrackValue::Float(s.anchor_point[0])),
                names::ANCHOR_Y => Some(TrackValue::Float(s.anchor_point[1])),
                names::COLOR => Some(TrackValue::Color(s.color)),
                names::COLOR_BLEND => Some(TrackValue::Float(s.color_blend)),
                names::VOLUME_OFFSET_X | names::VOLUME_OFFSET_Y | names::VOLUME_OFFSET_Z => {
                    axis(property).map(|i| TrackValue::Float(s.volume_offset[i]))
                }
                names::VOLUME_SIZE_X | names::VOLUME_SIZE_Y | names::VOLUME_SIZE_Z => {
                    axis(property).map(|i| TrackValue::Float(s.volume_size[i]))
                }
                _ => None,
            },
            ElementKind::Reference(r) => match property {
                names::ANIMATION_STATE => Some(string_or_empty(r.animation_state_name.as_deref())),
                _ => None,
            },
        }
    }

    /// Set the authored value of an eligible property.
    pub fn set_property(&mut self, property: &str, value: TrackValue) -> Result<(), AssetError> {
        let element_type = self.element_type();
        if !element_type.is_eligible(property) {
            return Err(AssetError::IneligibleTrack {
                property: property.to_string(),
                element_type: element_type.as_str().to_string(),
            });
        }
        let mismatch = |expected: ValueKind, value: &TrackValue| AssetError::TypeMismatch {
            property: property.to_string(),
            expected,
            actual: value.kind(),
        };

        match (property, value) {
            (names::VISIBLE, TrackValue::Bool(b)) => self.visible = b,
            (names::VISIBLE, other) => return Err(mismatch(ValueKind::Bool, &other)),
            (names::OFFSET_X | names::OFFSET_Y | names::OFFSET_Z, TrackValue::Float(f)) => {
                if let Some(i) = axis(property) {
                    self.world_offset[i] = f;
                }
            }
            (names::ANIMATION_STATE, TrackValue::String(s)) => {
                if let ElementKind::Reference(r) = &mut self.kind {
                    r.animation_state_name = non_empty(s);
                }
            }
            (names::ANIMATION_STATE, other) => return Err(mismatch(ValueKind::String, &other)),
            (prop, value) => {
                let ElementKind::Sprite(s) = &mut self.kind else {
                    return Err(mismatch(ValueKind::Float, &value));
                };
                match (prop, value) {
                    (names::SPRITE, TrackValue::String(v)) => {
                        s.sprite = non_empty(v).map(AssetLocator)
                    }
                    (names::SPRITE, other) => return Err(mismatch(ValueKind::String, &other)),
                    (names::COLOR, TrackValue::Color(c)) => s.color = c,
                    (names::COLOR, other) => return Err(mismatch(ValueKind::Color, &other)),
                    (names::ANCHOR_X, TrackValue::Float(f)) => s.anchor_point[0] = f,
                    (names::ANCHOR_Y, TrackValue::Float(f)) => s.anchor_point[1] = f,
                    (names::COLOR_BLEND, TrackValue::Float(f)) => s.color_blend = f,
                    (
                        names::VOLUME_OFFSET_X | names::VOLUME_OFFSET_Y | names::VOLUME_OFFSET_Z,
                        TrackValue::Float(f),
                    ) => {
                        if let Some(i) = axis(prop) {
                            s.volume_offset[i] = f;
                        }
                    }
                    (
                        names::VOLUME_SIZE_X | names::VOLUME_SIZE_Y | names::VOLUME_SIZE_Z,
                        TrackValue::Float(f),
                    ) => {
                        if let Some(i) = axis(prop) {
                            s.volume_size[i] = f;
                        }
                    }
                    (_, other) => return Err(mismatch(ValueKind::Float, &other)),
                }
            }
        }
        Ok(())
    }
}
