//! Runtime mirror of one authored element.

use std::sync::Arc;

use crate::description::AssetDescription;
use crate::element::{axis, AssetElement, ElementKind, ElementType};
use crate::error::AssetError;
use crate::ids::{ElementId, NodeId};
use crate::instance::asset_instance::AssetInstance;
use crate::instance::overridable::Overridable;
use crate::node::NodeAttributes;
use crate::track_type::names;
use crate::value::{AssetLocator, Color, TrackValue, ValueKind};

#[derive(Debug)]
pub struct SpriteState {
    pub volume_offset: Overridable<[f32; 3]>,
    pub volume_size: Overridable<[f32; 3]>,
    pub sprite: Overridable<Option<AssetLocator>>,
    pub anchor: Overridable<[f32; 2]>,
    pub color: Overridable<Color>,
    pub color_blend: Overridable<f32>,
}

#[derive(Debug)]
pub struct ReferenceState {
    pub target: Option<AssetLocator>,
    pub animation_state: Overridable<Option<String>>,
    /// Description the nested instance was built from.
    pub(crate) resolved: Option<Arc<AssetDescription>>,
    pub(crate) nested: Option<Box<AssetInstance>>,
}

#[derive(Debug)]
pub enum InstanceState {
    Transform,
    Sprite(SpriteState),
    Reference(ReferenceState),
}

/// Current-value slots for one element plus its links in the instance tree.
#[derive(Debug)]
pub struct ElementInstance {
    element: ElementId,
    element_type: ElementType,
    node: NodeId,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub visibility: Overridable<bool>,
    pub offset: Overridable<[f32; 3]>,
    pub flipped: bool,
    pub state: InstanceState,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl ElementInstance {
    pub(crate) fn new(element: &AssetElement, node: NodeId) -> Self {
        let state = match &element.kind {
            ElementKind::Transform => InstanceState::Transform,
            ElementKind::Sprite(s) => InstanceState::Sprite(SpriteState {
                volume_offset: Overridable::new(s.volume_offset),
                volume_size: Overridable::new(s.volume_size),
                sprite: Overridable::new(s.sprite.clone()),
                anchor: Overridable::new(s.anchor_point),
                color: Overridable::new(s.color),
                color_blend: Overridable::new(s.color_blend),
            }),
            ElementKind::Reference(r) => InstanceState::Reference(ReferenceState {
                target: r.asset.clone(),
                animation_state: Overridable::new(r.animation_state_name.clone()),
                resolved: None,
                nested: None,
            }),
        };
        Self {
            element: element.id(),
            element_type: element.element_type(),
            node,
            parent: element.parent(),
            children: Vec::new(),
            visibility: Overridable::new(element.visible),
            offset: Overridable::new(element.world_offset),
            flipped: element.horizontally_flipped,
            state,
        }
    }

    #[inline]
    pub fn element_id(&self) -> ElementId {
        self.element
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn as_sprite(&self) -> Option<&SpriteState> {
        match &self.state {
            InstanceState::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceState> {
        match &self.state {
            InstanceState::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn as_reference_mut(&mut self) -> Option<&mut ReferenceState> {
        match &mut self.state {
            InstanceState::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Nested instance built for a reference element.
    pub fn nested(&self) -> Option<&AssetInstance> {
        self.as_reference().and_then(|r| r.nested.as_deref())
    }

    /// Drop every override so each slot reports its authored base again.
    pub fn apply_defaults(&mut self) {
        self.visibility.clear_override();
        self.offset.clear_override();
        match &mut self.state {
            InstanceState::Transform => {}
            InstanceState::Sprite(s) => {
                s.volume_offset.clear_override();
                s.volume_size.clear_override();
                s.sprite.clear_override();
                s.anchor.clear_override();
                s.color.clear_override();
                s.color_blend.clear_override();
            }
            InstanceState::Reference(r) => r.animation_state.clear_override(),
        }
    }

    /// True when any slot currently carries an override.
    pub fn has_overrides(&self) -> bool {
        let own = self.visibility.is_overridden() || self.offset.is_overridden();
        own || match &self.state {
            InstanceState::Transform => false,
            InstanceState::Sprite(s) => {
                s.volume_offset.is_overridden()
                    || s.volume_size.is_overridden()
                    || s.sprite.is_overridden()
                    || s.anchor.is_overridden()
                    || s.color.is_overridden()
                    || s.color_blend.is_overridden()
            }
            InstanceState::Reference(r) => r.animation_state.is_overridden(),
        }
    }

    /// Effective value of `property`, or `None` if this kind lacks it.
    pub fn current_value(&self, property: &str) -> Option<TrackValue> {
        match property {
            names::VISIBLE => return Some(TrackValue::Bool(self.visibility.value())),
            names::OFFSET_X | names::OFFSET_Y | names::OFFSET_Z => {
                return axis(property).map(|i| TrackValue::Float(self.offset.get()[i]))
            }
            _ => {}
        }
        match &self.state {
            InstanceState::Transform => None,
            InstanceState::Sprite(s) => match property {
                names::SPRITE => Some(TrackValue::String(
                    s.sprite.get().as_ref().map(|l| l.0.clone()).unwrap_or_default(),
                )),
                names::ANCHOR_X => Some(TrackValue::Float(s.anchor.get()[0])),
                names::ANCHOR_Y => Some(TrackValue::Float(s.anchor.get()[1])),
                names::COLOR => Some(TrackValue::Color(s.color.value())),
                names::COLOR_BLEND => Some(TrackValue::Float(s.color_blend.value())),
                names::VOLUME_OFFSET_X | names::VOLUME_OFFSET_Y | names::VOLUME_OFFSET_Z => {
                    axis(property).map(|i| TrackValue::Float(s.volume_offset.get()[i]))
                }
                names::VOLUME_SIZE_X | names::VOLUME_SIZE_Y | names::VOLUME_SIZE_Z => {
                    axis(property).map(|i| TrackValue::Float(s.volume_size.get()[i]))
                }
                _ => None,
            },
            InstanceState::Reference(r) => match property {
                names::ANIMATION_STATE => Some(TrackValue::String(
                    r.animation_state.get().clone().unwrap_or_default(),
                )),
                _ => None,
            },
        }
    }

    fn check(&self, property: &str, value: &TrackValue) -> Result<(), AssetError> {
        if !self.element_type.is_eligible(property) {
            return Err(AssetError::IneligibleTrack {
                property: property.to_string(),
                element_type: self.element_type.as_str().to_string(),
            });
        }
        let expected = match property {
            names::VISIBLE => ValueKind::Bool,
            names::SPRITE | names::ANIMATION_STATE => ValueKind::String,
            names::COLOR => ValueKind::Color,
            _ => ValueKind::Float,
        };
        if value.kind() != expected {
            return Err(AssetError::TypeMismatch {
                property: property.to_string(),
                expected,
                actual: value.kind(),
            });
        }
        Ok(())
    }

    /// Override one property with `value`.
    pub fn set_override(&mut self, property: &str, value: TrackValue) -> Result<(), AssetError> {
        self.check(property, &value)?;
        self.write_override(property, value);
        Ok(())
    }

    /// Override several properties at once. Either all values are applied or,
    /// if any is rejected, none are.
    pub fn set_overrides(&mut self, values: &[(&str, TrackValue)]) -> Result<(), AssetError> {
        for (property, value) in values {
            self.check(property, value)?;
        }
        for (property, value) in values {
            self.write_override(property, value.clone());
        }
        Ok(())
    }

    // Callers have validated eligibility and kind.
    fn write_override(&mut self, property: &str, value: TrackValue) {
        fn set_axis<const N: usize>(slot: &mut Overridable<[f32; N]>, i: usize, v: f32) {
            let mut current = *slot.get();
            if i < N {
                current[i] = v;
            }
            slot.set_override(current);
        }

        match (property, value) {
            (names::VISIBLE, TrackValue::Bool(b)) => self.visibility.set_override(b),
            (names::OFFSET_X | names::OFFSET_Y | names::OFFSET_Z, TrackValue::Float(f)) => {
                set_axis(&mut self.offset, axis(property).unwrap_or(usize::MAX), f)
            }
            (names::ANIMATION_STATE, TrackValue::String(s)) => {
                if let InstanceState::Reference(r) = &mut self.state {
                    r.animation_state.set_override(non_empty(&s));
                }
            }
            (prop, value) => {
                let InstanceState::Sprite(s) = &mut self.state else {
                    return;
                };
                let i = axis(prop).unwrap_or(usize::MAX);
                match (prop, value) {
                    (names::SPRITE, TrackValue::String(v)) => {
                        s.sprite.set_override(non_empty(&v).map(AssetLocator))
                    }
                    (names::COLOR, TrackValue::Color(c)) => s.color.set_override(c),
                    (names::COLOR_BLEND, TrackValue::Float(f)) => s.color_blend.set_override(f),
                    (names::ANCHOR_X | names::ANCHOR_Y, TrackValue::Float(f)) => {
                        set_axis(&mut s.anchor, i, f)
                    }
                    (
                        names::VOLUME_OFFSET_X | names::VOLUME_OFFSET_Y | names::VOLUME_OFFSET_Z,
                        TrackValue::Float(f),
                    ) => set_axis(&mut s.volume_offset, i, f),
                    (
                        names::VOLUME_SIZE_X | names::VOLUME_SIZE_Y | names::VOLUME_SIZE_Z,
                        TrackValue::Float(f),
                    ) => set_axis(&mut s.volume_size, i, f),
                    _ => {}
                }
            }
        }
    }

    /// Display attributes given this instance's resolved absolute position and flip.
    pub fn attributes(&self, position: [f32; 3], flipped: bool) -> NodeAttributes {
        let mut attrs = NodeAttributes {
            position,
            visible: self.visibility.value(),
            flipped,
            sprite: None,
            anchor: [0.5, 0.5],
            color: Color::WHITE,
            color_blend: 0.0,
            volume_offset: position,
            volume_size: [0.0; 3],
        };
        if let InstanceState::Sprite(s) = &self.state {
            let vo = s.volume_offset.value();
            attrs.sprite = s.sprite.get().clone();
            attrs.anchor = s.anchor.value();
            attrs.color = s.color.value();
            attrs.color_blend = s.color_blend.value();
            attrs.volume_offset = [position[0] + vo[0], position[1] + vo[1], position[2] + vo[2]];
            attrs.volume_size = s.volume_size.value();
        }
        attrs
    }
}
