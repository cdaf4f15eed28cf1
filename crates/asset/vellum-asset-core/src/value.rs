//! Typed values carried by animation keys and element properties.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    Bool,
    Float,
    Color,
    String,
}

impl ValueKind {
    /// Discrete kinds only ever hold between keys.
    #[inline]
    pub fn is_discrete(self) -> bool {
        matches!(self, ValueKind::Bool | ValueKind::String)
    }
}

/// RGB encoding a [`Color`]'s components are expressed in.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    #[default]
    #[serde(rename = "sRGB")]
    Srgb,
    #[serde(rename = "linearSRGB")]
    LinearSrgb,
}

/// RGBA color tagged with its color space. Components are nominally in `[0, 1]`.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Color {
    #[serde(default)]
    pub space: ColorSpace,
    pub components: [f32; 4],
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

impl Color {
    pub const WHITE: Color = Color {
        space: ColorSpace::Srgb,
        components: [1.0, 1.0, 1.0, 1.0],
    };

    #[inline]
    pub fn srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            space: ColorSpace::Srgb,
            components: [r, g, b, a],
        }
    }

    #[inline]
    pub fn linear(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            space: ColorSpace::LinearSrgb,
            components: [r, g, b, a],
        }
    }

    /// Re-express this color in `space`. Alpha is left as is.
    pub fn to_space(self, space: ColorSpace) -> Color {
        if self.space == space {
            return self;
        }
        let [r, g, b, a] = self.components;
        let convert: fn(f32) -> f32 = match space {
            ColorSpace::LinearSrgb => srgb_to_linear,
            ColorSpace::Srgb => linear_to_srgb,
        };
        Color {
            space,
            components: [convert(r), convert(g), convert(b), a],
        }
    }
}

/// A locator naming another resource (sprite frame or asset description).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetLocator(pub String);

impl AssetLocator {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetLocator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The single value held by an animation key or read from a property.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackValue {
    Bool(bool),
    Float(f32),
    Color(Color),
    String(String),
}

impl TrackValue {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            TrackValue::Bool(_) => ValueKind::Bool,
            TrackValue::Float(_) => ValueKind::Float,
            TrackValue::Color(_) => ValueKind::Color,
            TrackValue::String(_) => ValueKind::String,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TrackValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            TrackValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            TrackValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TrackValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for TrackValue {
    fn from(v: bool) -> Self {
        TrackValue::Bool(v)
    }
}

impl From<f32> for TrackValue {
    fn from(v: f32) -> Self {
        TrackValue::Float(v)
    }
}

impl From<Color> for TrackValue {
    fn from(v: Color) -> Self {
        TrackValue::Color(v)
    }
}

impl From<&str> for TrackValue {
    fn from(v: &str) -> Self {
        TrackValue::String(v.to_string())
    }
}

impl From<String> for TrackValue {
    fn from(v: String) -> Self {
        TrackValue::String(v)
    }
}
