//! Color-scale quantization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Token emitted for cells and points without a usable value.
pub const MISSING_COLOR: &str = "missing";

/// Named palettes, ordered from low to high values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPalette {
    /// Blue to red
    #[default]
    Thermal,
    /// Deep to light blue
    Ocean,
    /// Purple gradient
    Viridis,
}

impl ColorPalette {
    /// The palette's color tokens, lowest value first.
    pub fn colors(&self) -> &'static [&'static str] {
        match self {
            ColorPalette::Thermal => &[
                "#1e3a8a", "#3b82f6", "#06b6d4", "#10b981", "#f97316", "#dc2626",
            ],
            ColorPalette::Ocean => &[
                "#0c4a6e", "#0284c7", "#0ea5e9", "#38bdf8", "#7dd3fc", "#bae6fd",
            ],
            ColorPalette::Viridis => &[
                "#581c87", "#7c3aed", "#8b5cf6", "#a78bfa", "#c4b5fd", "#ddd6fe",
            ],
        }
    }
}

impl fmt::Display for ColorPalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorPalette::Thermal => write!(f, "Thermal"),
            ColorPalette::Ocean => write!(f, "Ocean"),
            ColorPalette::Viridis => write!(f, "Viridis"),
        }
    }
}

/// A quantized color: a palette entry, or the reserved missing token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColorToken {
    Color(String),
    Missing,
}

impl ColorToken {
    pub fn is_missing(&self) -> bool {
        matches!(self, ColorToken::Missing)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColorToken::Color(c) => c,
            ColorToken::Missing => MISSING_COLOR,
        }
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ColorToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColorToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == MISSING_COLOR {
            ColorToken::Missing
        } else {
            ColorToken::Color(raw)
        })
    }
}

/// Palette slot for `value` on a scale of `len` entries.
///
/// `None` for a missing or non-finite value, non-finite bounds, or an
/// empty palette. A collapsed scale (`max <= min`) maps everything to the
/// first slot.
pub fn quantize_index(value: Option<f64>, min: f64, max: f64, len: usize) -> Option<usize> {
    let value = value.filter(|v| v.is_finite())?;
    if len == 0 || !min.is_finite() || !max.is_finite() {
        return None;
    }

    let span = max - min;
    let ratio = if span > 0.0 {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // ratio == 1.0 would land one past the end
    Some(((ratio * len as f64).floor() as usize).min(len - 1))
}

/// Maps a value to a palette color, or [`ColorToken::Missing`].
pub fn quantize_to_color_scale<S: AsRef<str>>(
    value: Option<f64>,
    min: f64,
    max: f64,
    palette: &[S],
) -> ColorToken {
    match quantize_index(value, min, max, palette.len()) {
        Some(index) => ColorToken::Color(palette[index].as_ref().to_string()),
        None => ColorToken::Missing,
    }
}
