use std::fmt;
use std::str::FromStr;

use vello_cpu::peniko::{self, Compose, Mix};

use crate::foundation::error::{PhotoveilError, PhotoveilResult};

/// How an overlay mixes with the pixels below it.
///
/// This enum is the single source of truth for blend modes: the preview emits
/// [`BlendMode::css_name`] as `mix-blend-mode`, and the compositor pushes each layer with the
/// renderer mix of [`BlendMode::composite_operation`]. All tables are exhaustive matches, so a
/// mode cannot exist on one surface and be missing on the other.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Source over destination.
    Normal,
    /// Multiply.
    Multiply,
    /// Screen.
    #[default]
    Screen,
    /// Overlay.
    Overlay,
    /// Soft light.
    SoftLight,
    /// Hard light.
    HardLight,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// Hue of the source, saturation and luminosity of the backdrop.
    Hue,
    /// Saturation of the source.
    Saturation,
    /// Hue and saturation of the source.
    Color,
    /// Luminosity of the source.
    Luminosity,
}

/// Raster compositing operator, named after the 2D canvas `globalCompositeOperation` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeOperation {
    /// `source-over`.
    SourceOver,
    /// `multiply`.
    Multiply,
    /// `screen`.
    Screen,
    /// `overlay`.
    Overlay,
    /// `soft-light`.
    SoftLight,
    /// `hard-light`.
    HardLight,
    /// `color-dodge`.
    ColorDodge,
    /// `color-burn`.
    ColorBurn,
    /// `darken`.
    Darken,
    /// `lighten`.
    Lighten,
    /// `difference`.
    Difference,
    /// `exclusion`.
    Exclusion,
    /// `hue`.
    Hue,
    /// `saturation`.
    Saturation,
    /// `color`.
    Color,
    /// `luminosity`.
    Luminosity,
}

impl CompositeOperation {
    /// Canvas operator name.
    pub fn name(self) -> &'static str {
        match self {
            CompositeOperation::SourceOver => "source-over",
            CompositeOperation::Multiply => "multiply",
            CompositeOperation::Screen => "screen",
            CompositeOperation::Overlay => "overlay",
            CompositeOperation::SoftLight => "soft-light",
            CompositeOperation::HardLight => "hard-light",
            CompositeOperation::ColorDodge => "color-dodge",
            CompositeOperation::ColorBurn => "color-burn",
            CompositeOperation::Darken => "darken",
            CompositeOperation::Lighten => "lighten",
            CompositeOperation::Difference => "difference",
            CompositeOperation::Exclusion => "exclusion",
            CompositeOperation::Hue => "hue",
            CompositeOperation::Saturation => "saturation",
            CompositeOperation::Color => "color",
            CompositeOperation::Luminosity => "luminosity",
        }
    }

    /// Renderer mix function for this operator.
    pub fn mix(self) -> Mix {
        match self {
            CompositeOperation::SourceOver => Mix::Normal,
            CompositeOperation::Multiply => Mix::Multiply,
            CompositeOperation::Screen => Mix::Screen,
            CompositeOperation::Overlay => Mix::Overlay,
            CompositeOperation::SoftLight => Mix::SoftLight,
            CompositeOperation::HardLight => Mix::HardLight,
            CompositeOperation::ColorDodge => Mix::ColorDodge,
            CompositeOperation::ColorBurn => Mix::ColorBurn,
            CompositeOperation::Darken => Mix::Darken,
            CompositeOperation::Lighten => Mix::Lighten,
            CompositeOperation::Difference => Mix::Difference,
            CompositeOperation::Exclusion => Mix::Exclusion,
            CompositeOperation::Hue => Mix::Hue,
            CompositeOperation::Saturation => Mix::Saturation,
            CompositeOperation::Color => Mix::Color,
            CompositeOperation::Luminosity => Mix::Luminosity,
        }
    }

    /// Layer blend mode: this operator's mix, composited source-over.
    pub fn blend_mode(self) -> peniko::BlendMode {
        peniko::BlendMode::new(self.mix(), Compose::SrcOver)
    }
}

impl BlendMode {
    /// Every blend mode, in the order the editing UI lists them.
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    /// CSS `mix-blend-mode` keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::SoftLight => "soft-light",
            BlendMode::HardLight => "hard-light",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }

    /// Raster operator used by the compositor for this mode.
    pub fn composite_operation(self) -> CompositeOperation {
        match self {
            BlendMode::Normal => CompositeOperation::SourceOver,
            BlendMode::Multiply => CompositeOperation::Multiply,
            BlendMode::Screen => CompositeOperation::Screen,
            BlendMode::Overlay => CompositeOperation::Overlay,
            BlendMode::SoftLight => CompositeOperation::SoftLight,
            BlendMode::HardLight => CompositeOperation::HardLight,
            BlendMode::ColorDodge => CompositeOperation::ColorDodge,
            BlendMode::ColorBurn => CompositeOperation::ColorBurn,
            BlendMode::Darken => CompositeOperation::Darken,
            BlendMode::Lighten => CompositeOperation::Lighten,
            BlendMode::Difference => CompositeOperation::Difference,
            BlendMode::Exclusion => CompositeOperation::Exclusion,
            BlendMode::Hue => CompositeOperation::Hue,
            BlendMode::Saturation => CompositeOperation::Saturation,
            BlendMode::Color => CompositeOperation::Color,
            BlendMode::Luminosity => CompositeOperation::Luminosity,
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

impl FromStr for BlendMode {
    type Err = PhotoveilError;

    fn from_str(s: &str) -> PhotoveilResult<Self> {
        let wanted = s.trim();
        BlendMode::ALL
            .into_iter()
            .find(|m| m.css_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PhotoveilError::validation(format!("unknown blend mode '{wanted}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/blend.rs"]
mod tests;
