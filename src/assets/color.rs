//! CSS colors.
//!
//! Parsing is delegated to the `color` crate re-exported by the renderer, which implements CSS
//! Color 4: hex, `rgb()`/`hsl()`/`hwb()`, `lab()`/`lch()`/`oklab()`/`oklch()`, `color()` and the
//! full named-color table.

use vello_cpu::peniko::color::{AlphaColor, Srgb, parse_color};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{PhotoveilError, PhotoveilResult};

/// A parsed CSS color, converted to sRGB with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor(pub AlphaColor<Srgb>);

impl CssColor {
    /// Build a color from straight sRGB channels in `0..=1`.
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(AlphaColor::new([r, g, b, a]))
    }

    /// Straight `[r, g, b, a]` channels.
    pub fn components(self) -> [f32; 4] {
        self.0.components
    }

    /// Alpha channel.
    pub fn alpha(self) -> f32 {
        self.0.components[3]
    }

    /// Quantize to straight RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        self.0.to_rgba8().to_u8_array()
    }

    /// Quantize to premultiplied RGBA8.
    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let p = self.0.premultiply().to_rgba8();
        Rgba8Premul {
            r: p.r,
            g: p.g,
            b: p.b,
            a: p.a,
        }
    }
}

/// Parse any CSS color the browser would accept for `background`.
pub fn parse_css_color(input: &str) -> PhotoveilResult<CssColor> {
    let s = input.trim();
    parse_color(s)
        .map(|c| CssColor(c.to_alpha_color::<Srgb>()))
        .map_err(|e| PhotoveilError::validation(format!("invalid CSS color '{s}': {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
