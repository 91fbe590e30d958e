//! Live preview: overlay state → style attributes for a DOM host.
//!
//! Each overlay becomes two nested boxes. The outer box is centered on the photo, offset by the
//! overlay position, sized to the unscaled cover box, and carries the blend mode and opacity so
//! the whole overlay mixes with the photo as one group. The inner box fills the outer one and
//! applies rotation, scale and flips around its center. The compositor reproduces the same
//! layout in image pixels.

use std::fmt::Write as _;

use crate::assets::resolve::{DEFAULT_ASSET_ROUTE, resolve_asset_url};
use crate::foundation::core::{Point, Size};
use crate::gesture::controller::SceneView;
use crate::gesture::handles::{DEFAULT_ROTATE_HANDLE_OFFSET, HandleLayout};
use crate::scene::blend::BlendMode;
use crate::scene::model::{Overlay, OverlayId, OverlayKind};
use crate::snap::SnapGuides;

/// Positioning box of one overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OuterStyle {
    /// Offset of the box center from the photo center, in display pixels.
    pub offset: Point,
    /// Unscaled cover box, in display pixels.
    pub size: Size,
    pub blend_mode: BlendMode,
    pub opacity: f64,
}

impl OuterStyle {
    /// Inline CSS for the outer element, relative to a positioned photo container.
    pub fn css(&self) -> String {
        format!(
            "position: absolute; left: 50%; top: 50%; width: {}px; height: {}px; \
             transform: translate(calc(-50% + {}px), calc(-50% + {}px)); \
             mix-blend-mode: {}; opacity: {}; pointer-events: none;",
            css_num(self.size.width),
            css_num(self.size.height),
            css_num(self.offset.x),
            css_num(self.offset.y),
            self.blend_mode.css_name(),
            css_num(self.opacity),
        )
    }
}

/// What fills the inner box.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Background {
    /// CSS color or gradient expression, used verbatim.
    Fill { value: String },
    /// Resolved image URL, sized to cover and centered.
    Image { url: String },
}

/// Transformed box of one overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerStyle {
    /// Clockwise rotation in degrees.
    pub rotation: f64,
    /// Horizontal scale including the flip sign.
    pub scale_x: f64,
    /// Vertical scale including the flip sign.
    pub scale_y: f64,
    pub background: Background,
}

impl InnerStyle {
    /// CSS `transform` value.
    pub fn transform(&self) -> String {
        format!(
            "rotate({}deg) scale({}, {})",
            css_num(self.rotation),
            css_num(self.scale_x),
            css_num(self.scale_y)
        )
    }

    /// Inline CSS for the inner element.
    pub fn css(&self) -> String {
        let mut out = format!(
            "width: 100%; height: 100%; transform-origin: center; transform: {};",
            self.transform()
        );
        match &self.background {
            Background::Fill { value } => {
                let _ = write!(out, " background: {value};");
            }
            Background::Image { url } => {
                let _ = write!(
                    out,
                    " background-image: url(\"{}\"); background-size: cover; \
                     background-position: center; background-repeat: no-repeat;",
                    escape_css_string(url)
                );
            }
        }
        out
    }
}

/// Everything the host needs to draw one overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLayer {
    pub id: OverlayId,
    pub outer: OuterStyle,
    pub inner: InnerStyle,
    /// Unscaled box × scale, in display pixels.
    pub rendered: Size,
}

/// Handles drawn around the selected overlay, in canvas-local display pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChrome {
    pub id: OverlayId,
    pub handles: HandleLayout,
}

/// One preview frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewFrame {
    /// On-screen size of the photo.
    pub display: Size,
    /// Bottom to top.
    pub layers: Vec<PreviewLayer>,
    pub chrome: Option<SelectionChrome>,
    pub guides: SnapGuides,
}

/// Builds [`PreviewFrame`]s from overlay state.
#[derive(Clone, Debug)]
pub struct PreviewRenderer {
    route: String,
    rotate_handle_offset: f64,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROUTE, DEFAULT_ROTATE_HANDLE_OFFSET)
    }
}

impl PreviewRenderer {
    pub fn new(route: impl Into<String>, rotate_handle_offset: f64) -> Self {
        Self {
            route: route.into(),
            rotate_handle_offset,
        }
    }

    /// Style for a single overlay.
    pub fn layer(&self, overlay: &Overlay, view: &SceneView<'_>) -> PreviewLayer {
        let unscaled = view.unscaled(overlay);
        let (scale_x, scale_y) = overlay.signed_scale();
        let background = match overlay.kind {
            OverlayKind::Flat => Background::Fill {
                value: overlay.value.clone(),
            },
            OverlayKind::Image => Background::Image {
                url: resolve_asset_url(&overlay.value, &self.route),
            },
        };
        PreviewLayer {
            id: overlay.id,
            outer: OuterStyle {
                offset: overlay.position(),
                size: unscaled,
                blend_mode: overlay.blend_mode,
                opacity: overlay.opacity,
            },
            inner: InnerStyle {
                rotation: overlay.rotation,
                scale_x,
                scale_y,
                background,
            },
            rendered: Size::new(
                unscaled.width * overlay.scale,
                unscaled.height * overlay.scale,
            ),
        }
    }

    /// Preview for all overlays. While `hidden`, no layers, chrome or guides are produced.
    pub fn render(
        &self,
        overlays: &[Overlay],
        selected: Option<OverlayId>,
        view: &SceneView<'_>,
        guides: SnapGuides,
        hidden: bool,
    ) -> PreviewFrame {
        let display = view.canvas.display_size();
        if hidden {
            return PreviewFrame {
                display,
                layers: Vec::new(),
                chrome: None,
                guides: SnapGuides::default(),
            };
        }

        let layers = overlays.iter().map(|o| self.layer(o, view)).collect();
        let chrome = selected
            .and_then(|id| overlays.iter().find(|o| o.id == id))
            .map(|o| SelectionChrome {
                id: o.id,
                handles: HandleLayout::for_overlay(
                    o,
                    view.unscaled(o),
                    self.rotate_handle_offset,
                ),
            });
        PreviewFrame {
            display,
            layers,
            chrome,
            guides,
        }
    }
}

/// Shortest decimal form, rounded to 1/1000 px, without a negative zero.
fn css_num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{r}")
}

fn escape_css_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/preview.rs"]
mod tests;
