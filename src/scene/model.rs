use serde::{Deserialize, Serialize};

use crate::foundation::core::Point;
use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::foundation::math::normalize_degrees;
use crate::scene::blend::BlendMode;

/// Opaque overlay identifier, unique within an editing session.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// What an overlay paints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    /// A CSS color or gradient expression.
    Flat,
    /// A bitmap or SVG referenced by URL or storage key.
    Image,
}

/// Default opacity of a freshly added overlay.
pub const DEFAULT_OPACITY: f64 = 0.8;

fn default_scale() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

/// One overlay placed on the photo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    /// Stable identifier.
    pub id: OverlayId,
    /// Flat fill or image.
    pub kind: OverlayKind,
    /// CSS fill expression (`flat`) or asset reference (`image`).
    pub value: String,
    /// Horizontal offset of the overlay center from the canvas center, in display pixels.
    #[serde(default)]
    pub x: f64,
    /// Vertical offset of the overlay center from the canvas center, in display pixels.
    #[serde(default)]
    pub y: f64,
    /// Clockwise rotation in degrees, `[0, 360)`.
    #[serde(default)]
    pub rotation: f64,
    /// Uniform scale applied to the cover box.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// How the overlay mixes with the pixels below.
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Mirror along the local x axis.
    #[serde(default)]
    pub flip_h: bool,
    /// Mirror along the local y axis.
    #[serde(default)]
    pub flip_v: bool,
}

impl Overlay {
    /// New overlay with the default transform: centered, scale 1, no rotation, opacity 0.8,
    /// screen blending, no flips.
    pub fn new(id: OverlayId, kind: OverlayKind, value: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            value: value.into(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            opacity: DEFAULT_OPACITY,
            blend_mode: BlendMode::Screen,
            flip_h: false,
            flip_v: false,
        }
    }

    /// Overlay center relative to the canvas center.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Per-axis scale including flips.
    pub fn signed_scale(&self) -> (f64, f64) {
        let fx = if self.flip_h { -1.0 } else { 1.0 };
        let fy = if self.flip_v { -1.0 } else { 1.0 };
        (self.scale * fx, self.scale * fy)
    }

    /// Check that the overlay can be rendered identically by both surfaces.
    pub fn validate(&self) -> PhotoveilResult<()> {
        if self.value.trim().is_empty() {
            return Err(PhotoveilError::validation(format!(
                "{}: value must be non-empty",
                self.id
            )));
        }
        for (name, v) in [
            ("x", self.x),
            ("y", self.y),
            ("rotation", self.rotation),
            ("scale", self.scale),
            ("opacity", self.opacity),
        ] {
            if !v.is_finite() {
                return Err(PhotoveilError::validation(format!(
                    "{}: {name} must be finite",
                    self.id
                )));
            }
        }
        if self.scale <= 0.0 {
            return Err(PhotoveilError::validation(format!(
                "{}: scale must be positive, got {}",
                self.id, self.scale
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PhotoveilError::validation(format!(
                "{}: opacity must be in [0, 1], got {}",
                self.id, self.opacity
            )));
        }
        Ok(())
    }
}

/// Partial update merged into an [`Overlay`]; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayPatch {
    /// New fill expression or asset reference.
    pub value: Option<String>,
    /// New x offset.
    pub x: Option<f64>,
    /// New y offset.
    pub y: Option<f64>,
    /// New rotation in degrees; wrapped into `[0, 360)`.
    pub rotation: Option<f64>,
    /// New scale; ignored unless positive and finite.
    pub scale: Option<f64>,
    /// New opacity; clamped into `[0, 1]`.
    pub opacity: Option<f64>,
    /// New blend mode.
    pub blend_mode: Option<BlendMode>,
    /// New horizontal flip.
    pub flip_h: Option<bool>,
    /// New vertical flip.
    pub flip_v: Option<bool>,
}

impl OverlayPatch {
    /// Patch that moves the overlay center.
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Self::default()
        }
    }

    /// Patch that sets scale and center together.
    pub fn scale_at(scale: f64, center: Point) -> Self {
        Self {
            scale: Some(scale),
            ..Self::position(center)
        }
    }

    /// Patch that sets the rotation.
    pub fn rotation(deg: f64) -> Self {
        Self {
            rotation: Some(deg),
            ..Self::default()
        }
    }

    /// Return `true` when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge into `overlay`, normalizing values into their valid ranges.
    pub fn apply_to(&self, overlay: &mut Overlay) {
        if let Some(v) = &self.value {
            overlay.value.clone_from(v);
        }
        if let Some(x) = self.x.filter(|v| v.is_finite()) {
            overlay.x = x;
        }
        if let Some(y) = self.y.filter(|v| v.is_finite()) {
            overlay.y = y;
        }
        if let Some(r) = self.rotation.filter(|v| v.is_finite()) {
            overlay.rotation = normalize_degrees(r);
        }
        if let Some(s) = self.scale.filter(|v| v.is_finite() && *v > 0.0) {
            overlay.scale = s;
        }
        if let Some(o) = self.opacity.filter(|v| v.is_finite()) {
            overlay.opacity = o.clamp(0.0, 1.0);
        }
        if let Some(m) = self.blend_mode {
            overlay.blend_mode = m;
        }
        if let Some(f) = self.flip_h {
            overlay.flip_h = f;
        }
        if let Some(f) = self.flip_v {
            overlay.flip_v = f;
        }
    }
}

/// One entry of the catalog feed supplied by the host application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Catalog identifier (not an overlay id).
    pub id: String,
    /// Flat fill or image.
    pub kind: OverlayKind,
    /// Fill expression or asset reference.
    pub value: String,
    /// Position in the named set.
    #[serde(default)]
    pub order_index: i64,
    /// Whether the item is offered to users.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Known intrinsic aspect ratio of an image asset.
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
}

fn default_active() -> bool {
    true
}

/// Active catalog items ordered by `order_index` (stable for equal indices).
pub fn active_catalog_items(items: &[CatalogItem]) -> Vec<&CatalogItem> {
    let mut out: Vec<&CatalogItem> = items.iter().filter(|i| i.is_active).collect();
    out.sort_by_key(|i| i.order_index);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
