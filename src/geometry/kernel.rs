//! Pure geometry used by the gesture controller, the preview renderer and the compositor.
//!
//! All positions are canvas-local: the origin is the center of the displayed photo, `+x` points
//! right and `+y` points down. Positive angles rotate clockwise on screen, matching both CSS
//! `rotate()` and raster `rotate()`.

use crate::foundation::core::{Point, Size, Vec2};
use crate::foundation::math::{SCALE_MAX, SCALE_MIN, normalize_degrees};

/// Below this pointer-to-anchor distance a resize frame is ignored.
pub const MIN_ANCHOR_DISTANCE_PX: f64 = 10.0;
/// Relative distance from `1.0` within which a resize snaps to exactly `1.0`.
pub const SCALE_SNAP_TO_ONE: f64 = 0.03;
/// Increment used when rotating with shift held.
pub const ROTATION_SNAP_DEG: f64 = 15.0;

/// Rotate `(x, y)` about the origin by `angle_deg`.
pub fn rotate_point(x: f64, y: f64, angle_deg: f64) -> Point {
    let (s, c) = angle_deg.to_radians().sin_cos();
    Point::new(x * c - y * s, x * s + y * c)
}

fn rotate_vec(v: Vec2, angle_deg: f64) -> Vec2 {
    rotate_point(v.x, v.y, angle_deg).to_vec2()
}

/// Unscaled overlay box that fully covers a `box_w` x `box_h` area.
///
/// `None` (or an unusable ratio) yields a square with side `max(box_w, box_h)`, which is how
/// flat fills are sized.
pub fn compute_cover_box(aspect_ratio: Option<f64>, box_w: f64, box_h: f64) -> Size {
    let Some(aspect) = aspect_ratio.filter(|a| a.is_finite() && *a > 0.0) else {
        let side = box_w.max(box_h);
        return Size::new(side, side);
    };
    if box_h <= 0.0 || box_w <= 0.0 {
        return Size::ZERO;
    }
    let image_aspect = box_w / box_h;
    if aspect > image_aspect {
        Size::new(box_h * aspect, box_h)
    } else {
        Size::new(box_w, box_w / aspect)
    }
}

/// Box corner, named by its position before rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-right corner.
    BottomRight,
    /// Bottom-left corner.
    BottomLeft,
}

impl Corner {
    /// All corners, clockwise from top-left.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }

    /// Offset of this corner from the box center in unrotated local space.
    pub fn local_offset(self, size: Size) -> Vec2 {
        let (hw, hh) = (size.width / 2.0, size.height / 2.0);
        match self {
            Corner::TopLeft => Vec2::new(-hw, -hh),
            Corner::TopRight => Vec2::new(hw, -hh),
            Corner::BottomRight => Vec2::new(hw, hh),
            Corner::BottomLeft => Vec2::new(-hw, hh),
        }
    }
}

/// World position of one corner of a transformed box.
pub fn corner_world(
    center: Point,
    unscaled: Size,
    scale: f64,
    rotation_deg: f64,
    corner: Corner,
) -> Point {
    center + rotate_vec(corner.local_offset(unscaled) * scale, rotation_deg)
}

/// World positions of all four corners, in [`Corner::ALL`] order.
pub fn corners_world(center: Point, unscaled: Size, scale: f64, rotation_deg: f64) -> [Point; 4] {
    Corner::ALL.map(|c| corner_world(center, unscaled, scale, rotation_deg, c))
}

/// Return `true` when `p` lies inside the rotated, scaled box.
pub fn box_contains(
    center: Point,
    unscaled: Size,
    scale: f64,
    rotation_deg: f64,
    p: Point,
) -> bool {
    let local = rotate_vec(p - center, -rotation_deg);
    let hw = unscaled.width * scale.abs() / 2.0;
    let hh = unscaled.height * scale.abs() / 2.0;
    local.x.abs() <= hw && local.y.abs() <= hh
}

/// Inputs of a corner-drag resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchoredScaleInput {
    /// Pointer position when the drag started.
    pub start_pointer: Point,
    /// Current pointer position.
    pub current_pointer: Point,
    /// World position of the corner that must stay fixed.
    pub anchor: Point,
    /// Overlay scale when the drag started.
    pub start_scale: f64,
    /// Overlay rotation in degrees.
    pub rotation_deg: f64,
    /// Unscaled cover box of the overlay.
    pub unscaled: Size,
    /// Unscaled local offset of the anchor corner from the overlay center.
    pub anchor_offset: Vec2,
}

/// Result of a corner-drag resize frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchoredScale {
    /// New overlay scale.
    pub scale: f64,
    /// New overlay center that keeps the anchor in place.
    pub center: Point,
}

/// Resolve a new scale and center so the anchor corner keeps its world position.
///
/// Returns `None` for degenerate frames (pointer started too close to the anchor, or non-finite
/// input); callers leave the overlay untouched for that frame.
pub fn resolve_anchored_scale(input: &AnchoredScaleInput) -> Option<AnchoredScale> {
    if !(input.unscaled.width > 0.0 && input.unscaled.height > 0.0) {
        return None;
    }
    let start_distance = (input.start_pointer - input.anchor).hypot();
    let current_distance = (input.current_pointer - input.anchor).hypot();
    if !start_distance.is_finite() || !current_distance.is_finite() {
        return None;
    }
    if start_distance < MIN_ANCHOR_DISTANCE_PX {
        return None;
    }

    let mut scale =
        (input.start_scale * (current_distance / start_distance)).clamp(SCALE_MIN, SCALE_MAX);
    if (scale - 1.0).abs() < SCALE_SNAP_TO_ONE {
        scale = 1.0;
    }
    if !scale.is_finite() {
        return None;
    }

    let center = input.anchor - rotate_vec(input.anchor_offset * scale, input.rotation_deg);
    Some(AnchoredScale { scale, center })
}

/// Angle of the pointer around `center`, with 0 degrees pointing up, in `[0, 360)`.
///
/// With `shift_held` the angle snaps to the nearest 15 degree increment.
pub fn resolve_rotation(pointer: Point, center: Point, shift_held: bool) -> f64 {
    let d = pointer - center;
    let deg = normalize_degrees(d.y.atan2(d.x).to_degrees() + 90.0);
    if shift_held {
        normalize_degrees((deg / ROTATION_SNAP_DEG).round() * ROTATION_SNAP_DEG)
    } else {
        deg
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/kernel.rs"]
mod tests;
