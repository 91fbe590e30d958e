use crate::foundation::core::{Point, Size};
use crate::geometry::kernel::{Corner, box_contains, corners_world, rotate_point};
use crate::scene::model::{Overlay, OverlayId};

/// Distance of the rotate handle above the box's top edge, in display pixels.
pub const DEFAULT_ROTATE_HANDLE_OFFSET: f64 = 30.0;
/// Pick radius around a handle, in display pixels.
pub const DEFAULT_HANDLE_RADIUS: f64 = 10.0;

/// A selection-chrome handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    Corner(Corner),
    Rotate,
}

/// Canvas-local positions of the selected overlay's handles.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct HandleLayout {
    /// In [`Corner::ALL`] order.
    pub corners: [Point; 4],
    /// Rotate handle, above the top edge and rotated with the box.
    pub rotate: Point,
    /// Midpoint of the top edge; the rotate stem starts here.
    pub top_center: Point,
}

impl HandleLayout {
    /// Layout for a box centered at `center`.
    pub fn new(center: Point, unscaled: Size, scale: f64, rotation_deg: f64, offset: f64) -> Self {
        let half_h = unscaled.height * scale.abs() / 2.0;
        let top = rotate_point(0.0, -half_h, rotation_deg);
        let knob = rotate_point(0.0, -(half_h + offset), rotation_deg);
        Self {
            corners: corners_world(center, unscaled, scale.abs(), rotation_deg),
            rotate: center + knob.to_vec2(),
            top_center: center + top.to_vec2(),
        }
    }

    pub fn for_overlay(overlay: &Overlay, unscaled: Size, offset: f64) -> Self {
        Self::new(
            overlay.position(),
            unscaled,
            overlay.scale,
            overlay.rotation,
            offset,
        )
    }

    pub fn corner(&self, corner: Corner) -> Point {
        let idx = Corner::ALL.iter().position(|c| *c == corner).unwrap_or(0);
        self.corners[idx]
    }

    /// Handle under `p`, rotate handle first, then corners.
    pub fn hit(&self, p: Point, radius: f64) -> Option<Handle> {
        if (p - self.rotate).hypot() <= radius {
            return Some(Handle::Rotate);
        }
        Corner::ALL
            .iter()
            .zip(self.corners)
            .find(|(_, c)| (p - *c).hypot() <= radius)
            .map(|(corner, _)| Handle::Corner(*corner))
    }
}

/// Topmost overlay whose rendered box contains `p`.
pub fn hit_overlay<'a, I, F>(overlays: I, p: Point, unscaled_of: F) -> Option<OverlayId>
where
    I: DoubleEndedIterator<Item = &'a Overlay>,
    F: Fn(&Overlay) -> Size,
{
    overlays
        .rev()
        .find(|o| box_contains(o.position(), unscaled_of(o), o.scale, o.rotation, p))
        .map(|o| o.id)
}

#[cfg(test)]
#[path = "../../tests/unit/gesture/handles.rs"]
mod tests;
