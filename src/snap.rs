//! Edge and center snapping for overlay moves.

use crate::foundation::core::{Point, Size};

/// Default snapping distance in display pixels.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 12.0;

/// Horizontal alignment that fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapX {
    /// Overlay left edge on canvas left edge.
    Left,
    /// Overlay right edge on canvas right edge.
    Right,
    /// Overlay center on canvas center.
    Center,
}

/// Vertical alignment that fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapY {
    /// Overlay top edge on canvas top edge.
    Top,
    /// Overlay bottom edge on canvas bottom edge.
    Bottom,
    /// Overlay center on canvas center.
    Center,
}

/// Corrected position plus the alignment chosen on each axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SnapResult {
    /// Overlay center relative to the canvas center after snapping.
    pub position: Point,
    /// Horizontal alignment, if any.
    pub x: Option<SnapX>,
    /// Vertical alignment, if any.
    pub y: Option<SnapY>,
}

/// Guide lines to draw while a snapped drag is in progress, in canvas-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct SnapGuides {
    /// X of a vertical guide line.
    pub vertical: Option<f64>,
    /// Y of a horizontal guide line.
    pub horizontal: Option<f64>,
}

impl SnapGuides {
    /// Return `true` when no guide is shown.
    pub fn is_empty(&self) -> bool {
        self.vertical.is_none() && self.horizontal.is_none()
    }
}

impl SnapResult {
    /// Return `true` when either axis snapped.
    pub fn snapped(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Guide lines for the alignments that fired.
    pub fn guides(&self, canvas: Size) -> SnapGuides {
        SnapGuides {
            vertical: self.x.map(|x| match x {
                SnapX::Left => -canvas.width / 2.0,
                SnapX::Right => canvas.width / 2.0,
                SnapX::Center => 0.0,
            }),
            horizontal: self.y.map(|y| match y {
                SnapY::Top => -canvas.height / 2.0,
                SnapY::Bottom => canvas.height / 2.0,
                SnapY::Center => 0.0,
            }),
        }
    }
}

/// Snaps a proposed overlay center onto canvas edges and center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapResolver {
    threshold: f64,
}

impl Default for SnapResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_THRESHOLD)
    }
}

/// Snap one axis. Candidates are near edge, far edge and center, in priority order; the closest
/// candidate under the threshold wins and ties go to the higher priority. Picking the closest keeps
/// a second pass from jumping to a different target that is also in range.
fn snap_axis(pos: f64, overlay_len: f64, canvas_len: f64, threshold: f64) -> (f64, Option<usize>) {
    let half_overlay = overlay_len / 2.0;
    let half_canvas = canvas_len / 2.0;
    let candidates = [-half_canvas + half_overlay, half_canvas - half_overlay, 0.0];

    let mut best: Option<(f64, usize)> = None;
    for (i, target) in candidates.into_iter().enumerate() {
        let d = (pos - target).abs();
        if d >= threshold {
            continue;
        }
        if best.is_none_or(|(best_d, _)| d < best_d) {
            best = Some((d, i));
        }
    }
    match best {
        Some((_, i)) => (candidates[i], Some(i)),
        None => (pos, None),
    }
}

impl SnapResolver {
    /// Create a resolver; negative or non-finite thresholds disable snapping.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.max(0.0)
        } else {
            0.0
        };
        Self { threshold }
    }

    /// Snapping distance in display pixels.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Snap `center` (relative to the canvas center) for an overlay of `overlay` scaled size on a
    /// canvas of `canvas` size. Each axis is resolved independently.
    pub fn resolve(&self, center: Point, overlay: Size, canvas: Size) -> SnapResult {
        let (x, xi) = snap_axis(center.x, overlay.width, canvas.width, self.threshold);
        let (y, yi) = snap_axis(center.y, overlay.height, canvas.height, self.threshold);
        SnapResult {
            position: Point::new(x, y),
            x: xi.map(|i| [SnapX::Left, SnapX::Right, SnapX::Center][i]),
            y: yi.map(|i| [SnapY::Top, SnapY::Bottom, SnapY::Center][i]),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/snap/mod.rs"]
mod tests;
