//! DOM-shaped input records and the single adapter that turns them into [`PointerSample`]s.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::foundation::core::Point;

/// Pointer id used for the mouse.
pub const MOUSE_POINTER_ID: i64 = -1;

/// Modifier keys held during an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Modifiers {
    #[serde(alias = "shiftKey")]
    pub shift: bool,
    #[serde(alias = "altKey")]
    pub alt: bool,
    #[serde(alias = "ctrlKey")]
    pub ctrl: bool,
    #[serde(alias = "metaKey")]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse press/move/release in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseInput {
    pub position: Point,
    /// DOM button index; 0 is primary.
    #[serde(default)]
    pub button: u8,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

impl MouseInput {
    pub fn primary(position: Point) -> Self {
        Self {
            position,
            button: 0,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// One active touch point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i64,
    pub position: Point,
}

/// Touch event carrying every touch still on the surface (the DOM `touches` list).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchInput {
    pub touches: SmallVec<[TouchPoint; 4]>,
}

impl TouchInput {
    pub fn new(touches: impl IntoIterator<Item = TouchPoint>) -> Self {
        Self {
            touches: touches.into_iter().collect(),
        }
    }

    /// Touches given as `(id, x, y)`.
    pub fn from_points(points: &[(i64, f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(id, x, y)| TouchPoint {
            id,
            position: Point::new(x, y),
        }))
    }

    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    /// Distance, angle (degrees) and midpoint of the first two touches.
    pub fn pinch_metrics(&self) -> Option<PinchMetrics> {
        let [a, b] = [self.touches.first()?, self.touches.get(1)?];
        let d = b.position - a.position;
        Some(PinchMetrics {
            distance: d.hypot(),
            angle_deg: d.y.atan2(d.x).to_degrees(),
            midpoint: a.position.midpoint(b.position),
        })
    }
}

/// Two-finger geometry in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchMetrics {
    pub distance: f64,
    pub angle_deg: f64,
    pub midpoint: Point,
}

/// One wheel tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelInput {
    pub delta_y: f64,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

/// Keys the editor reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Delete,
    Backspace,
    Escape,
    Space,
    Backslash,
    Char(char),
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            "Escape" | "Esc" => Key::Escape,
            " " | "Spacebar" | "Space" => Key::Space,
            "\\" => Key::Backslash,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => Key::Other,
                }
            }
        }
    }

    /// Keys that hide overlays while held.
    pub fn is_peek(self) -> bool {
        matches!(self, Key::Space | Key::Backslash)
    }
}

/// Key press or release.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInput {
    /// DOM `KeyboardEvent.key`.
    pub key: String,
    #[serde(default)]
    pub repeat: bool,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            repeat: false,
            modifiers,
        }
    }

    pub fn key(&self) -> Key {
        Key::from_dom(&self.key)
    }
}

/// Normalized pointer position plus how many pointers are down.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerSample {
    pub position: Point,
    pub pointer_count: usize,
    pub pointer_ids: SmallVec<[i64; 2]>,
}

impl From<&MouseInput> for PointerSample {
    fn from(m: &MouseInput) -> Self {
        Self {
            position: m.position,
            pointer_count: 1,
            pointer_ids: SmallVec::from_slice(&[MOUSE_POINTER_ID]),
        }
    }
}

impl PointerSample {
    /// The first touch is the primary pointer. `None` when no touches remain.
    pub fn from_touches(t: &TouchInput) -> Option<Self> {
        let first = t.touches.first()?;
        Some(Self {
            position: first.position,
            pointer_count: t.len(),
            pointer_ids: t.touches.iter().map(|p| p.id).collect(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gesture/input.rs"]
mod tests;
