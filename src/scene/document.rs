use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{PixelSize, Size};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::geometry::canvas::fit_display_box;
use crate::scene::model::Overlay;

/// Width/height pair as it appears in JSON.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeDef {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl From<SizeDef> for Size {
    fn from(s: SizeDef) -> Self {
        Size::new(s.width, s.height)
    }
}

/// Snapshot of an editing session: the base photo plus its overlays.
///
/// Overlay positions are in display pixels, so the document also records the display box they
/// were placed against (or the viewport that box was fitted into). Without either, the photo is
/// assumed to have been shown at its natural size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDocument {
    /// Asset reference of the base photo.
    pub base_image: String,
    /// On-screen size of the photo while editing.
    #[serde(default)]
    pub display: Option<SizeDef>,
    /// Viewport the photo was fitted into, used when `display` is absent.
    #[serde(default)]
    pub viewport: Option<SizeDef>,
    /// Overlays, bottom to top.
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

impl EditDocument {
    /// Parse a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PhotoveilResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PhotoveilError::serde(format!("parse edit document JSON: {e}")))
    }

    /// Parse a document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PhotoveilResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PhotoveilError::validation(format!("open edit document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check overlay values and id uniqueness.
    pub fn validate(&self) -> PhotoveilResult<()> {
        if self.base_image.trim().is_empty() {
            return Err(PhotoveilError::validation("baseImage must be non-empty"));
        }
        let mut seen = HashSet::new();
        for o in &self.overlays {
            o.validate()?;
            if !seen.insert(o.id) {
                return Err(PhotoveilError::validation(format!("duplicate {}", o.id)));
            }
        }
        Ok(())
    }

    /// Display box the overlay positions refer to.
    pub fn display_size(&self, image: PixelSize, viewport_fit: f64) -> PhotoveilResult<Size> {
        if let Some(d) = self.display {
            let size = Size::from(d);
            if !(size.width > 0.0 && size.height > 0.0) {
                return Err(PhotoveilError::validation("display box must be non-empty"));
            }
            return Ok(size);
        }
        if let Some(v) = self.viewport {
            return fit_display_box(image, v.into(), viewport_fit);
        }
        Ok(image.to_size())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
