use crate::foundation::core::{PixelSize, Point, Rect, Size, Vec2};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};

/// Fraction of the viewport the displayed photo may occupy on each axis.
pub const DEFAULT_VIEWPORT_FIT: f64 = 0.8;

/// Fit an image inside `fraction` of the viewport, scaling both axes uniformly.
///
/// The photo is never shown larger than its natural pixel size.
pub fn fit_display_box(image: PixelSize, viewport: Size, fraction: f64) -> PhotoveilResult<Size> {
    if !(fraction.is_finite() && fraction > 0.0) {
        return Err(PhotoveilError::validation(format!(
            "viewport fit fraction must be positive, got {fraction}"
        )));
    }
    if !(viewport.width > 0.0 && viewport.height > 0.0) {
        return Err(PhotoveilError::validation(format!(
            "viewport must be non-empty, got {}x{}",
            viewport.width, viewport.height
        )));
    }
    let natural = image.to_size();
    let ratio = (viewport.width * fraction / natural.width)
        .min(viewport.height * fraction / natural.height)
        .min(1.0);
    Ok(Size::new(natural.width * ratio, natural.height * ratio))
}

/// Layout of the base photo: its pixel size, its on-screen box and where that box sits.
///
/// Three coordinate spaces meet here:
///
/// - screen: viewport pixels, as delivered by pointer events
/// - canvas-local: display pixels relative to the display box center (overlay `x`/`y` live here)
/// - image-pixel: source photo pixels with the origin at the top-left corner (export space)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasGeometry {
    image: PixelSize,
    display: Size,
    display_center: Point,
}

impl CanvasGeometry {
    /// Build geometry from an explicit display box and its center in screen space.
    pub fn new(image: PixelSize, display: Size, display_center: Point) -> PhotoveilResult<Self> {
        if !(display.width > 0.0 && display.height > 0.0) {
            return Err(PhotoveilError::validation(format!(
                "display box must be non-empty, got {}x{}",
                display.width, display.height
            )));
        }
        Ok(Self {
            image,
            display,
            display_center,
        })
    }

    /// Fit the photo into a viewport rectangle and center it there.
    pub fn fit_in_viewport(image: PixelSize, viewport: Rect, fraction: f64) -> PhotoveilResult<Self> {
        let display = fit_display_box(image, viewport.size(), fraction)?;
        Self::new(image, display, viewport.center())
    }

    /// Source photo size in pixels.
    pub fn image_size(&self) -> PixelSize {
        self.image
    }

    /// On-screen size of the displayed photo.
    pub fn display_size(&self) -> Size {
        self.display
    }

    /// Screen-space center of the displayed photo.
    pub fn display_center(&self) -> Point {
        self.display_center
    }

    /// Move the display box without changing its size (e.g. the page scrolled).
    pub fn set_display_center(&mut self, center: Point) {
        self.display_center = center;
    }

    /// Per-axis ratio of image pixels to display pixels.
    pub fn image_scale(&self) -> Vec2 {
        let natural = self.image.to_size();
        Vec2::new(
            natural.width / self.display.width,
            natural.height / self.display.height,
        )
    }

    /// Screen position to canvas-local position.
    pub fn screen_to_canvas(&self, p: Point) -> Point {
        (p - self.display_center).to_point()
    }

    /// Canvas-local position to screen position.
    pub fn canvas_to_screen(&self, p: Point) -> Point {
        self.display_center + p.to_vec2()
    }

    /// Canvas-local position to image-pixel position.
    pub fn canvas_to_image(&self, p: Point) -> Point {
        let k = self.image_scale();
        let natural = self.image.to_size();
        Point::new(
            natural.width / 2.0 + p.x * k.x,
            natural.height / 2.0 + p.y * k.y,
        )
    }

    /// Image-pixel position to canvas-local position.
    pub fn image_to_canvas(&self, p: Point) -> Point {
        let k = self.image_scale();
        let natural = self.image.to_size();
        Point::new(
            (p.x - natural.width / 2.0) / k.x,
            (p.y - natural.height / 2.0) / k.y,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/canvas.rs"]
mod tests;
