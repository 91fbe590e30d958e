use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Largest raster edge produced when rasterizing vector assets.
pub const MAX_RASTER_DIM: u32 = 16_384;

/// Decoded bitmap in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Natural width / height.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Parsed SVG document.
#[derive(Clone, Debug)]
pub struct PreparedSvg {
    pub tree: Arc<usvg::Tree>,
}

impl PreparedSvg {
    /// Intrinsic size from the root `width`/`height` (or `viewBox`).
    pub fn natural_size(&self) -> (f64, f64) {
        let s = self.tree.size();
        (f64::from(s.width()), f64::from(s.height()))
    }

    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.natural_size();
        w / h
    }

    /// Rasterize stretched to exactly `width`×`height`.
    pub fn rasterize(&self, width: u32, height: u32) -> PhotoveilResult<PreparedImage> {
        if width == 0 || height == 0 || width > MAX_RASTER_DIM || height > MAX_RASTER_DIM {
            return Err(PhotoveilError::render(format!(
                "svg raster size {width}x{height} out of range (max {MAX_RASTER_DIM})"
            )));
        }
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| PhotoveilError::render("failed to allocate svg pixmap"))?;

        let size = self.tree.size();
        let sx = width as f32 / size.width();
        let sy = height as f32 / size.height();
        resvg::render(
            &self.tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        Ok(PreparedImage {
            width,
            height,
            rgba8_premul: Arc::new(pixmap.take()),
        })
    }
}

/// A decoded overlay asset.
#[derive(Clone, Debug)]
pub enum DecodedAsset {
    Bitmap(PreparedImage),
    Svg(PreparedSvg),
}

impl DecodedAsset {
    /// Natural aspect ratio; used for cover-fit sizing.
    pub fn aspect_ratio(&self) -> f64 {
        match self {
            DecodedAsset::Bitmap(img) => img.aspect_ratio(),
            DecodedAsset::Svg(svg) => svg.aspect_ratio(),
        }
    }
}

pub fn decode_image(bytes: &[u8]) -> PhotoveilResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotoveilError::asset("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn parse_svg(bytes: &[u8]) -> PhotoveilResult<PreparedSvg> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(PreparedSvg {
        tree: Arc::new(tree),
    })
}

/// Sniff for SVG markup: leading `<svg`, or an XML prolog followed by an `<svg` element.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && trimmed.contains("<svg"))
}

/// Decode bytes as SVG when `hint` says so (extension or media type) or the content sniffs as
/// SVG; otherwise as a raster image.
pub fn decode_asset(bytes: &[u8], hint: Option<&str>) -> PhotoveilResult<DecodedAsset> {
    let hinted_svg = hint.is_some_and(|h| {
        let h = h.to_ascii_lowercase();
        h.ends_with(".svg") || h.contains("image/svg+xml")
    });
    if hinted_svg || looks_like_svg(bytes) {
        let svg = parse_svg(bytes)?;
        let (w, h) = svg.natural_size();
        if !(w > 0.0 && h > 0.0) {
            return Err(PhotoveilError::asset("svg has invalid width/height"));
        }
        return Ok(DecodedAsset::Svg(svg));
    }
    decode_image(bytes).map(DecodedAsset::Bitmap)
}
