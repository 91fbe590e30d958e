use anyhow::Context;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use image::ImageEncoder as _;

use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::render::FrameRGBA;

/// Media type of exported images.
pub const PNG_MIME: &str = "image/png";
/// Default prefix of exported file names.
pub const DEFAULT_FILENAME_PREFIX: &str = "edited-image";

/// An encoded export, ready to hand to a share or download target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    /// `<prefix>-<unix millis>.png`.
    pub filename: String,
    /// PNG bytes.
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// The PNG as a `data:` URL.
    pub fn data_url(&self) -> String {
        png_data_url(&self.bytes)
    }
}

/// Straight-alpha RGBA8 copy of a frame.
pub fn straight_rgba(frame: &FrameRGBA) -> PhotoveilResult<Vec<u8>> {
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.width == 0 || frame.height == 0 || frame.data.len() != expected {
        return Err(PhotoveilError::export(format!(
            "frame {}x{} does not match {} data bytes",
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }
    let mut out = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut out);
    }
    Ok(out)
}

/// Encode a frame as PNG.
pub fn encode_png(frame: &FrameRGBA) -> PhotoveilResult<Vec<u8>> {
    let rgba = straight_rgba(frame)?;
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            &rgba,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("encode {}x{} png", frame.width, frame.height))?;
    Ok(out)
}

pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:{PNG_MIME};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// File name for an export taken at `at`.
pub fn export_filename(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.png", at.timestamp_millis())
}

/// Encode `frame` and name it after the current time.
#[tracing::instrument(skip_all, fields(width = frame.width, height = frame.height))]
pub fn export_png(frame: &FrameRGBA, prefix: &str) -> PhotoveilResult<ExportedImage> {
    export_png_at(frame, prefix, Utc::now())
}

/// Like [`export_png`] with an explicit timestamp.
pub fn export_png_at(
    frame: &FrameRGBA,
    prefix: &str,
    at: DateTime<Utc>,
) -> PhotoveilResult<ExportedImage> {
    let bytes = encode_png(frame)?;
    let filename = export_filename(prefix, at);
    tracing::debug!(%filename, bytes = bytes.len(), "encoded export");
    Ok(ExportedImage { filename, bytes })
}

#[cfg(test)]
#[path = "../../tests/unit/export/png.rs"]
mod tests;
