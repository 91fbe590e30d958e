use std::sync::Arc;

use vello_cpu::kurbo::Shape;
use vello_cpu::peniko::{self, ImageQuality};

use crate::assets::color::CssColor;
use crate::assets::decode::PreparedImage;
use crate::assets::gradient::GradientPaint;
use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};

/// Largest surface edge the rasterizer accepts.
pub const MAX_SURFACE_DIM: u32 = u16::MAX as u32;

/// Bitmap paint ready to be drawn, with the size of its pixel grid.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// What one overlay layer fills its local box with.
#[derive(Clone)]
pub(crate) enum LayerFill {
    /// Uniform color.
    Solid(CssColor),
    /// Gradient resolved against the local box.
    Gradient(GradientPaint),
    /// Bitmap stretched over the box.
    Image(ImagePaint),
}

/// One overlay as the rasterizer draws it: a filled box in layer space, mixed onto everything
/// below with `blend` at `opacity`.
#[derive(Clone)]
pub(crate) struct Layer {
    pub(crate) transform: Affine,
    pub(crate) local: Rect,
    pub(crate) fill: LayerFill,
    pub(crate) opacity: f32,
    pub(crate) blend: peniko::BlendMode,
}

/// Owns a reusable `vello_cpu` context and renders a photo with its overlay layers.
#[derive(Default)]
pub(crate) struct Rasterizer {
    ctx: Option<vello_cpu::RenderContext>,
}

impl Rasterizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> PhotoveilResult<R>,
    ) -> PhotoveilResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Draw `base` pixel for pixel, then each layer bottom to top.
    ///
    /// Every layer is pushed with a clip to the photo rectangle, so nothing spills past the
    /// photo, and is mixed onto the backdrop by the renderer with its own blend mode and opacity.
    pub(crate) fn render(
        &mut self,
        base: &ImagePaint,
        layers: &[Layer],
    ) -> PhotoveilResult<vello_cpu::Pixmap> {
        let (w, h) = surface_dims(base.width, base.height)?;
        let photo = vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h));
        let clip = photo.to_path(0.1);

        self.with_ctx_mut(w, h, |ctx| {
            ctx.set_paint(base.paint.clone().with_quality(ImageQuality::Low));
            ctx.fill_rect(&photo);

            for layer in layers {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.push_layer(
                    Some(&clip),
                    Some(layer.blend),
                    Some(layer.opacity.clamp(0.0, 1.0)),
                    None,
                    None,
                );
                fill_box(ctx, layer.transform, layer.local, &layer.fill);
                ctx.pop_layer();
            }

            ctx.flush();
            let mut out = vello_cpu::Pixmap::new(w, h);
            ctx.render_to_pixmap(&mut out);
            Ok(out)
        })
    }
}

fn fill_box(ctx: &mut vello_cpu::RenderContext, transform: Affine, local: Rect, fill: &LayerFill) {
    let local_rect = vello_cpu::kurbo::Rect::new(local.x0, local.y0, local.x1, local.y1);
    match fill {
        LayerFill::Solid(c) => {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(c.0);
            ctx.fill_rect(&local_rect);
        }
        LayerFill::Gradient(g) => {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint_transform(affine_to_cpu(g.paint_transform));
            ctx.set_paint(g.gradient.clone());
            ctx.fill_rect(&local_rect);
        }
        LayerFill::Image(img) => {
            let (iw, ih) = (f64::from(img.width), f64::from(img.height));
            // Map the bitmap's pixel grid onto the local box.
            let fit = Affine::translate((local.x0, local.y0))
                * Affine::scale_non_uniform(local.width() / iw, local.height() / ih);
            ctx.set_transform(affine_to_cpu(transform * fit));
            ctx.set_paint(img.paint.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        }
    }
}

fn surface_dims(width: u32, height: u32) -> PhotoveilResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(PhotoveilError::render(format!(
            "surface must be non-empty, got {width}x{height}"
        )));
    }
    let w: u16 = width.try_into().map_err(|_| {
        PhotoveilError::render(format!("surface width {width} exceeds {MAX_SURFACE_DIM}"))
    })?;
    let h: u16 = height.try_into().map_err(|_| {
        PhotoveilError::render(format!("surface height {height} exceeds {MAX_SURFACE_DIM}"))
    })?;
    Ok((w, h))
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PhotoveilResult<vello_cpu::Pixmap> {
    let (w, h) = surface_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PhotoveilError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

/// Wrap premultiplied RGBA8 bytes as an image paint.
pub(crate) fn image_paint(bytes: &[u8], width: u32, height: u32) -> PhotoveilResult<ImagePaint> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(ImagePaint {
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: peniko::ImageSampler::default(),
        },
        width,
        height,
    })
}

/// Image paint for a decoded bitmap.
pub(crate) fn prepared_image_paint(img: &PreparedImage) -> PhotoveilResult<ImagePaint> {
    image_paint(&img.rgba8_premul, img.width, img.height)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
