//! Off-screen compositing of the base photo and its overlays.
//!
//! Layout mirrors the live preview: every overlay is sized by the same cover-fit rule, placed
//! relative to the photo center and transformed translate → rotate → scale. The photo and every
//! overlay are drawn into one render context; each overlay is its own layer, clipped to the photo
//! rectangle and mixed onto the backdrop with its opacity and blend mode.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::assets::decode::{DecodedAsset, MAX_RASTER_DIM, PreparedImage};
use crate::assets::gradient::FlatFill;
use crate::assets::store::AssetLoader;
use crate::foundation::core::{Affine, PixelSize, Rect, Size};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::geometry::kernel::compute_cover_box;
use crate::render::FrameRGBA;
use crate::render::raster::{Layer, LayerFill, Rasterizer, prepared_image_paint};
use crate::scene::document::EditDocument;
use crate::scene::model::{Overlay, OverlayId, OverlayKind};

/// Decoded image assets by overlay id.
pub type OverlayAssets = HashMap<OverlayId, DecodedAsset>;

/// Renders overlays onto a base photo.
#[derive(Default)]
pub struct Compositor {
    raster: Rasterizer,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite `overlays` (bottom to top) onto `base`.
    ///
    /// `display` is the on-screen size of the photo the overlay positions were recorded against.
    /// Image overlays without an entry in `assets` are skipped, as are overlays whose fill cannot
    /// be parsed. Surface problems (empty or oversized photo) fail the whole render.
    #[tracing::instrument(
        skip_all,
        fields(width = base.width, height = base.height, overlays = overlays.len())
    )]
    pub fn composite(
        &mut self,
        base: &PreparedImage,
        display: Size,
        overlays: &[Overlay],
        assets: &OverlayAssets,
    ) -> PhotoveilResult<FrameRGBA> {
        if !(display.width.is_finite()
            && display.height.is_finite()
            && display.width > 0.0
            && display.height > 0.0)
        {
            return Err(PhotoveilError::render(format!(
                "display box must be non-empty, got {}x{}",
                display.width, display.height
            )));
        }
        let expected = (base.width as usize) * (base.height as usize) * 4;
        if base.rgba8_premul.len() != expected {
            return Err(PhotoveilError::render("base image byte len mismatch"));
        }
        let photo = prepared_image_paint(base)?;

        let image = Size::new(f64::from(base.width), f64::from(base.height));
        let k = (image.width / display.width, image.height / display.height);
        let mut layers = Vec::with_capacity(overlays.len());

        for overlay in overlays {
            if overlay.opacity <= 0.0 {
                continue;
            }
            if let Err(e) = overlay.validate() {
                tracing::warn!(overlay = %overlay.id, error = %e, "skipping invalid overlay");
                continue;
            }
            let Some((local, fill)) = self.layer_fill(overlay, image, assets)? else {
                continue;
            };

            let (sx, sy) = overlay.signed_scale();
            let transform = Affine::translate((
                image.width / 2.0 + overlay.x * k.0,
                image.height / 2.0 + overlay.y * k.1,
            )) * Affine::rotate(overlay.rotation.to_radians())
                * Affine::scale_non_uniform(sx, sy);

            let op = overlay.blend_mode.composite_operation();
            tracing::debug!(overlay = %overlay.id, op = op.name(), "queued overlay layer");
            layers.push(Layer {
                transform,
                local,
                fill,
                opacity: overlay.opacity as f32,
                blend: op.blend_mode(),
            });
        }

        let pixmap = self.raster.render(&photo, &layers)?;
        Ok(FrameRGBA {
            width: base.width,
            height: base.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    /// Local box and paint for one overlay, or `None` when it has nothing to draw.
    fn layer_fill(
        &self,
        overlay: &Overlay,
        image: Size,
        assets: &OverlayAssets,
    ) -> PhotoveilResult<Option<(Rect, LayerFill)>> {
        match overlay.kind {
            OverlayKind::Flat => {
                let fill = match FlatFill::parse(&overlay.value) {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::warn!(overlay = %overlay.id, error = %e, "skipping flat overlay");
                        return Ok(None);
                    }
                };
                let side = image.width.max(image.height);
                let local = centered_rect(Size::new(side, side));
                let fill = match fill {
                    FlatFill::Solid(c) => LayerFill::Solid(c),
                    FlatFill::Gradient(g) => LayerFill::Gradient(g.paint(local)),
                };
                Ok(Some((local, fill)))
            }
            OverlayKind::Image => {
                let Some(asset) = assets.get(&overlay.id) else {
                    return Ok(None);
                };
                let cover = compute_cover_box(Some(asset.aspect_ratio()), image.width, image.height);
                let local = centered_rect(cover);
                let paint = match asset {
                    DecodedAsset::Bitmap(img) => prepared_image_paint(img)?,
                    DecodedAsset::Svg(svg) => {
                        let px = |v: f64| {
                            (v * overlay.scale)
                                .round()
                                .clamp(1.0, f64::from(MAX_RASTER_DIM)) as u32
                        };
                        let img = svg.rasterize(px(cover.width), px(cover.height))?;
                        prepared_image_paint(&img)?
                    }
                };
                Ok(Some((local, LayerFill::Image(paint))))
            }
        }
    }
}

fn centered_rect(size: Size) -> Rect {
    Rect::new(
        -size.width / 2.0,
        -size.height / 2.0,
        size.width / 2.0,
        size.height / 2.0,
    )
}

/// Load every image overlay's asset in parallel.
///
/// All loads run to completion; failures are logged and the overlay is left out of the map.
#[tracing::instrument(skip_all, fields(overlays = overlays.len()))]
pub fn decode_overlay_assets(overlays: &[Overlay], loader: &dyn AssetLoader) -> OverlayAssets {
    let results: Vec<(OverlayId, PhotoveilResult<DecodedAsset>)> = overlays
        .par_iter()
        .filter(|o| o.kind == OverlayKind::Image)
        .map(|o| (o.id, loader.load(&o.value)))
        .collect();

    let mut out = OverlayAssets::with_capacity(results.len());
    for (id, res) in results {
        match res {
            Ok(asset) => {
                out.insert(id, asset);
            }
            Err(e) => tracing::warn!(overlay = %id, error = %e, "overlay asset failed to load"),
        }
    }
    out
}

/// Load the base photo as a bitmap; SVG photos are rasterized at their natural size.
pub fn load_base_image(loader: &dyn AssetLoader, reference: &str) -> PhotoveilResult<PreparedImage> {
    match loader.load(reference)? {
        DecodedAsset::Bitmap(img) => Ok(img),
        DecodedAsset::Svg(svg) => {
            let (w, h) = svg.natural_size();
            svg.rasterize(w.ceil() as u32, h.ceil() as u32)
        }
    }
}

/// Load, lay out and composite a whole edit document.
#[tracing::instrument(skip_all, fields(base = %doc.base_image, overlays = doc.overlays.len()))]
pub fn render_document(
    doc: &EditDocument,
    loader: &dyn AssetLoader,
    viewport_fit: f64,
) -> PhotoveilResult<FrameRGBA> {
    doc.validate()?;
    let base = load_base_image(loader, &doc.base_image)?;
    let display = doc.display_size(PixelSize::new(base.width, base.height)?, viewport_fit)?;
    let assets = decode_overlay_assets(&doc.overlays, loader);
    Compositor::new().composite(&base, display, &doc.overlays, &assets)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
