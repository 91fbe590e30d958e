//! One editing session: a base photo, its overlays and everything that acts on them.
//!
//! [`EditorSession`] owns the overlay store, the gesture controller, the canvas layout and the
//! aspect-ratio cache, and exposes the preview and export surfaces over the same state. Hosts feed
//! it DOM-shaped input and call [`EditorSession::frame_tick`] once per display frame.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::decode::PreparedImage;
use crate::assets::store::{AspectRatioCache, AssetLoader};
use crate::config::EngineConfig;
use crate::export::png::{ExportedImage, export_png};
use crate::export::share::{Delivery, DownloadTarget, ShareTarget, share_or_download};
use crate::foundation::core::{PixelSize, Point, Rect, Size};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::geometry::canvas::CanvasGeometry;
use crate::gesture::controller::{GestureController, Interaction, SceneView};
use crate::gesture::input::{KeyInput, MouseInput, TouchInput, WheelInput};
use crate::render::FrameRGBA;
use crate::render::compositor::{Compositor, decode_overlay_assets, load_base_image};
use crate::render::preview::{PreviewFrame, PreviewRenderer};
use crate::scene::document::{EditDocument, SizeDef};
use crate::scene::model::{CatalogItem, Overlay, OverlayId, OverlayKind, OverlayPatch};
use crate::store::overlay_store::OverlayStore;

/// Inbound input, as a host would forward it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "event", rename_all = "kebab-case")]
pub enum InputEvent {
    PointerDown(MouseInput),
    PointerMove(MouseInput),
    PointerUp,
    PointerCancel,
    TouchStart(TouchInput),
    TouchMove(TouchInput),
    /// Carries the touches still down.
    TouchEnd(TouchInput),
    TouchCancel,
    Wheel(WheelInput),
    KeyDown(KeyInput),
    KeyUp(KeyInput),
    /// Display frame boundary; applies coalesced moves.
    FrameTick,
}

struct BasePhoto {
    reference: String,
    image: PreparedImage,
}

pub struct EditorSession {
    config: EngineConfig,
    loader: Arc<dyn AssetLoader>,
    store: OverlayStore,
    controller: GestureController,
    aspects: AspectRatioCache,
    preview: PreviewRenderer,
    compositor: Compositor,
    base: Option<BasePhoto>,
    canvas: Option<CanvasGeometry>,
}

impl EditorSession {
    pub fn new(config: EngineConfig, loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            store: OverlayStore::with_history_capacity(config.history_capacity),
            controller: GestureController::new(config.gesture_config()),
            preview: PreviewRenderer::new(config.asset_route.clone(), config.rotate_handle_offset),
            aspects: AspectRatioCache::new(),
            compositor: Compositor::new(),
            base: None,
            canvas: None,
            config,
            loader,
        }
    }

    /// Restore a session from a saved document. The photo is laid out at the document's display
    /// size, centered in a viewport of the same size.
    pub fn from_document(
        doc: &EditDocument,
        config: EngineConfig,
        loader: Arc<dyn AssetLoader>,
    ) -> PhotoveilResult<Self> {
        doc.validate()?;
        let mut session = Self::new(config, loader);
        let image = load_base_image(session.loader.as_ref(), &doc.base_image)?;
        let pixels = PixelSize::new(image.width, image.height)?;
        let display = doc.display_size(pixels, session.config.viewport_fit)?;
        let center = Point::new(display.width / 2.0, display.height / 2.0);
        session.canvas = Some(CanvasGeometry::new(pixels, display, center)?);
        session.base = Some(BasePhoto {
            reference: doc.base_image.clone(),
            image,
        });
        session.store =
            OverlayStore::from_overlays(doc.overlays.clone(), session.config.history_capacity)?;
        session.sync_aspects(None);
        Ok(session)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    pub fn overlays(&self) -> &[Overlay] {
        self.store.overlays()
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.store.selected()
    }

    pub fn interaction(&self) -> &Interaction {
        self.controller.interaction()
    }

    pub fn canvas(&self) -> Option<&CanvasGeometry> {
        self.canvas.as_ref()
    }

    pub fn aspects(&self) -> &AspectRatioCache {
        &self.aspects
    }

    // --- Base photo and layout ---

    /// Load the base photo and fit it into `viewport` (screen coordinates).
    #[tracing::instrument(skip(self))]
    pub fn set_base_image(&mut self, reference: &str, viewport: Rect) -> PhotoveilResult<PixelSize> {
        let image = load_base_image(self.loader.as_ref(), reference)?;
        let pixels = PixelSize::new(image.width, image.height)?;
        let canvas = CanvasGeometry::fit_in_viewport(pixels, viewport, self.config.viewport_fit)?;
        tracing::debug!(
            width = pixels.width,
            height = pixels.height,
            display_w = canvas.display_size().width,
            display_h = canvas.display_size().height,
            "base image loaded"
        );
        self.canvas = Some(canvas);
        self.base = Some(BasePhoto {
            reference: reference.to_string(),
            image,
        });
        Ok(pixels)
    }

    /// Refit the photo after the viewport moved or resized.
    pub fn set_viewport(&mut self, viewport: Rect) -> PhotoveilResult<()> {
        let Some(canvas) = self.canvas else {
            return Ok(());
        };
        self.canvas = Some(CanvasGeometry::fit_in_viewport(
            canvas.image_size(),
            viewport,
            self.config.viewport_fit,
        )?);
        Ok(())
    }

    /// Drop the base photo together with every overlay.
    pub fn clear_base_image(&mut self) {
        self.controller.cancel_interaction(&mut self.store);
        self.store.clear();
        self.aspects.clear();
        self.base = None;
        self.canvas = None;
    }

    // --- Overlay edits ---

    pub fn add_overlay(&mut self, kind: OverlayKind, value: impl Into<String>) -> OverlayId {
        let id = self.store.add(kind, value);
        self.sync_aspects(None);
        id
    }

    /// Add a catalog pick; a known aspect ratio seeds the cache and skips decoding.
    pub fn add_from_catalog(&mut self, item: &CatalogItem) -> OverlayId {
        let id = self.store.add_from_catalog(item);
        self.sync_aspects(Some((id, item.aspect_ratio)));
        id
    }

    pub fn update_overlay(&mut self, id: OverlayId, patch: &OverlayPatch) -> bool {
        let changed = self.store.update(id, patch);
        if changed {
            // A new `value` may point at a different image.
            self.sync_aspects(None);
        }
        changed
    }

    pub fn remove_overlay(&mut self, id: OverlayId) -> bool {
        self.store.remove(id)
    }

    pub fn select(&mut self, id: Option<OverlayId>) {
        self.store.select(id);
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.store.undo();
        self.sync_aspects(None);
        changed
    }

    /// Register image overlays the cache has not seen or whose asset changed. Entries outlive
    /// their overlay so an undone delete does not decode again.
    fn sync_aspects(&mut self, seed: Option<(OverlayId, Option<f64>)>) {
        for o in self.store.overlays() {
            let s = seed.and_then(|(id, r)| if id == o.id { r } else { None });
            self.aspects.register(o, &self.config.asset_route, s);
        }
    }

    /// Decode pending image overlays to learn their aspect ratios.
    pub fn resolve_aspects(&mut self) -> usize {
        self.aspects.resolve_pending(self.loader.as_ref())
    }

    // --- Input ---

    /// Route one input event. Returns `true` when overlay state or chrome changed.
    /// Without a base photo every event is ignored.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        let Some(canvas) = self.canvas.as_ref() else {
            return false;
        };
        let view = SceneView {
            canvas,
            aspects: &self.aspects,
        };
        let store = &mut self.store;
        let c = &mut self.controller;
        let changed = match event {
            InputEvent::PointerDown(m) => c.pointer_down(store, &view, m),
            InputEvent::PointerMove(m) => c.pointer_move(m),
            InputEvent::PointerUp => c.pointer_up(store, &view),
            InputEvent::PointerCancel => c.pointer_cancel(store, &view),
            InputEvent::TouchStart(t) => c.touch_start(store, &view, t),
            InputEvent::TouchMove(t) => c.touch_move(t),
            InputEvent::TouchEnd(t) => c.touch_end(store, &view, t),
            InputEvent::TouchCancel => c.touch_cancel(store, &view),
            InputEvent::Wheel(w) => c.wheel(store, w),
            InputEvent::KeyDown(k) => c.key_down(store, k),
            InputEvent::KeyUp(k) => c.key_up(k),
            InputEvent::FrameTick => c.frame_tick(store, &view),
        };
        if matches!(event, InputEvent::KeyDown(_)) {
            // Ctrl/Cmd+Z may bring back image overlays.
            self.sync_aspects(None);
        }
        changed
    }

    pub fn frame_tick(&mut self) -> bool {
        self.handle(&InputEvent::FrameTick)
    }

    // --- Output ---

    /// Current live preview, or `None` without a base photo.
    pub fn preview(&self) -> Option<PreviewFrame> {
        let canvas = self.canvas.as_ref()?;
        let view = SceneView {
            canvas,
            aspects: &self.aspects,
        };
        Some(self.preview.render(
            self.store.overlays(),
            self.store.selected(),
            &view,
            self.controller.active_guides(),
            self.controller.overlays_hidden(),
        ))
    }

    /// Composite the photo and overlays at the photo's full resolution.
    #[tracing::instrument(skip_all, fields(overlays = self.store.len()))]
    pub fn composite(&mut self) -> PhotoveilResult<FrameRGBA> {
        let (Some(base), Some(canvas)) = (self.base.as_ref(), self.canvas.as_ref()) else {
            return Err(PhotoveilError::render("no base image loaded"));
        };
        let overlays = self.store.overlays();
        let assets = decode_overlay_assets(overlays, self.loader.as_ref());
        self.compositor
            .composite(&base.image, canvas.display_size(), overlays, &assets)
    }

    /// Composite and encode as PNG.
    pub fn export(&mut self) -> PhotoveilResult<ExportedImage> {
        let frame = self.composite()?;
        export_png(&frame, &self.config.export_prefix)
    }

    /// Export, then share or fall back to a download.
    pub fn export_and_deliver(
        &mut self,
        share: &dyn ShareTarget,
        download: &DownloadTarget,
    ) -> PhotoveilResult<Delivery> {
        let image = self.export()?;
        share_or_download(&image, share, download)
    }

    /// Snapshot the session as a document.
    pub fn document(&self) -> Option<EditDocument> {
        let base = self.base.as_ref()?;
        let display: Size = self.canvas.as_ref()?.display_size();
        Some(EditDocument {
            base_image: base.reference.clone(),
            display: Some(SizeDef {
                width: display.width,
                height: display.height,
            }),
            viewport: None,
            overlays: self.store.overlays().to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/session/mod.rs"]
mod tests;
