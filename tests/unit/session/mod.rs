use std::collections::HashMap;

use super::*;
use crate::assets::decode::DecodedAsset;
use crate::assets::store::AspectState;
use crate::gesture::input::Modifiers;

/// Serves solid bitmaps by storage key, with or without the route prefix.
struct MapLoader(HashMap<&'static str, (u32, u32)>);

impl AssetLoader for MapLoader {
    fn load(&self, url: &str) -> PhotoveilResult<DecodedAsset> {
        let key = url.trim_start_matches("/objects/");
        let (w, h) = self
            .0
            .get(key)
            .copied()
            .ok_or_else(|| PhotoveilError::asset(format!("no asset '{url}'")))?;
        Ok(DecodedAsset::Bitmap(PreparedImage {
            width: w,
            height: h,
            rgba8_premul: Arc::new([0, 0, 255, 255].repeat((w * h) as usize)),
        }))
    }
}

fn loader() -> Arc<dyn AssetLoader> {
    Arc::new(MapLoader(HashMap::from([
        ("photo.png", (160, 120)),
        ("leaf.png", (30, 20)),
        ("tall.png", (20, 40)),
    ])))
}

fn viewport() -> Rect {
    // A 160x120 photo fits a 200x150 viewport at 80%: 160x120 display, no upscaling.
    Rect::new(0.0, 0.0, 200.0, 150.0)
}

fn session() -> EditorSession {
    let mut s = EditorSession::new(EngineConfig::default(), loader());
    s.set_base_image("photo.png", viewport()).unwrap();
    s
}

fn catalog_leaf() -> CatalogItem {
    CatalogItem {
        id: "leaf".to_string(),
        kind: OverlayKind::Image,
        value: "leaf.png".to_string(),
        order_index: 0,
        is_active: true,
        aspect_ratio: Some(1.5),
    }
}

#[test]
fn nothing_happens_without_a_base_image() {
    let mut s = EditorSession::new(EngineConfig::default(), loader());
    s.add_overlay(OverlayKind::Flat, "red");
    assert!(!s.handle(&InputEvent::PointerDown(MouseInput::primary(Point::new(
        10.0, 10.0
    )))));
    assert!(s.preview().is_none());
    assert!(matches!(s.composite(), Err(PhotoveilError::Render(_))));
    assert!(s.document().is_none());
}

#[test]
fn base_image_is_fitted_into_the_viewport() {
    let s = session();
    let canvas = s.canvas().unwrap();
    assert_eq!(canvas.display_size(), Size::new(160.0, 120.0));
    assert_eq!(canvas.display_center(), Point::new(100.0, 75.0));
}

#[test]
fn catalog_aspect_seeds_the_cache() {
    let mut s = session();
    let id = s.add_from_catalog(&catalog_leaf());
    assert_eq!(s.aspects().get(id), Some(1.5));
    assert_eq!(s.resolve_aspects(), 0);

    let frame = s.preview().unwrap();
    assert_eq!(frame.layers[0].outer.size, Size::new(180.0, 120.0));
    assert_eq!(frame.chrome.unwrap().id, id);
}

#[test]
fn replacing_an_image_value_drops_the_stale_aspect() {
    let mut s = session();
    let id = s.add_from_catalog(&catalog_leaf());
    assert_eq!(s.aspects().get(id), Some(1.5));

    let patch = OverlayPatch {
        value: Some("tall.png".to_string()),
        ..OverlayPatch::default()
    };
    assert!(s.update_overlay(id, &patch));
    assert_eq!(s.aspects().state(id), Some(&AspectState::Pending));

    assert_eq!(s.resolve_aspects(), 1);
    assert_eq!(s.aspects().get(id), Some(0.5));
    let frame = s.preview().unwrap();
    assert_eq!(frame.layers[0].outer.size, Size::new(160.0, 320.0));
}

#[test]
fn unseeded_images_resolve_once() {
    let mut s = session();
    let a = s.add_overlay(OverlayKind::Image, "leaf.png");
    let b = s.add_overlay(OverlayKind::Image, "missing.png");
    assert_eq!(s.aspects().state(a), Some(&AspectState::Pending));

    assert_eq!(s.resolve_aspects(), 1);
    assert_eq!(s.aspects().get(a), Some(1.5));
    assert!(matches!(s.aspects().state(b), Some(AspectState::Failed(_))));
    assert_eq!(s.resolve_aspects(), 0);
}

#[test]
fn drag_then_undo() {
    let mut s = session();
    let id = s.add_from_catalog(&catalog_leaf());
    let center = Point::new(100.0, 75.0);

    assert!(s.handle(&InputEvent::PointerDown(MouseInput::primary(center))));
    assert_eq!(s.interaction().name(), "dragging");
    s.handle(&InputEvent::PointerMove(MouseInput::primary(Point::new(
        130.0, 75.0,
    ))));
    assert!(s.frame_tick());
    assert!(s.handle(&InputEvent::PointerUp));
    assert!(s.interaction().is_idle());

    let o = s.store().get(id).unwrap();
    assert_eq!((o.x, o.y), (30.0, 0.0));

    assert!(s.undo());
    let o = s.store().get(id).unwrap();
    assert_eq!((o.x, o.y), (0.0, 0.0));
}

#[test]
fn keyboard_delete_and_undo_keep_the_cached_aspect() {
    let mut s = session();
    let id = s.add_from_catalog(&catalog_leaf());

    assert!(s.handle(&InputEvent::KeyDown(KeyInput::new("Delete", Modifiers::NONE))));
    assert!(s.overlays().is_empty());

    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    assert!(s.handle(&InputEvent::KeyDown(KeyInput::new("z", ctrl))));
    assert_eq!(s.overlays().len(), 1);
    assert_eq!(s.aspects().get(id), Some(1.5));
}

#[test]
fn peek_hides_the_preview() {
    let mut s = session();
    s.add_overlay(OverlayKind::Flat, "red");
    s.handle(&InputEvent::KeyDown(KeyInput::new(" ", Modifiers::NONE)));
    assert!(s.preview().unwrap().layers.is_empty());
    s.handle(&InputEvent::KeyUp(KeyInput::new(" ", Modifiers::NONE)));
    assert_eq!(s.preview().unwrap().layers.len(), 1);
}

#[test]
fn export_renders_at_photo_resolution() {
    let mut s = session();
    let id = s.add_overlay(OverlayKind::Flat, "red");
    s.update_overlay(
        id,
        &OverlayPatch {
            opacity: Some(1.0),
            blend_mode: Some(crate::scene::blend::BlendMode::Normal),
            ..OverlayPatch::default()
        },
    );

    let frame = s.composite().unwrap();
    assert_eq!((frame.width, frame.height), (160, 120));
    assert_eq!(frame.pixel(80, 60), Some([255, 0, 0, 255]));

    let out = s.export().unwrap();
    assert!(out.filename.starts_with("edited-image-"));
    assert!(out.filename.ends_with(".png"));
}

#[test]
fn document_round_trip() {
    let mut s = session();
    let id = s.add_from_catalog(&catalog_leaf());
    s.update_overlay(
        id,
        &OverlayPatch {
            rotation: Some(390.0),
            ..OverlayPatch::default()
        },
    );

    let doc = s.document().unwrap();
    assert_eq!(doc.base_image, "photo.png");
    let restored = EditorSession::from_document(&doc, EngineConfig::default(), loader()).unwrap();
    assert_eq!(restored.overlays(), s.overlays());
    assert_eq!(restored.overlays()[0].rotation, 30.0);
    assert_eq!(
        restored.canvas().unwrap().display_size(),
        Size::new(160.0, 120.0)
    );
    assert_eq!(restored.aspects().state(id), Some(&AspectState::Pending));
}

#[test]
fn clearing_the_base_removes_overlays() {
    let mut s = session();
    s.add_overlay(OverlayKind::Flat, "red");
    s.clear_base_image();
    assert!(s.overlays().is_empty());
    assert!(s.canvas().is_none());
    assert!(s.aspects().is_empty());
}

#[test]
fn input_events_deserialize_from_host_json() {
    let ev: InputEvent = serde_json::from_value(serde_json::json!({
        "type": "pointer-down",
        "event": { "position": { "x": 1.0, "y": 2.0 }, "shiftKey": true }
    }))
    .unwrap();
    let InputEvent::PointerDown(m) = ev else {
        panic!("expected pointer-down");
    };
    assert!(m.modifiers.shift);

    let ev: InputEvent =
        serde_json::from_value(serde_json::json!({ "type": "frame-tick" })).unwrap();
    assert_eq!(ev, InputEvent::FrameTick);
}
