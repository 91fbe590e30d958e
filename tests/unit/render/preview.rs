use super::*;
use crate::assets::store::AspectRatioCache;
use crate::foundation::core::PixelSize;
use crate::geometry::canvas::CanvasGeometry;
use crate::snap::{SnapResolver, SnapX};

fn canvas() -> CanvasGeometry {
    CanvasGeometry::new(
        PixelSize::new(1600, 1200).unwrap(),
        Size::new(800.0, 600.0),
        Point::new(400.0, 300.0),
    )
    .unwrap()
}

fn image(id: u64) -> Overlay {
    Overlay::new(OverlayId(id), OverlayKind::Image, "catalog/leaf.png")
}

#[test]
fn image_layer_matches_the_export_layout() {
    let canvas = canvas();
    let mut aspects = AspectRatioCache::new();
    let mut o = image(1);
    o.scale = 1.5;
    o.flip_h = true;
    o.rotation = 30.0;
    o.x = -20.0;
    aspects.register(&o, DEFAULT_ASSET_ROUTE, Some(1.5));
    let view = SceneView {
        canvas: &canvas,
        aspects: &aspects,
    };

    let layer = PreviewRenderer::default().layer(&o, &view);
    assert_eq!(layer.outer.size, Size::new(900.0, 600.0));
    assert_eq!(layer.rendered, Size::new(1350.0, 900.0));
    assert_eq!(layer.inner.scale_x, -1.5);
    assert_eq!(layer.inner.scale_y, 1.5);
    assert_eq!(layer.inner.transform(), "rotate(30deg) scale(-1.5, 1.5)");

    let outer = layer.outer.css();
    assert!(outer.contains("width: 900px; height: 600px;"), "{outer}");
    assert!(outer.contains("translate(calc(-50% + -20px), calc(-50% + 0px))"), "{outer}");
    assert!(outer.contains("mix-blend-mode: screen;"), "{outer}");
    assert!(outer.contains("opacity: 0.8;"), "{outer}");

    let inner = layer.inner.css();
    assert!(inner.contains("background-image: url(\"/objects/catalog/leaf.png\")"), "{inner}");
    assert!(inner.contains("background-size: cover;"), "{inner}");
    assert!(inner.contains("background-position: center;"), "{inner}");
}

#[test]
fn pending_image_and_flat_fill_use_the_square_box() {
    let canvas = canvas();
    let aspects = AspectRatioCache::new();
    let view = SceneView {
        canvas: &canvas,
        aspects: &aspects,
    };
    let r = PreviewRenderer::default();

    let pending = r.layer(&image(1), &view);
    assert_eq!(pending.outer.size, Size::new(800.0, 800.0));

    let flat = Overlay::new(
        OverlayId(2),
        OverlayKind::Flat,
        "linear-gradient(45deg, red, blue)",
    );
    let layer = r.layer(&flat, &view);
    assert_eq!(layer.outer.size, Size::new(800.0, 800.0));
    assert!(
        layer
            .inner
            .css()
            .ends_with("background: linear-gradient(45deg, red, blue);")
    );
}

#[test]
fn frame_carries_chrome_for_the_selection_and_guides() {
    let canvas = canvas();
    let aspects = AspectRatioCache::new();
    let view = SceneView {
        canvas: &canvas,
        aspects: &aspects,
    };
    let mut a = Overlay::new(OverlayId(1), OverlayKind::Flat, "red");
    a.scale = 0.5;
    let b = Overlay::new(OverlayId(2), OverlayKind::Flat, "blue");
    let snap = SnapResolver::default().resolve(
        Point::new(3.0, 90.0),
        Size::new(400.0, 400.0),
        canvas.display_size(),
    );
    assert_eq!(snap.x, Some(SnapX::Center));

    let frame = PreviewRenderer::default().render(
        &[a, b],
        Some(OverlayId(1)),
        &view,
        snap.guides(canvas.display_size()),
        false,
    );
    assert_eq!(frame.display, Size::new(800.0, 600.0));
    assert_eq!(frame.layers.len(), 2);
    assert_eq!(frame.layers[0].id, OverlayId(1));

    let chrome = frame.chrome.unwrap();
    assert_eq!(chrome.id, OverlayId(1));
    assert_eq!(chrome.handles.corners[0], Point::new(-200.0, -200.0));
    assert_eq!(chrome.handles.rotate, Point::new(0.0, -230.0));
    assert_eq!(frame.guides.vertical, Some(0.0));
}

#[test]
fn hidden_overlays_produce_nothing() {
    let canvas = canvas();
    let aspects = AspectRatioCache::new();
    let view = SceneView {
        canvas: &canvas,
        aspects: &aspects,
    };
    let a = Overlay::new(OverlayId(1), OverlayKind::Flat, "red");
    let guides = SnapGuides {
        vertical: Some(0.0),
        horizontal: None,
    };
    let frame = PreviewRenderer::default().render(&[a], Some(OverlayId(1)), &view, guides, true);
    assert!(frame.layers.is_empty());
    assert!(frame.chrome.is_none());
    assert!(frame.guides.is_empty());
}

#[test]
fn css_numbers_are_compact() {
    assert_eq!(css_num(12.0), "12");
    assert_eq!(css_num(-0.0001), "0");
    assert_eq!(css_num(1.23456), "1.235");
    assert_eq!(escape_css_string("a\"b\\c"), "a\\\"b\\\\c");
}
