use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;

use super::*;
use crate::assets::decode::decode_image;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "photoveil_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

struct CountingLoader {
    calls: AtomicUsize,
}

impl AssetLoader for CountingLoader {
    fn load(&self, url: &str) -> PhotoveilResult<DecodedAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(PhotoveilError::asset("broken asset"));
        }
        Ok(DecodedAsset::Bitmap(decode_image(&png_bytes(4, 2))?))
    }
}

fn image_overlay(id: u64, value: &str) -> Overlay {
    Overlay::new(OverlayId(id), OverlayKind::Image, value)
}

#[test]
fn fs_loader_strips_route_and_decodes() {
    let tmp = temp_dir("fs_loader");
    std::fs::create_dir_all(tmp.join("uploads")).unwrap();
    std::fs::write(tmp.join("uploads/a.png"), png_bytes(6, 3)).unwrap();

    let loader = FsAssetLoader::new(&tmp);
    let asset = loader.load("/objects/uploads/a.png").unwrap();
    assert!((asset.aspect_ratio() - 2.0).abs() < 1e-12);

    let asset = loader.load("uploads/a.png").unwrap();
    assert!(matches!(asset, DecodedAsset::Bitmap(_)));

    assert!(loader.load("/objects/../secret.png").is_err());
    assert!(loader.load("https://example.com/a.png").is_err());
    assert!(loader.load("/objects/missing.png").is_err());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn fs_loader_decodes_data_urls() {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(2, 4));
    let loader = FsAssetLoader::new(".");
    let asset = loader
        .load(&format!("data:image/png;base64,{encoded}"))
        .unwrap();
    assert!((asset.aspect_ratio() - 0.5).abs() < 1e-12);
}

#[test]
fn data_url_parsing() {
    let (mt, bytes) = decode_data_url("data:,hello%20world").unwrap();
    assert_eq!(mt, "text/plain");
    assert_eq!(bytes, b"hello world");

    let (mt, bytes) = decode_data_url("DATA:Image/SVG+XML;base64,PHN2Zz4=").unwrap();
    assert_eq!(mt, "image/svg+xml");
    assert_eq!(bytes, b"<svg>");

    assert!(decode_data_url("data:image/png;base64").is_err());
    assert!(decode_data_url("http://x").is_err());
}

#[test]
fn cache_seeds_from_catalog_and_skips_flat() {
    let mut cache = AspectRatioCache::new();
    cache.register(&image_overlay(1, "a.png"), DEFAULT_ASSET_ROUTE, Some(1.5));
    cache.register(
        &Overlay::new(OverlayId(2), OverlayKind::Flat, "#fff"),
        DEFAULT_ASSET_ROUTE,
        None,
    );
    cache.register(&image_overlay(3, "b.png"), DEFAULT_ASSET_ROUTE, Some(f64::NAN));

    assert_eq!(cache.get(OverlayId(1)), Some(1.5));
    assert_eq!(cache.state(OverlayId(2)), None);
    assert_eq!(cache.state(OverlayId(3)), Some(&AspectState::Pending));
    assert_eq!(cache.pending(), vec![OverlayId(3)]);
}

#[test]
fn cache_decodes_each_id_once() {
    let loader = CountingLoader {
        calls: AtomicUsize::new(0),
    };
    let mut cache = AspectRatioCache::new();
    cache.register(&image_overlay(1, "a.png"), DEFAULT_ASSET_ROUTE, None);
    cache.register(&image_overlay(2, "broken.png"), DEFAULT_ASSET_ROUTE, None);

    assert_eq!(cache.resolve_pending(&loader), 1);
    assert_eq!(cache.resolve_pending(&loader), 0);
    assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

    assert_eq!(cache.get(OverlayId(1)), Some(2.0));
    assert!(matches!(cache.state(OverlayId(2)), Some(AspectState::Failed(_))));
    assert_eq!(cache.get(OverlayId(2)), None);

    cache.register(&image_overlay(1, "a.png"), DEFAULT_ASSET_ROUTE, Some(9.0));
    assert_eq!(cache.get(OverlayId(1)), Some(2.0));

    cache.forget(OverlayId(1));
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn new_asset_url_resets_the_cached_ratio() {
    let loader = CountingLoader {
        calls: AtomicUsize::new(0),
    };
    let mut cache = AspectRatioCache::new();
    cache.register(&image_overlay(1, "a.png"), DEFAULT_ASSET_ROUTE, Some(1.5));
    assert_eq!(cache.get(OverlayId(1)), Some(1.5));

    cache.register(&image_overlay(1, "tall.png"), DEFAULT_ASSET_ROUTE, None);
    assert_eq!(cache.state(OverlayId(1)), Some(&AspectState::Pending));
    assert_eq!(cache.get(OverlayId(1)), None);

    assert_eq!(cache.resolve_pending(&loader), 1);
    assert_eq!(cache.get(OverlayId(1)), Some(2.0));

    cache.register(&image_overlay(1, "tall.png"), DEFAULT_ASSET_ROUTE, None);
    assert_eq!(cache.resolve_pending(&loader), 0);
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
}
