//! Photoveil is an overlay transform and compositing engine.
//!
//! Users place semi-transparent overlays (CSS colors, gradients or images) on a photo, move,
//! scale, rotate, flip and blend them with pointer, touch, wheel and keyboard gestures, and export
//! the composited result as a PNG. The live preview and the raster export share one layout model,
//! so what is exported matches what was edited.
//!
//! - Drive an [`EditorSession`] with [`InputEvent`]s and draw its [`PreviewFrame`]
//! - Export with [`EditorSession::export`] or render an [`EditDocument`] with [`render_document`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod config;
pub(crate) mod export;
pub(crate) mod geometry;
pub(crate) mod gesture;
pub(crate) mod render;
pub(crate) mod scene;
/// Session facade wiring store, gestures, preview and export together.
pub mod session;
pub(crate) mod snap;
pub(crate) mod store;

pub use crate::foundation::core::{Affine, PixelSize, Point, Rect, Rgba8Premul, Size, Vec2};
pub use crate::foundation::error::{PhotoveilError, PhotoveilResult};
pub use crate::foundation::math::{SCALE_MAX, SCALE_MIN, normalize_degrees};

pub use crate::assets::color::{CssColor, parse_css_color};
pub use crate::assets::decode::{DecodedAsset, PreparedImage, PreparedSvg, decode_asset};
pub use crate::assets::gradient::{
    CssGradient, FlatFill, GradientPaint, GradientShape, LinearDirection, RadialExtent,
};
pub use crate::assets::resolve::{DEFAULT_ASSET_ROUTE, resolve_asset_url};
pub use crate::assets::store::{AspectRatioCache, AspectState, AssetLoader, FsAssetLoader};
pub use crate::config::EngineConfig;
pub use crate::export::png::{ExportedImage, encode_png, export_filename, export_png, png_data_url};
pub use crate::export::share::{
    Delivery, DownloadTarget, NoShare, ShareOutcome, ShareTarget, share_or_download,
};
pub use crate::geometry::canvas::{CanvasGeometry, fit_display_box};
pub use crate::geometry::kernel::{
    AnchoredScale, AnchoredScaleInput, Corner, compute_cover_box, corners_world,
    resolve_anchored_scale, resolve_rotation, rotate_point,
};
pub use crate::gesture::controller::{GestureConfig, GestureController, Interaction, SceneView};
pub use crate::gesture::handles::{Handle, HandleLayout};
pub use crate::gesture::input::{
    KeyInput, Modifiers, MouseInput, PointerSample, TouchInput, TouchPoint, WheelInput,
};
pub use crate::render::FrameRGBA;
pub use crate::render::compositor::{
    Compositor, OverlayAssets, decode_overlay_assets, load_base_image, render_document,
};
pub use crate::render::preview::{PreviewFrame, PreviewLayer, PreviewRenderer};
pub use crate::scene::blend::{BlendMode, CompositeOperation};
pub use crate::scene::document::EditDocument;
pub use crate::scene::model::{
    CatalogItem, Overlay, OverlayId, OverlayKind, OverlayPatch, active_catalog_items,
};
pub use crate::session::{EditorSession, InputEvent};
pub use crate::snap::{SnapGuides, SnapResolver, SnapResult, SnapX, SnapY};
pub use crate::store::overlay_store::OverlayStore;
