use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine as _;
use rayon::prelude::*;

use crate::assets::decode::{DecodedAsset, decode_asset};
use crate::assets::resolve::{
    AssetRef, DEFAULT_ASSET_ROUTE, classify, normalize_rel_path, resolve_asset_url,
};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::scene::model::{Overlay, OverlayId, OverlayKind};

/// Source of decoded overlay assets, keyed by resolved URL.
pub trait AssetLoader: Send + Sync {
    /// Fetch and decode the asset behind `url`.
    fn load(&self, url: &str) -> PhotoveilResult<DecodedAsset>;
}

/// Loads route-prefixed references from a directory and decodes inline `data:` URLs.
///
/// `/objects/a/b.png` (with route `/objects/`) maps to `<root>/a/b.png`. Remote and `blob:` URLs
/// are rejected.
#[derive(Clone, Debug)]
pub struct FsAssetLoader {
    root: PathBuf,
    route: String,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_route(root, DEFAULT_ASSET_ROUTE)
    }

    pub fn with_route(root: impl Into<PathBuf>, route: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            route: route.into(),
        }
    }

    /// Root directory that storage keys resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Map a rooted reference to a path relative to the root.
    fn rel_path_for(&self, rooted: &str) -> PhotoveilResult<String> {
        let route = self.route.trim_end_matches('/');
        let rest = rooted
            .strip_prefix(route)
            .filter(|r| route.is_empty() || r.starts_with('/'))
            .unwrap_or(rooted);
        normalize_rel_path(rest.trim_start_matches('/'))
    }

    fn read_bytes(&self, norm_path: &str) -> PhotoveilResult<Vec<u8>> {
        let path = self.root.join(Path::new(norm_path));
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(PhotoveilError::from)
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, url: &str) -> PhotoveilResult<DecodedAsset> {
        let resolved = resolve_asset_url(url, &self.route);
        match classify(&resolved) {
            AssetRef::Remote(u) | AssetRef::Blob(u) => Err(PhotoveilError::asset(format!(
                "cannot load '{u}' from the filesystem"
            ))),
            AssetRef::Data(u) => {
                let (media_type, bytes) = decode_data_url(u)?;
                decode_asset(&bytes, Some(&media_type))
            }
            AssetRef::Rooted(p) => {
                let norm = self.rel_path_for(p)?;
                let bytes = self.read_bytes(&norm)?;
                decode_asset(&bytes, Some(&norm))
            }
        }
    }
}

/// Split a `data:` URL into its media type and payload bytes.
///
/// Base64 payloads are decoded; other payloads are percent-decoded.
pub fn decode_data_url(url: &str) -> PhotoveilResult<(String, Vec<u8>)> {
    let body = url
        .get(..5)
        .filter(|p| p.eq_ignore_ascii_case("data:"))
        .map(|_| &url[5..])
        .ok_or_else(|| PhotoveilError::asset("not a data: URL"))?;
    let (meta, payload) = body
        .split_once(',')
        .ok_or_else(|| PhotoveilError::asset("data: URL has no payload separator"))?;

    let (media_type, is_base64) = match meta.strip_suffix(";base64") {
        Some(m) => (m, true),
        None => (meta, false),
    };
    let media_type = if media_type.is_empty() {
        "text/plain".to_owned()
    } else {
        media_type.to_ascii_lowercase()
    };

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .context("decode base64 data: URL payload")?
    } else {
        percent_decode(payload)
    };
    Ok((media_type, bytes))
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(v) = u8::from_str_radix(hex, 16)
        {
            out.push(v);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Resolution state of one overlay's intrinsic aspect ratio.
#[derive(Clone, Debug, PartialEq)]
pub enum AspectState {
    /// Registered, not yet decoded.
    Pending,
    /// Natural width / height.
    Ready(f64),
    /// Decode failed; the overlay falls back to square sizing.
    Failed(String),
}

#[derive(Clone, Debug)]
struct AspectEntry {
    url: String,
    state: AspectState,
}

/// Per-overlay memo of image aspect ratios.
///
/// Each overlay id is decoded at most once per asset URL; flat overlays are never registered.
#[derive(Clone, Debug, Default)]
pub struct AspectRatioCache {
    entries: HashMap<OverlayId, AspectEntry>,
}

impl AspectRatioCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image overlay. A valid `seed` (from the catalog) marks it ready without
    /// decoding. An id already registered for the same asset URL is left untouched; a new URL
    /// replaces the entry, so the old ratio never outlives its asset.
    pub fn register(&mut self, overlay: &Overlay, route: &str, seed: Option<f64>) {
        if overlay.kind != OverlayKind::Image {
            return;
        }
        let url = resolve_asset_url(&overlay.value, route);
        match self.entries.get(&overlay.id) {
            Some(entry) if entry.url == url => return,
            Some(_) => tracing::debug!(overlay = %overlay.id, %url, "asset changed, aspect ratio reset"),
            None => {}
        }
        let state = match seed.filter(|r| r.is_finite() && *r > 0.0) {
            Some(r) => AspectState::Ready(r),
            None => AspectState::Pending,
        };
        self.entries.insert(overlay.id, AspectEntry { url, state });
    }

    /// Aspect ratio if resolved; `None` while pending, failed or unknown.
    pub fn get(&self, id: OverlayId) -> Option<f64> {
        match self.entries.get(&id).map(|e| &e.state) {
            Some(AspectState::Ready(r)) => Some(*r),
            _ => None,
        }
    }

    pub fn state(&self, id: OverlayId) -> Option<&AspectState> {
        self.entries.get(&id).map(|e| &e.state)
    }

    /// Ids still waiting on a decode.
    pub fn pending(&self) -> Vec<OverlayId> {
        let mut ids: Vec<OverlayId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.state == AspectState::Pending)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Decode every pending entry in parallel; returns how many became ready.
    #[tracing::instrument(skip_all)]
    pub fn resolve_pending(&mut self, loader: &dyn AssetLoader) -> usize {
        let jobs: Vec<(OverlayId, String)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.state == AspectState::Pending)
            .map(|(id, e)| (*id, e.url.clone()))
            .collect();
        if jobs.is_empty() {
            return 0;
        }
        tracing::debug!(count = jobs.len(), "resolving aspect ratios");

        let results: Vec<(OverlayId, PhotoveilResult<f64>)> = jobs
            .par_iter()
            .map(|(id, url)| (*id, loader.load(url).map(|a| a.aspect_ratio())))
            .collect();

        let mut ready = 0;
        for (id, res) in results {
            let state = match res {
                Ok(r) if r.is_finite() && r > 0.0 => {
                    ready += 1;
                    AspectState::Ready(r)
                }
                Ok(r) => AspectState::Failed(format!("invalid aspect ratio {r}")),
                Err(e) => {
                    tracing::warn!(overlay = %id, error = %e, "aspect ratio unavailable");
                    AspectState::Failed(e.to_string())
                }
            };
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.state = state;
            }
        }
        ready
    }

    /// Drop the entry for a removed overlay.
    pub fn forget(&mut self, id: OverlayId) {
        self.entries.remove(&id);
    }

    /// Keep only entries whose id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(OverlayId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
