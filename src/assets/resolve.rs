use crate::foundation::error::{PhotoveilError, PhotoveilResult};

/// Default route prefix for relative storage keys.
pub const DEFAULT_ASSET_ROUTE: &str = "/objects/";

/// How an overlay reference should be fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetRef<'a> {
    /// `http://` or `https://`.
    Remote(&'a str),
    /// `data:` URL.
    Data(&'a str),
    /// `blob:` URL; only meaningful inside the host.
    Blob(&'a str),
    /// Rooted path such as `/objects/abc.png`.
    Rooted(&'a str),
}

/// Classify an already-resolved reference.
pub fn classify(url: &str) -> AssetRef<'_> {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        AssetRef::Remote(url)
    } else if lower.starts_with("data:") {
        AssetRef::Data(url)
    } else if lower.starts_with("blob:") {
        AssetRef::Blob(url)
    } else {
        AssetRef::Rooted(url)
    }
}

/// Turn an overlay `value` into a fetchable URL.
///
/// Absolute URLs and rooted paths pass through unchanged; bare storage keys are joined onto
/// `route` with exactly one `/` between them.
pub fn resolve_asset_url(value: &str, route: &str) -> String {
    let value = value.trim();
    match classify(value) {
        AssetRef::Remote(_) | AssetRef::Data(_) | AssetRef::Blob(_) => value.to_owned(),
        AssetRef::Rooted(_) if value.starts_with('/') => value.to_owned(),
        AssetRef::Rooted(_) => {
            let route = route.trim_end_matches('/');
            let key = value.trim_start_matches("./");
            format!("{route}/{key}")
        }
    }
}

/// Normalize a reference relative to the asset root: `/` separators, `.` segments dropped,
/// absolute paths and `..` rejected.
pub fn normalize_rel_path(source: &str) -> PhotoveilResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PhotoveilError::asset(format!(
            "'{source}' escapes the asset root"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                return Err(PhotoveilError::asset(format!(
                    "'{source}' contains a parent traversal"
                )));
            }
            p => out.push(p),
        }
    }
    if out.is_empty() {
        return Err(PhotoveilError::asset("asset reference has no file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolve.rs"]
mod tests;
