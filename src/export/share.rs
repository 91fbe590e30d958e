use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::export::png::ExportedImage;
use crate::foundation::error::{PhotoveilError, PhotoveilResult};

/// Result of offering an export to a share target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The target took the file.
    Shared,
    /// The target cannot share files at all.
    Unavailable,
    /// The target refused or failed.
    Rejected(String),
}

/// A host share facility (system share sheet, messaging integration, ...).
pub trait ShareTarget {
    fn share(&self, image: &ExportedImage) -> ShareOutcome;
}

/// Share target for hosts without sharing support.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn share(&self, _image: &ExportedImage) -> ShareOutcome {
        ShareOutcome::Unavailable
    }
}

/// Saves exports into a directory under their own file name.
#[derive(Clone, Debug)]
pub struct DownloadTarget {
    dir: PathBuf,
}

impl DownloadTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `image` and return the path it was written to.
    pub fn save(&self, image: &ExportedImage) -> PhotoveilResult<PathBuf> {
        let name = Path::new(&image.filename);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(PhotoveilError::export(format!(
                "export filename '{}' must not contain path separators",
                image.filename
            )));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create download dir '{}'", self.dir.display()))?;
        let path = self.dir.join(name);
        std::fs::write(&path, &image.bytes)
            .with_context(|| format!("write export '{}'", path.display()))?;
        Ok(path)
    }
}

/// Where an export ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Shared,
    Downloaded(PathBuf),
}

/// Offer `image` to `share`; anything short of success falls back to `download`.
pub fn share_or_download(
    image: &ExportedImage,
    share: &dyn ShareTarget,
    download: &DownloadTarget,
) -> PhotoveilResult<Delivery> {
    match share.share(image) {
        ShareOutcome::Shared => {
            tracing::debug!(filename = %image.filename, "export shared");
            return Ok(Delivery::Shared);
        }
        ShareOutcome::Unavailable => {
            tracing::debug!(filename = %image.filename, "sharing unavailable, downloading");
        }
        ShareOutcome::Rejected(reason) => {
            tracing::warn!(filename = %image.filename, %reason, "share failed, downloading");
        }
    }
    download.save(image).map(Delivery::Downloaded)
}

#[cfg(test)]
#[path = "../../tests/unit/export/share.rs"]
mod tests;
