//! Engine tunables.
//!
//! Defaults match the editing UI. A JSON file may override any subset of fields, and
//! `PHOTOVEIL_*` environment variables override both.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::resolve::DEFAULT_ASSET_ROUTE;
use crate::export::png::DEFAULT_FILENAME_PREFIX;
use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::foundation::math::{SCALE_MAX, SCALE_MIN};
use crate::geometry::canvas::DEFAULT_VIEWPORT_FIT;
use crate::gesture::controller::GestureConfig;
use crate::gesture::handles::{DEFAULT_HANDLE_RADIUS, DEFAULT_ROTATE_HANDLE_OFFSET};
use crate::snap::{DEFAULT_SNAP_THRESHOLD, SnapResolver};
use crate::store::history::DEFAULT_HISTORY_CAPACITY;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "PHOTOVEIL_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Snap distance in display pixels; 0 disables snapping.
    pub snap_threshold: f64,
    /// Undo depth; 0 disables undo.
    pub history_capacity: usize,
    pub scale_min: f64,
    pub scale_max: f64,
    /// Arrow-key step in display pixels.
    pub nudge_step: f64,
    /// Arrow-key step with shift held.
    pub nudge_step_large: f64,
    pub wheel_scale_step: f64,
    /// Degrees per wheel tick with alt held.
    pub wheel_rotation_step: f64,
    pub rotate_handle_offset: f64,
    pub handle_radius: f64,
    /// Fraction of the viewport the photo may fill.
    pub viewport_fit: f64,
    /// Route prefix for storage keys.
    pub asset_route: String,
    pub export_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            scale_min: SCALE_MIN,
            scale_max: SCALE_MAX,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            wheel_scale_step: 0.05,
            wheel_rotation_step: 5.0,
            rotate_handle_offset: DEFAULT_ROTATE_HANDLE_OFFSET,
            handle_radius: DEFAULT_HANDLE_RADIUS,
            viewport_fit: DEFAULT_VIEWPORT_FIT,
            asset_route: DEFAULT_ASSET_ROUTE.to_string(),
            export_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config file. Missing fields keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> PhotoveilResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| {
            PhotoveilError::serde(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> PhotoveilResult<Self> {
        Self::default().with_env()
    }

    /// Apply `PHOTOVEIL_*` variables from the process environment.
    pub fn with_env(self) -> PhotoveilResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by full variable name (e.g. `PHOTOVEIL_SNAP_THRESHOLD`).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> PhotoveilResult<Self> {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        override_parsed(&get, "SNAP_THRESHOLD", &mut self.snap_threshold)?;
        override_parsed(&get, "HISTORY_CAPACITY", &mut self.history_capacity)?;
        override_parsed(&get, "SCALE_MIN", &mut self.scale_min)?;
        override_parsed(&get, "SCALE_MAX", &mut self.scale_max)?;
        override_parsed(&get, "NUDGE_STEP", &mut self.nudge_step)?;
        override_parsed(&get, "NUDGE_STEP_LARGE", &mut self.nudge_step_large)?;
        override_parsed(&get, "WHEEL_SCALE_STEP", &mut self.wheel_scale_step)?;
        override_parsed(&get, "WHEEL_ROTATION_STEP", &mut self.wheel_rotation_step)?;
        override_parsed(&get, "ROTATE_HANDLE_OFFSET", &mut self.rotate_handle_offset)?;
        override_parsed(&get, "HANDLE_RADIUS", &mut self.handle_radius)?;
        override_parsed(&get, "VIEWPORT_FIT", &mut self.viewport_fit)?;
        if let Some(v) = get("ASSET_ROUTE") {
            self.asset_route = v;
        }
        if let Some(v) = get("EXPORT_PREFIX") {
            self.export_prefix = v;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> PhotoveilResult<()> {
        for (name, v) in [
            ("snapThreshold", self.snap_threshold),
            ("nudgeStep", self.nudge_step),
            ("nudgeStepLarge", self.nudge_step_large),
            ("wheelScaleStep", self.wheel_scale_step),
            ("wheelRotationStep", self.wheel_rotation_step),
            ("rotateHandleOffset", self.rotate_handle_offset),
            ("handleRadius", self.handle_radius),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(PhotoveilError::validation(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        if !(self.scale_min.is_finite() && self.scale_min > 0.0) {
            return Err(PhotoveilError::validation(format!(
                "scaleMin must be positive, got {}",
                self.scale_min
            )));
        }
        if !(self.scale_max.is_finite() && self.scale_max >= self.scale_min) {
            return Err(PhotoveilError::validation(format!(
                "scaleMax must be >= scaleMin ({}), got {}",
                self.scale_min, self.scale_max
            )));
        }
        if !(self.viewport_fit.is_finite() && self.viewport_fit > 0.0) {
            return Err(PhotoveilError::validation(format!(
                "viewportFit must be positive, got {}",
                self.viewport_fit
            )));
        }
        if self.export_prefix.is_empty() || self.export_prefix.contains(['/', '\\']) {
            return Err(PhotoveilError::validation(format!(
                "exportPrefix must be a non-empty file name part, got '{}'",
                self.export_prefix
            )));
        }
        Ok(())
    }

    /// Pointer, wheel and keyboard settings for the gesture controller.
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            snap: SnapResolver::new(self.snap_threshold),
            rotate_handle_offset: self.rotate_handle_offset,
            handle_radius: self.handle_radius,
            nudge_step: self.nudge_step,
            nudge_step_large: self.nudge_step_large,
            wheel_scale_step: self.wheel_scale_step,
            wheel_rotation_step: self.wheel_rotation_step,
            scale_min: self.scale_min,
            scale_max: self.scale_max,
        }
    }
}

fn override_parsed<T>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) -> PhotoveilResult<()>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = get(name) {
        *slot = raw.trim().parse().map_err(|e| {
            PhotoveilError::validation(format!("{ENV_PREFIX}{name}='{raw}': {e}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/config/mod.rs"]
mod tests;
