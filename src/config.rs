use crate::error::GeotagError;

use std::{collections::BTreeMap, path::Path};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Per-camera clock offsets read from a JSON file, for unattended runs.
///
/// ```json
/// {
///   "cameras": { "Canon EOS R6": { "hours": -1 } },
///   "reject_unlisted": false
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetConfig {
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraOffsetEntry>,

    /// Cancel the run when a camera has no entry instead of assuming zero.
    #[serde(default)]
    pub reject_unlisted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraOffsetEntry {
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
}

impl CameraOffsetEntry {
    /// `None` when the total does not fit in a `Duration`.
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_hours(self.hours)?
            .checked_add(&Duration::try_minutes(self.minutes)?)?
            .checked_add(&Duration::try_seconds(self.seconds)?)
    }
}

pub fn load_offset_config(path: &Path) -> Result<OffsetConfig, GeotagError> {
    let data = std::fs::read_to_string(path).map_err(|e| GeotagError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let config: OffsetConfig = serde_json::from_str(&data).map_err(|e| GeotagError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if let Some(camera) = config
        .cameras
        .iter()
        .find_map(|(camera, entry)| entry.duration().is_none().then_some(camera))
    {
        return Err(GeotagError::Config {
            path: path.to_path_buf(),
            reason: format!("offset for {:?} is out of range", camera),
        });
    }

    Ok(config)
}
