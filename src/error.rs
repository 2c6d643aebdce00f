use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Everything that can go wrong while geotagging a folder.
///
/// Only `TrackParse`, `EmptyTrack` and `Config` abort a run; the other
/// variants describe a single image and are counted as failures.
#[derive(Error, Debug)]
pub enum GeotagError {
    #[error("failed to parse track {path:?}: {reason}")]
    TrackParse { path: PathBuf, reason: String },

    #[error("track {0:?} contains no timestamped points")]
    EmptyTrack(PathBuf),

    #[error("failed to read configuration {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("cannot read directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read metadata of {path:?}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    #[error("{0:?} has no usable capture time")]
    NoTimestamp(PathBuf),

    #[error("clock offset {offset} takes the capture time of {path:?} out of range")]
    OffsetOutOfRange { path: PathBuf, offset: chrono::Duration },

    #[error("no track point within tolerance of {time} for {path:?}")]
    NoMatch { path: PathBuf, time: NaiveDateTime },

    #[error("failed to write geotag to {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl GeotagError {
    pub(crate) fn write(path: &std::path::Path, reason: impl ToString) -> Self {
        GeotagError::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
