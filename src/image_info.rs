use crate::error::GeotagError;

use std::{fs::File, io::BufReader, path::{Path, PathBuf}};
use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};

/// Layout of the EXIF `DateTime*` fields.
pub const EXIF_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// What the pipeline needs to know about one image file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub path: PathBuf,

    /// Original capture time, falling back to the last-modified time.
    pub timestamp: Option<NaiveDateTime>,

    /// Camera model string.
    pub camera: Option<String>,

    pub has_geotag: bool,
}

impl ImageRecord {
    /// Reads all fields with a single pass over the container. An image
    /// whose metadata cannot be read is still a candidate, just without
    /// timestamp or camera.
    pub fn read(path: &Path) -> Self {
        match read_exif(path) {
            Ok(exif) => ImageRecord {
                path: path.to_path_buf(),
                timestamp: capture_time(&exif),
                camera: camera_model(&exif),
                has_geotag: exif_has_geotag(&exif),
            },
            Err(e) => {
                log::debug!("{}", e);

                ImageRecord {
                    path: path.to_path_buf(),
                    timestamp: None,
                    camera: None,
                    has_geotag: false,
                }
            }
        }
    }
}

pub fn read_exif(path: &Path) -> Result<Exif, GeotagError> {
    let file = File::open(path).map_err(|e| GeotagError::MetadataRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .map_err(|e| GeotagError::MetadataRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

pub fn read_capture_time(path: &Path) -> Option<NaiveDateTime> {
    read_exif(path).ok().as_ref().and_then(capture_time)
}

pub fn read_camera_model(path: &Path) -> Option<String> {
    read_exif(path).ok().as_ref().and_then(camera_model)
}

/// Unreadable files count as not geotagged so they stay candidates.
pub fn has_geotag(path: &Path) -> bool {
    read_exif(path)
        .map(|exif| exif_has_geotag(&exif))
        .unwrap_or(false)
}

pub fn capture_time(exif: &Exif) -> Option<NaiveDateTime> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .iter()
        .find_map(|tag| ascii_field(exif, *tag))
        .and_then(|text| NaiveDateTime::parse_from_str(&text, EXIF_TIME_FORMAT).ok())
}

pub fn camera_model(exif: &Exif) -> Option<String> {
    ascii_field(exif, Tag::Model)
        .map(|model| model.trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string())
        .filter(|model| !model.is_empty())
}

pub fn exif_has_geotag(exif: &Exif) -> bool {
    match exif.get_field(Tag::GPSLatitude, In::PRIMARY).map(|field| &field.value) {
        Some(Value::Rational(parts)) => !parts.is_empty(),
        Some(Value::Ascii(parts)) => parts.iter().any(|part| !part.is_empty()),
        Some(_) => true,
        None => false,
    }
}

/// First string of an ASCII field. Blank values count as missing.
fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    match exif.get_field(tag, In::PRIMARY).map(|field| &field.value) {
        Some(Value::Ascii(parts)) => parts
            .first()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .filter(|text| !text.trim_matches(|c: char| c == '\0' || c.is_whitespace()).is_empty())
            .map(str::to_string),
        _ => None,
    }
}
