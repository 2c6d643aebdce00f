//! Fixture builders shared by the unit tests.

use crate::{geotag::gps_fields, jpeg};

use std::{io::Cursor, path::{Path, PathBuf}};
use exif::{experimental::Writer, Field, In, Tag, Value};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct JpegFixture {
    pub original: Option<&'static str>,
    pub modified: Option<&'static str>,
    pub model: Option<&'static str>,
    pub latitude: Option<f64>,
    /// JPEG bytes stored as the IFD1 thumbnail.
    pub thumbnail: Option<&'static [u8]>,
}

/// A fresh, empty directory, removed when the guard is dropped.
pub fn scratch_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("gpx_geotag_")
        .tempdir()
        .unwrap()
}

/// Writes a minimal JPEG carrying the requested EXIF fields.
pub fn jpeg_with_exif(dir: &Path, name: &str, fixture: JpegFixture) -> PathBuf {
    let ascii = |tag, text: &str| Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    };

    let mut fields = Vec::new();

    if let Some(text) = fixture.original {
        fields.push(ascii(Tag::DateTimeOriginal, text));
    }
    if let Some(text) = fixture.modified {
        fields.push(ascii(Tag::DateTime, text));
    }
    if let Some(text) = fixture.model {
        fields.push(ascii(Tag::Model, text));
    }
    if let Some(latitude) = fixture.latitude {
        fields.extend(gps_fields(latitude, 0.0));
    }

    // An IFD0 entry keeps the block valid when nothing else was requested.
    fields.push(ascii(Tag::Software, "fixture"));

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    if let Some(thumbnail) = fixture.thumbnail {
        writer.set_jpeg(thumbnail, In::THUMBNAIL);
    }

    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();

    let bare = [0xFF, 0xD8, 0xFF, 0xD9];
    let bytes = jpeg::replace_exif(&bare, &tiff.into_inner()).unwrap();

    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();

    path
}
