use crate::{error::GeotagError, jpeg, utils::{hemisphere, Dms}};

use std::{fs, io::Cursor, path::{Path, PathBuf}};
use exif::{experimental::Writer, Context, Exif, Field, In, Reader, Tag, Value};

/// Writes `latitude`/`longitude` into the GPS IFD of the JPEG at `path`.
///
/// Every other EXIF field, including the thumbnail, is carried over. Any
/// GPS fields already present are replaced. The file is rewritten through
/// a temporary sibling, so on failure the original stays untouched.
pub fn write_geotag(path: &Path, latitude: f64, longitude: f64) -> Result<(), GeotagError> {
    let original = fs::read(path).map_err(|e| GeotagError::write(path, e))?;

    let updated = geotagged_bytes(&original, latitude, longitude).map_err(|reason| GeotagError::write(path, reason))?;

    replace_file(path, &updated)?;

    log::debug!("Wrote {:.6}, {:.6} to {:?}", latitude, longitude, path);

    Ok(())
}

/// Returns a copy of `jpeg` carrying the given position.
pub fn geotagged_bytes(jpeg: &[u8], latitude: f64, longitude: f64) -> Result<Vec<u8>, String> {
    let existing = match jpeg::exif_payload(jpeg).map_err(|e| e.to_string())? {
        Some(payload) => Some(
            Reader::new()
                .read_raw(payload.to_vec())
                .map_err(|e| format!("existing EXIF block is unreadable: {}", e))?,
        ),
        None => None,
    };

    let gps_fields = gps_fields(latitude, longitude);
    let tiff = encode_exif(existing.as_ref(), &gps_fields)?;

    jpeg::replace_exif(jpeg, &tiff).map_err(|e| e.to_string())
}

pub fn gps_fields(latitude: f64, longitude: f64) -> Vec<Field> {
    vec![
        ascii(Tag::GPSLatitudeRef, hemisphere(latitude, "N", "S")),
        Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(Dms::from_degrees(latitude).to_rationals()),
        },
        ascii(Tag::GPSLongitudeRef, hemisphere(longitude, "E", "W")),
        Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(Dms::from_degrees(longitude).to_rationals()),
        },
    ]
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

/// Encodes a TIFF block with the fields of `existing` minus its GPS IFD,
/// plus `gps`.
fn encode_exif(existing: Option<&Exif>, gps: &[Field]) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new();

    let mut little_endian = false;

    if let Some(exif) = existing {
        little_endian = exif.little_endian();

        for field in exif.fields() {
            if keep_field(field) {
                writer.push_field(field);
            }
        }

        if let Some(thumbnail) = thumbnail(exif) {
            writer.set_jpeg(thumbnail, In::THUMBNAIL);
        }
    }

    for field in gps {
        writer.push_field(field);
    }

    let mut out = Cursor::new(Vec::new());

    writer
        .write(&mut out, little_endian)
        .map_err(|e| format!("cannot encode EXIF block: {}", e))?;

    Ok(out.into_inner())
}

fn keep_field(field: &Field) -> bool {
    let in_written_ifd = field.ifd_num == In::PRIMARY || field.ifd_num == In::THUMBNAIL;

    in_written_ifd && field.tag.context() != Context::Gps && !matches!(field.value, Value::Unknown(..))
}

/// The IFD1 JPEG thumbnail, sliced out of the raw EXIF buffer.
fn thumbnail(exif: &Exif) -> Option<&[u8]> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;

    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;

    exif.buf().get(offset..offset.checked_add(length)?)
}

fn replace_file(path: &Path, contents: &[u8]) -> Result<(), GeotagError> {
    let temporary = temporary_sibling(path);

    let result = fs::write(&temporary, contents).and_then(|_| fs::rename(&temporary, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&temporary);

        return Err(GeotagError::write(path, e));
    }

    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!(".{}.geotag.tmp", name))
}
