//! Just enough JPEG segment handling to swap the EXIF APP1 block.

use std::ops::Range;
use thiserror::Error;

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const TEM: u8 = 0x01;
const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;

pub const EXIF_ID: &[u8] = b"Exif\0\0";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JpegError {
    #[error("not a JPEG file")]
    NotJpeg,

    #[error("truncated segment at offset {0}")]
    Truncated(usize),

    #[error("unexpected byte {byte:#04x} at offset {offset}, expected a marker")]
    BadMarker { byte: u8, offset: usize },

    #[error("EXIF block of {0} bytes does not fit in one APP1 segment")]
    ExifTooLarge(usize),
}

/// A length-prefixed segment of the JPEG header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    marker: u8,

    /// Whole segment including the marker bytes.
    span: Range<usize>,

    /// Payload after the length field.
    payload: Range<usize>,
}

/// Lists the header segments up to the start of scan.
fn header_segments(jpeg: &[u8]) -> Result<Vec<Segment>, JpegError> {
    if jpeg.len() < 2 || jpeg[0] != MARKER_PREFIX || jpeg[1] != SOI {
        return Err(JpegError::NotJpeg);
    }

    let mut segments = Vec::new();
    let mut pos = 2;

    while pos < jpeg.len() {
        let start = pos;

        if jpeg[pos] != MARKER_PREFIX {
            return Err(JpegError::BadMarker { byte: jpeg[pos], offset: pos });
        }

        // fill bytes
        while pos < jpeg.len() && jpeg[pos] == MARKER_PREFIX {
            pos += 1;
        }

        let marker = *jpeg.get(pos).ok_or(JpegError::Truncated(start))?;
        pos += 1;

        match marker {
            SOS | EOI => break,
            TEM | RST0..=RST7 => continue,
            _ => {}
        }

        let length = jpeg
            .get(pos..pos + 2)
            .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]) as usize)
            .ok_or(JpegError::Truncated(start))?;

        if length < 2 || pos + length > jpeg.len() {
            return Err(JpegError::Truncated(start));
        }

        segments.push(Segment {
            marker,
            span: start..pos + length,
            payload: pos + 2..pos + length,
        });

        pos += length;
    }

    Ok(segments)
}

/// Returns the payload of the EXIF APP1 segment, without the `Exif\0\0` id.
pub fn exif_payload(jpeg: &[u8]) -> Result<Option<&[u8]>, JpegError> {
    Ok(header_segments(jpeg)?
        .into_iter()
        .find(|segment| is_exif(jpeg, segment))
        .map(|segment| &jpeg[segment.payload.start + EXIF_ID.len()..segment.payload.end]))
}

/// Rebuilds `jpeg` with `tiff` as its EXIF block.
///
/// An existing EXIF segment is replaced in place. Otherwise the new segment
/// goes right after SOI, or after a leading JFIF APP0 segment.
pub fn replace_exif(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>, JpegError> {
    let segments = header_segments(jpeg)?;

    let segment_length = 2 + EXIF_ID.len() + tiff.len();

    if segment_length > u16::MAX as usize {
        return Err(JpegError::ExifTooLarge(tiff.len()));
    }

    let (cut, keep_from) = match segments.iter().find(|segment| is_exif(jpeg, segment)) {
        Some(segment) => (segment.span.start, segment.span.end),
        None => {
            let after = match segments.first() {
                Some(first) if first.marker == APP0 && first.span.start == 2 => first.span.end,
                _ => 2,
            };

            (after, after)
        }
    };

    let mut out = Vec::with_capacity(jpeg.len() + segment_length + 2);

    out.extend_from_slice(&jpeg[..cut]);
    out.extend_from_slice(&[MARKER_PREFIX, APP1]);
    out.extend_from_slice(&(segment_length as u16).to_be_bytes());
    out.extend_from_slice(EXIF_ID);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[keep_from..]);

    Ok(out)
}

fn is_exif(jpeg: &[u8], segment: &Segment) -> bool {
    segment.marker == APP1 && jpeg[segment.payload.clone()].starts_with(EXIF_ID)
}
