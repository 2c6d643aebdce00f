//! Geotags JPEG images by matching their capture times against a GPX track.
//!
//! The pipeline lives in [`features`]: scan a folder, group the images by
//! camera, settle each camera's clock offset, then write the nearest track
//! position into every image.

pub mod args;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod geotag;
pub mod image_info;
pub mod jpeg;
pub mod offset;
pub mod track;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::GeotagError;
