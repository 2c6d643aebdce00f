use crate::{cluster::{group_by_camera, CameraGroup}, error::GeotagError, geotag::write_geotag, image_info::{read_capture_time, ImageRecord}, offset::{format_offset, CameraOffsets, OffsetReviewer, Review, ReviewSession}, track::{PositionSample, Track}};

use std::{fs::read_dir, path::{Path, PathBuf}};
use chrono::Duration;

/// Receives progress of the write phase and may ask it to stop.
pub trait Progress {
    fn report(&mut self, current: usize, total: usize);

    /// Polled between images; a write in progress always completes.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Progress through the log, never cancelling.
#[derive(Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn report(&mut self, current: usize, total: usize) {
        log::debug!("Processing image {}/{}", current, total);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every image in the folder is already geotagged, or there are none.
    NothingToDo,

    /// Offset review was rejected for `camera`; nothing was written.
    Aborted { camera: String },

    /// Stopped between images; earlier writes stay in place.
    Cancelled(Tally),

    Completed(Tally),
}

/// Offset review was cancelled for `camera`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCancelled {
    pub camera: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Match images without writing anything.
    pub dry_run: bool,
}

pub fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

/// Lists the JPEG files directly inside `dir` that carry no geotag yet.
pub fn scan_candidates(dir: &Path) -> Result<Vec<ImageRecord>, GeotagError> {
    let entries = read_dir(dir).map_err(|source| GeotagError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && is_jpeg(path))
        .collect();

    paths.sort();

    let mut candidates = Vec::with_capacity(paths.len());

    for path in paths {
        let image = ImageRecord::read(&path);

        if image.has_geotag {
            log::debug!("Skipping {:?}: already geotagged", path);
        } else {
            candidates.push(image);
        }
    }

    Ok(candidates)
}

/// Collects an offset for every group with at least one capture time. Stops
/// at the first cancelled review.
pub fn resolve_offsets(groups: &[CameraGroup], track: &Track, reviewer: &mut dyn OffsetReviewer) -> Result<CameraOffsets, ReviewCancelled> {
    let mut offsets = CameraOffsets::default();

    for group in groups {
        let Some((reference, time)) = group.reference() else {
            log::warn!("No capture time in any {} image, using it without offset", group.camera);
            continue;
        };

        let session = ReviewSession::new(&group.camera, group.images.len(), &reference.path, time);

        match reviewer.review(session, track) {
            Review::Confirmed(offset) => {
                log::info!("Offset for {} confirmed: {}", group.camera, format_offset(offset));
                offsets.insert(&group.camera, offset);
            }
            Review::Cancelled => {
                log::warn!("Offset review for {} cancelled", group.camera);
                return Err(ReviewCancelled { camera: group.camera.clone() });
            }
        }
    }

    Ok(offsets)
}

/// Matches one image against the track and writes the position.
pub fn geotag_image(path: &Path, track: &Track, offset: Duration, dry_run: bool) -> Result<PositionSample, GeotagError> {
    let time = read_capture_time(path).ok_or_else(|| GeotagError::NoTimestamp(path.to_path_buf()))?;

    let corrected = time
        .checked_add_signed(offset)
        .ok_or_else(|| GeotagError::OffsetOutOfRange {
            path: path.to_path_buf(),
            offset,
        })?;

    let sample = *track.find_closest(corrected).ok_or_else(|| GeotagError::NoMatch {
        path: path.to_path_buf(),
        time: corrected,
    })?;

    if !dry_run {
        write_geotag(path, sample.latitude, sample.longitude)?;
    }

    Ok(sample)
}

pub fn write_geotags(groups: &[CameraGroup], track: &Track, offsets: &CameraOffsets, progress: &mut dyn Progress, options: RunOptions) -> Outcome {
    let total = groups.iter().map(|group| group.images.len()).sum();

    let mut tally = Tally::default();
    let mut current = 0;

    for group in groups {
        let offset = offsets.get(&group.camera);

        if !offsets.contains(&group.camera) {
            log::debug!("No offset for {}, using raw capture times", group.camera);
        }

        for image in &group.images {
            current += 1;

            progress.report(current, total);

            if progress.is_cancelled() {
                log::warn!("Cancelled after {} of {} images", current - 1, total);
                return Outcome::Cancelled(tally);
            }

            match geotag_image(&image.path, track, offset, options.dry_run) {
                Ok(sample) => {
                    log::info!("{:?} -> {:.6}, {:.6}", image.path, sample.latitude, sample.longitude);
                    tally.success += 1;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    tally.failed += 1;
                }
            }
        }
    }

    Outcome::Completed(tally)
}

/// Scans `dir`, resolves camera offsets and geotags every candidate.
pub fn run(dir: &Path, track: &Track, reviewer: &mut dyn OffsetReviewer, progress: &mut dyn Progress, options: RunOptions) -> Result<Outcome, GeotagError> {
    let candidates = scan_candidates(dir)?;

    let groups = group_by_camera(candidates);

    if groups.is_empty() {
        log::info!("No images without GPS data found in {:?}", dir);
        return Ok(Outcome::NothingToDo);
    }

    log::info!("Found cameras:");
    for group in &groups {
        if group.is_unknown() {
            log::warn!("  {}, without a camera model", group);
        } else {
            log::info!("  {}", group);
        }
    }

    let offsets = match resolve_offsets(&groups, track, reviewer) {
        Ok(offsets) => offsets,
        Err(ReviewCancelled { camera }) => return Ok(Outcome::Aborted { camera }),
    };

    Ok(write_geotags(&groups, track, &offsets, progress, options))
}
