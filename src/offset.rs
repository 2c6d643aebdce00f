use crate::{config::OffsetConfig, error::GeotagError, image_info::read_capture_time, track::{PositionSample, Track}};

use std::{collections::HashMap, io::{BufRead, Write}, path::{Path, PathBuf}};
use chrono::{Duration, NaiveDateTime};

/// Widest clock error tried by `AutoReviewer`, in hours.
pub const AUTO_OFFSET_RANGE_HOURS: i64 = 14;

/// Confirmed clock corrections, one per camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraOffsets {
    offsets: HashMap<String, Duration>,
}

impl CameraOffsets {
    pub fn insert(&mut self, camera: &str, offset: Duration) {
        self.offsets.insert(camera.to_string(), offset);
    }

    /// Cameras without a confirmed offset use the raw capture time.
    pub fn get(&self, camera: &str) -> Duration {
        self.offsets.get(camera).copied().unwrap_or_else(Duration::zero)
    }

    pub fn contains(&self, camera: &str) -> bool {
        self.offsets.contains_key(camera)
    }
}

/// The state of one camera group while its offset is being reviewed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSession {
    pub camera: String,

    /// Number of candidate images taken with this camera.
    pub image_count: usize,

    /// Image whose capture time is being aligned with the track.
    pub reference_path: PathBuf,

    pub reference_time: NaiveDateTime,

    /// Accumulated correction for the current reference image.
    pub offset: Duration,
}

impl ReviewSession {
    pub fn new(camera: &str, image_count: usize, reference_path: &Path, reference_time: NaiveDateTime) -> Self {
        ReviewSession {
            camera: camera.to_string(),
            image_count,
            reference_path: reference_path.to_path_buf(),
            reference_time,
            offset: Duration::zero(),
        }
    }

    pub fn nudge(&mut self, hours: i64) {
        self.offset = self.offset + Duration::hours(hours);
    }

    /// Switches to another reference image, starting again from zero offset.
    pub fn retarget(&mut self, path: &Path) -> Result<(), GeotagError> {
        let time = read_capture_time(path).ok_or_else(|| GeotagError::NoTimestamp(path.to_path_buf()))?;

        self.reference_path = path.to_path_buf();
        self.reference_time = time;
        self.offset = Duration::zero();

        Ok(())
    }

    pub fn corrected_time(&self) -> NaiveDateTime {
        self.reference_time + self.offset
    }

    /// Where the reference image lands on the track with the current offset.
    pub fn preview<'t>(&self, track: &'t Track) -> Option<(&'t PositionSample, Duration)> {
        track.closest_with_gap(self.corrected_time())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Confirmed(Duration),
    Cancelled,
}

/// Decides the clock offset of one camera group.
///
/// Returning `Review::Cancelled` for any group aborts the whole run.
pub trait OffsetReviewer {
    fn review(&mut self, session: ReviewSession, track: &Track) -> Review;
}

/// Asks on a terminal, one camera at a time.
pub struct InteractiveReviewer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        InteractiveReviewer { input, output }
    }

    fn show(&mut self, session: &ReviewSession, track: &Track) -> std::io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Camera: {} ({} images)", session.camera, session.image_count)?;
        writeln!(self.output, "Reference image: {}", session.reference_path.display())?;
        writeln!(
            self.output,
            "Capture time (corrected): {} [offset {}]",
            session.corrected_time(),
            format_offset(session.offset)
        )?;

        match session.preview(track) {
            Some((sample, gap)) => writeln!(
                self.output,
                "Position: {:.5}, {:.5} ({}s from track point)",
                sample.latitude,
                sample.longitude,
                gap.num_seconds()
            )?,
            None => writeln!(self.output, "No matching track point found.")?,
        }

        write!(self.output, "[+] +1h  [-] -1h  [r <path>] other image  [y] confirm  [n] cancel > ")?;
        self.output.flush()
    }

    fn run(&mut self, mut session: ReviewSession, track: &Track) -> std::io::Result<Review> {
        loop {
            self.show(&session, track)?;

            let mut line = String::new();

            if self.input.read_line(&mut line)? == 0 {
                return Ok(Review::Cancelled);
            }

            let line = line.trim();

            match line {
                "+" => session.nudge(1),
                "-" => session.nudge(-1),
                "y" | "yes" => return Ok(Review::Confirmed(session.offset)),
                "n" | "no" | "q" => return Ok(Review::Cancelled),
                _ => match line.strip_prefix("r ") {
                    Some(path) => {
                        if let Err(e) = session.retarget(Path::new(path.trim())) {
                            writeln!(self.output, "{}", e)?;
                        }
                    }
                    None => writeln!(self.output, "Unknown command {:?}", line)?,
                },
            }
        }
    }
}

impl<R: BufRead, W: Write> OffsetReviewer for InteractiveReviewer<R, W> {
    fn review(&mut self, session: ReviewSession, track: &Track) -> Review {
        match self.run(session, track) {
            Ok(review) => review,
            Err(e) => {
                log::error!("Offset review failed: {}", e);
                Review::Cancelled
            }
        }
    }
}

/// Takes offsets from the configuration file.
pub struct ConfiguredReviewer {
    config: OffsetConfig,
}

impl ConfiguredReviewer {
    pub fn new(config: OffsetConfig) -> Self {
        ConfiguredReviewer { config }
    }
}

impl OffsetReviewer for ConfiguredReviewer {
    fn review(&mut self, session: ReviewSession, _track: &Track) -> Review {
        match self.config.cameras.get(&session.camera) {
            Some(entry) => match entry.duration() {
                Some(offset) => Review::Confirmed(offset),
                None => {
                    log::warn!("Offset configured for {:?} is out of range", session.camera);
                    Review::Cancelled
                }
            },
            None if self.config.reject_unlisted => {
                log::warn!("No offset configured for {:?}", session.camera);
                Review::Cancelled
            }
            None => Review::Confirmed(Duration::zero()),
        }
    }
}

/// Picks the whole-hour offset that brings the reference image closest to
/// the track, preferring the smallest correction on ties.
#[derive(Debug, Default)]
pub struct AutoReviewer;

impl OffsetReviewer for AutoReviewer {
    fn review(&mut self, mut session: ReviewSession, track: &Track) -> Review {
        let mut best: Option<(i64, Duration)> = None;

        for hours in candidate_hours() {
            session.offset = Duration::hours(hours);

            if let Some((_, gap)) = session.preview(track) {
                if best.map_or(true, |(_, best_gap)| gap < best_gap) {
                    best = Some((hours, gap));
                }
            }
        }

        match best {
            Some((hours, _)) => Review::Confirmed(Duration::hours(hours)),
            None => {
                log::warn!(
                    "No whole-hour offset within ±{}h puts {:?} on the track",
                    AUTO_OFFSET_RANGE_HOURS,
                    session.reference_path
                );
                Review::Cancelled
            }
        }
    }
}

/// 0, 1, -1, 2, -2, ...
fn candidate_hours() -> impl Iterator<Item = i64> {
    std::iter::once(0).chain((1..=AUTO_OFFSET_RANGE_HOURS).flat_map(|h| [h, -h]))
}

/// Renders an offset as `+HH:MM:SS`.
pub fn format_offset(offset: Duration) -> String {
    let sign = if offset < Duration::zero() { '-' } else { '+' };
    let total = offset.num_seconds().abs();

    format!("{}{:02}:{:02}:{:02}", sign, total / 3600, total % 3600 / 60, total % 60)
}
