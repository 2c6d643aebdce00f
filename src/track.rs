use crate::error::GeotagError;

use std::{fmt, fs::File, io::{BufReader, Read}, path::Path};
use chrono::{DateTime, Duration, NaiveDateTime};
use geoutils::Location;

/// Largest capture/track time difference, in seconds, still accepted as a match.
pub const MAX_TIME_DIFFERENCE_SECONDS: i64 = 300;

/// A single timestamped GPS fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    /// Wall-clock time as written in the track, zone dropped.
    pub time: NaiveDateTime,

    pub latitude: f64,

    pub longitude: f64,
}

impl PositionSample {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

/// All timed samples of a track log, in file order.
///
/// File order is not guaranteed to be chronological, so nothing here
/// relies on the samples being sorted.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub samples: Vec<PositionSample>,
}

impl Track {
    pub fn new(samples: Vec<PositionSample>) -> Self {
        Track { samples }
    }

    /// Loads every timestamped trackpoint of a GPX file.
    pub fn load(path: &Path) -> Result<Self, GeotagError> {
        let file = File::open(path).map_err(|e| GeotagError::TrackParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let track = Self::from_reader(BufReader::new(file)).map_err(|reason| GeotagError::TrackParse {
            path: path.to_path_buf(),
            reason,
        })?;

        if track.is_empty() {
            return Err(GeotagError::EmptyTrack(path.to_path_buf()));
        }

        log::info!("Loaded track {:?}: {}", path, track.summary());

        Ok(track)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, String> {
        let gpx = gpx::read(reader).map_err(|e| e.to_string())?;

        let mut samples = Vec::new();

        for track in gpx.tracks {
            for segment in track.segments {
                for point in segment.points {
                    // Untimed points cannot take part in time matching.
                    let Some(time) = &point.time else { continue };

                    let iso = time.format().map_err(|e| e.to_string())?;

                    let time = DateTime::parse_from_rfc3339(&iso)
                        .map_err(|e| e.to_string())?
                        .naive_local();

                    let position = point.point();

                    samples.push(PositionSample {
                        time,
                        latitude: position.y(),
                        longitude: position.x(),
                    });
                }
            }
        }

        Ok(Track { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample nearest in time to `target`, provided it lies
    /// within `MAX_TIME_DIFFERENCE_SECONDS`. The first of several equally near
    /// samples wins.
    pub fn find_closest(&self, target: NaiveDateTime) -> Option<&PositionSample> {
        self.closest_with_gap(target).map(|(sample, _)| sample)
    }

    /// Like `find_closest`, also returning the absolute time difference.
    pub fn closest_with_gap(&self, target: NaiveDateTime) -> Option<(&PositionSample, Duration)> {
        let mut closest: Option<(&PositionSample, i64)> = None;

        for sample in &self.samples {
            let diff = abs_micros(sample.time - target);

            match closest {
                Some((_, best)) if diff >= best => {}
                _ => closest = Some((sample, diff)),
            }
        }

        let (sample, diff) = closest?;

        if diff > MAX_TIME_DIFFERENCE_SECONDS * 1_000_000 {
            return None;
        }

        Some((sample, Duration::microseconds(diff)))
    }

    pub fn summary(&self) -> TrackSummary {
        let start = self.samples.iter().map(|sample| sample.time).min();
        let end = self.samples.iter().map(|sample| sample.time).max();

        let length_meters = self
            .samples
            .windows(2)
            .map(|pair| {
                pair[0]
                    .location()
                    .haversine_distance_to(&pair[1].location())
                    .meters()
            })
            .sum();

        TrackSummary {
            samples: self.samples.len(),
            start,
            end,
            length_meters,
        }
    }
}

fn abs_micros(duration: Duration) -> i64 {
    duration
        .num_microseconds()
        .map(i64::abs)
        .unwrap_or(i64::MAX)
}

/// Overview printed after a track has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub samples: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub length_meters: f64,
}

impl fmt::Display for TrackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} points", self.samples)?;

        if let (Some(start), Some(end)) = (self.start, self.end) {
            write!(f, " from {} to {}", start, end)?;
        }

        write!(f, ", {:.2} km", self.length_meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_support::scratch_dir;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample(time: NaiveDateTime, latitude: f64, longitude: f64) -> PositionSample {
        PositionSample { time, latitude, longitude }
    }

    fn two_point_track() -> Track {
        Track::new(vec![
            sample(at(10, 0, 0), 10.0, 20.0),
            sample(at(10, 10, 0), 10.5, 20.5),
        ])
    }

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>walk</name>
    <trkseg>
      <trkpt lat="10.0" lon="20.0"><time>2024-06-01T10:00:00Z</time></trkpt>
      <trkpt lat="10.1" lon="20.1"></trkpt>
      <trkpt lat="10.5" lon="20.5"><time>2024-06-01T10:10:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn parses_timed_points_only() {
        let track = Track::from_reader(GPX.as_bytes()).unwrap();

        assert_eq!(track.len(), 2);
        assert_eq!(track.samples[0], sample(at(10, 0, 0), 10.0, 20.0));
        assert_eq!(track.samples[1].latitude, 10.5);
        assert_eq!(track.samples[1].longitude, 20.5);
    }

    #[test]
    fn utc_times_become_naive() {
        let track = Track::from_reader(GPX.as_bytes()).unwrap();

        assert_eq!(track.samples[1].time, at(10, 10, 0));
    }

    #[test]
    fn malformed_gpx_is_rejected() {
        assert!(Track::from_reader("<gpx><trk>".as_bytes()).is_err());
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result = Track::load(Path::new("/nonexistent/track.gpx"));

        assert!(matches!(result, Err(GeotagError::TrackParse { .. })));
    }

    #[test]
    fn untimed_track_is_empty_error() {
        let scratch = scratch_dir();
        let path = scratch.path().join("untimed.gpx");

        std::fs::write(
            &path,
            r#"<?xml version="1.0"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg><trkpt lat="1.0" lon="2.0"></trkpt></trkseg></trk>
</gpx>"#,
        )
        .unwrap();

        let result = Track::load(&path);

        assert!(matches!(result, Err(GeotagError::EmptyTrack(_))));
    }

    #[test]
    fn picks_nearest_sample() {
        let track = two_point_track();

        assert_eq!(track.find_closest(at(10, 4, 0)), Some(&track.samples[0]));
        assert_eq!(track.find_closest(at(10, 6, 0)), Some(&track.samples[1]));
    }

    #[test]
    fn no_match_beyond_tolerance() {
        let track = two_point_track();

        assert_eq!(track.find_closest(at(10, 20, 0)), None);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let track = Track::new(vec![sample(at(10, 0, 0), 1.0, 2.0)]);

        assert!(track.find_closest(at(10, 5, 0)).is_some());
        assert!(track.find_closest(at(9, 55, 0)).is_some());

        let just_over = at(10, 5, 0) + Duration::microseconds(100);

        assert!(track.find_closest(just_over).is_none());
    }

    #[test]
    fn ties_resolve_to_first_in_file_order() {
        let track = Track::new(vec![
            sample(at(10, 2, 0), 1.0, 1.0),
            sample(at(9, 58, 0), 2.0, 2.0),
            sample(at(10, 2, 0), 3.0, 3.0),
        ]);

        assert_eq!(track.find_closest(at(10, 0, 0)).unwrap().latitude, 1.0);
    }

    #[test]
    fn unsorted_track_is_scanned_fully() {
        let track = Track::new(vec![
            sample(at(12, 0, 0), 1.0, 1.0),
            sample(at(8, 0, 0), 2.0, 2.0),
            sample(at(10, 1, 0), 3.0, 3.0),
            sample(at(11, 0, 0), 4.0, 4.0),
        ]);

        let (closest, gap) = track.closest_with_gap(at(10, 0, 0)).unwrap();

        assert_eq!(closest.latitude, 3.0);
        assert_eq!(gap, Duration::seconds(60));
    }

    #[test]
    fn empty_track_never_matches() {
        assert_eq!(Track::default().find_closest(at(10, 0, 0)), None);
    }

    #[test]
    fn summary_spans_unsorted_samples() {
        let track = Track::new(vec![
            sample(at(11, 0, 0), 0.0, 0.0),
            sample(at(10, 0, 0), 0.0, 1.0),
        ]);

        let summary = track.summary();

        assert_eq!(summary.samples, 2);
        assert_eq!(summary.start, Some(at(10, 0, 0)));
        assert_eq!(summary.end, Some(at(11, 0, 0)));
        // one degree of longitude on the equator
        assert!((summary.length_meters - 111_195.0).abs() < 500.0);
    }
}
