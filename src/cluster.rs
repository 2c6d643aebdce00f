use crate::image_info::ImageRecord;

use std::fmt;
use chrono::NaiveDateTime;

/// Group name for images without a camera model.
pub const UNKNOWN_CAMERA: &str = "Unknown camera";

/// Candidate images sharing one camera, and therefore one clock offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraGroup {
    /// Camera model, or `UNKNOWN_CAMERA`.
    pub camera: String,

    /// The images, in scan order.
    pub images: Vec<ImageRecord>,
}

impl CameraGroup {
    pub fn new(camera: &str) -> Self {
        CameraGroup {
            camera: camera.to_string(),
            images: vec![],
        }
    }

    /// The first image with a capture time, used to align the camera clock
    /// with the track.
    pub fn reference(&self) -> Option<(&ImageRecord, NaiveDateTime)> {
        self.images
            .iter()
            .find_map(|image| image.timestamp.map(|time| (image, time)))
    }

    pub fn is_unknown(&self) -> bool {
        self.camera == UNKNOWN_CAMERA
    }
}

impl fmt::Display for CameraGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} images)", self.camera, self.images.len())
    }
}

/// Partitions images by camera model, keeping groups in first-seen order.
pub fn group_by_camera(images: Vec<ImageRecord>) -> Vec<CameraGroup> {
    let mut groups: Vec<CameraGroup> = Vec::new();

    for image in images {
        let camera = image.camera.as_deref().unwrap_or(UNKNOWN_CAMERA);

        match groups.iter_mut().find(|group| group.camera == camera) {
            Some(group) => group.images.push(image),
            None => {
                let mut group = CameraGroup::new(camera);

                group.images.push(image);

                groups.push(group);
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use chrono::NaiveDate;

    fn image(name: &str, camera: Option<&str>) -> ImageRecord {
        ImageRecord {
            path: PathBuf::from(name),
            timestamp: None,
            camera: camera.map(str::to_string),
            has_geotag: false,
        }
    }

    fn timed(name: &str, camera: Option<&str>, hour: u32) -> ImageRecord {
        ImageRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(hour, 0, 0),
            ..image(name, camera)
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let groups = group_by_camera(vec![
            timed("1.jpg", Some("X100V"), 10),
            image("2.jpg", Some("EOS R6")),
            image("3.jpg", Some("X100V")),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].camera, "X100V");
        assert_eq!(groups[0].images.len(), 2);
        assert_eq!(groups[0].reference().unwrap().0.path, PathBuf::from("1.jpg"));
        assert_eq!(groups[1].to_string(), "EOS R6 (1 images)");
    }

    #[test]
    fn reference_skips_images_without_capture_time() {
        let groups = group_by_camera(vec![
            image("1.jpg", Some("EOS R6")),
            timed("2.jpg", Some("EOS R6"), 12),
            timed("3.jpg", Some("EOS R6"), 13),
        ]);

        let (reference, time) = groups[0].reference().unwrap();

        assert_eq!(reference.path, PathBuf::from("2.jpg"));
        assert_eq!(time, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap());
        assert!(group_by_camera(vec![image("1.jpg", None)])[0].reference().is_none());
    }

    #[test]
    fn missing_model_goes_to_unknown_camera() {
        let groups = group_by_camera(vec![image("1.jpg", None), image("2.jpg", None)]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_unknown());
        assert_eq!(groups[0].images.len(), 2);
    }

    #[test]
    fn no_images_no_groups() {
        assert!(group_by_camera(vec![]).is_empty());
    }
}
