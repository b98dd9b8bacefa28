//! Video lookup for exercises and modifications.
//!
//! A missing video id yields [`VideoSlot::Unavailable`] so callers render
//! "no video available" instead of chasing optional fields.

use crate::{Exercise, Modification};

/// Embeddable player request for one video
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoHandle {
    pub video_id: String,
    pub autoplay: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSlot {
    Available(VideoHandle),
    Unavailable,
}

impl VideoSlot {
    fn from_id(video_id: Option<&str>, autoplay: bool) -> Self {
        match video_id.map(str::trim) {
            Some(id) if !id.is_empty() => VideoSlot::Available(VideoHandle {
                video_id: id.to_string(),
                autoplay,
            }),
            _ => VideoSlot::Unavailable,
        }
    }

    pub fn for_exercise(exercise: &Exercise, autoplay: bool) -> Self {
        Self::from_id(exercise.video_id.as_deref(), autoplay)
    }

    pub fn for_modification(modification: &Modification, autoplay: bool) -> Self {
        Self::from_id(modification.video_id.as_deref(), autoplay)
    }

    pub fn handle(&self) -> Option<&VideoHandle> {
        match self {
            VideoSlot::Available(handle) => Some(handle),
            VideoSlot::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_video_id_is_unavailable() {
        let mut exercise = Exercise {
            name: "Plank".into(),
            video_id: Some("  ".into()),
            instructions: None,
            tips: None,
            modification: None,
        };
        assert_eq!(VideoSlot::for_exercise(&exercise, true), VideoSlot::Unavailable);

        exercise.video_id = None;
        assert_eq!(VideoSlot::for_exercise(&exercise, true), VideoSlot::Unavailable);

        exercise.video_id = Some("plank01".into());
        let slot = VideoSlot::for_exercise(&exercise, false);
        assert_eq!(slot.handle().map(|h| h.video_id.as_str()), Some("plank01"));
        assert_eq!(slot.handle().map(|h| h.autoplay), Some(false));
    }
}
