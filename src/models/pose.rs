// Data models for pose landmarks consumed by the exercise analysis core

use serde::{Deserialize, Serialize};

// ==============================================================================
// 2D Keypoint
// ==============================================================================

/// A single tracked body point in normalized frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint2D {
    pub x: f32, // Normalized [0, 1]
    pub y: f32, // Normalized [0, 1]
}

impl Keypoint2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset this point vertically (negative = towards the top of the frame)
    pub fn offset_y(&self, dy: f32) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
        }
    }
}

// ==============================================================================
// Body Landmark Layout (33 keypoints)
// ==============================================================================

/// MediaPipe Pose landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

/// Total number of landmarks in the fixed body layout
pub const LANDMARK_COUNT: usize = 33;

impl BodyLandmark {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

// ==============================================================================
// Landmark Frame
// ==============================================================================

/// One complete set of landmarks for one detection cycle.
///
/// Positions follow the fixed 33-point body layout. A landmark the upstream
/// estimator could not resolve is `None`; callers must check before deriving
/// angles from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    points: Vec<Option<Keypoint2D>>,
}

impl LandmarkFrame {
    /// Build a frame from a full ordered landmark sequence
    pub fn new(points: Vec<Option<Keypoint2D>>) -> Self {
        Self { points }
    }

    /// Build a frame where every slot is present (estimator returned all 33)
    pub fn from_points(points: Vec<Keypoint2D>) -> Self {
        Self {
            points: points.into_iter().map(Some).collect(),
        }
    }

    /// Build an empty frame with all slots unresolved
    pub fn empty() -> Self {
        Self {
            points: vec![None; LANDMARK_COUNT],
        }
    }

    /// Look up a landmark by its fixed layout position
    pub fn get(&self, landmark: BodyLandmark) -> Option<Keypoint2D> {
        self.points.get(landmark.index()).copied().flatten()
    }

    /// Replace one landmark slot (used by tests and synthetic frames)
    pub fn set(&mut self, landmark: BodyLandmark, point: Keypoint2D) {
        let idx = landmark.index();
        if idx >= self.points.len() {
            self.points.resize(LANDMARK_COUNT, None);
        }
        self.points[idx] = Some(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(|p| p.is_none())
    }
}
