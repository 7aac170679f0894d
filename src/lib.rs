pub mod core;
pub mod models;

pub use crate::core::config::CoachConfig;
pub use crate::core::dispatcher::FrameDispatcher;
pub use crate::core::narration::{Clock, Language, Narrator, SpeechBackend, SystemClock};
pub use crate::models::exercise::{
    CoachError, CoachResult, ExerciseKind, ExerciseState, FrameResult, QualityStatus, Stage,
    ALL_EXERCISES,
};
pub use crate::models::pose::{BodyLandmark, Keypoint2D, LandmarkFrame, LANDMARK_COUNT};
pub use crate::models::safety::{SafetyRule, SafetyStatus, SafetyTable, SafetyVerdict};
