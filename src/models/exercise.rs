// Data models for exercise sessions: the exercise registry, carried state,
// per-frame results, and the core error taxonomy

use crate::models::pose::BodyLandmark;
use crate::models::safety::SafetyStatus;
use serde::{Deserialize, Serialize};

// ==============================================================================
// Exercise Registry
// ==============================================================================

/// The closed set of supported exercises.
///
/// Each variant owns one state machine in `core::detector` and one rule row in
/// the safety table. Adding an exercise means adding a variant and a rule row,
/// never a branch in the grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseKind {
    Squat,
    BicepCurl,
    KneeRaise,
    ShoulderPress,
    Lunge,
    LateralRaise,
    ArmCircle,
    CalfRaise,
}

/// All registered exercises, in display order
pub const ALL_EXERCISES: [ExerciseKind; 8] = [
    ExerciseKind::Squat,
    ExerciseKind::BicepCurl,
    ExerciseKind::KneeRaise,
    ExerciseKind::ShoulderPress,
    ExerciseKind::Lunge,
    ExerciseKind::LateralRaise,
    ExerciseKind::ArmCircle,
    ExerciseKind::CalfRaise,
];

impl ExerciseKind {
    /// Stable key used by external callers (UI selection, config rows)
    pub fn key(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::BicepCurl => "bicepCurl",
            ExerciseKind::KneeRaise => "kneeRaise",
            ExerciseKind::ShoulderPress => "shoulderPress",
            ExerciseKind::Lunge => "lunge",
            ExerciseKind::LateralRaise => "lateralRaise",
            ExerciseKind::ArmCircle => "armCircle",
            ExerciseKind::CalfRaise => "calfRaise",
        }
    }

    /// Parse an external key. Unknown keys are a caller contract violation
    /// and fail loudly.
    pub fn from_key(key: &str) -> CoachResult<Self> {
        match key {
            "squat" => Ok(ExerciseKind::Squat),
            "bicepCurl" => Ok(ExerciseKind::BicepCurl),
            "kneeRaise" => Ok(ExerciseKind::KneeRaise),
            "shoulderPress" => Ok(ExerciseKind::ShoulderPress),
            "lunge" => Ok(ExerciseKind::Lunge),
            "lateralRaise" => Ok(ExerciseKind::LateralRaise),
            "armCircle" => Ok(ExerciseKind::ArmCircle),
            "calfRaise" => Ok(ExerciseKind::CalfRaise),
            other => Err(CoachError::UnknownExercise(other.to_string())),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "Squat",
            ExerciseKind::BicepCurl => "Bicep Curl",
            ExerciseKind::KneeRaise => "Knee Raise",
            ExerciseKind::ShoulderPress => "Shoulder Press",
            ExerciseKind::Lunge => "Lunge",
            ExerciseKind::LateralRaise => "Lateral Raise",
            ExerciseKind::ArmCircle => "Arm Circle",
            ExerciseKind::CalfRaise => "Calf Raise",
        }
    }

    /// Camera setup hint shown before a session starts
    pub fn description(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "Stand 6-8 feet from camera, full body visible",
            ExerciseKind::BicepCurl => "Show your side profile to camera",
            ExerciseKind::KneeRaise => "Face the camera, stand straight",
            ExerciseKind::ShoulderPress => "Show your side profile to camera",
            ExerciseKind::Lunge => "Stand sideways, full body visible",
            ExerciseKind::LateralRaise => "Face the camera, arms at your sides",
            ExerciseKind::ArmCircle => "Face the camera, arms extended",
            ExerciseKind::CalfRaise => "Stand sideways, feet and hips visible",
        }
    }

    /// The stage an exercise rests in before its first repetition
    pub fn initial_stage(&self) -> Stage {
        match self {
            ExerciseKind::Squat | ExerciseKind::Lunge => Stage::Up,
            ExerciseKind::BicepCurl
            | ExerciseKind::KneeRaise
            | ExerciseKind::ShoulderPress
            | ExerciseKind::LateralRaise
            | ExerciseKind::ArmCircle
            | ExerciseKind::CalfRaise => Stage::Down,
        }
    }
}

// ==============================================================================
// Carried Session State
// ==============================================================================

/// The discrete phase of a repetition cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Up,
    Down,
}

/// Per-session exercise state, passed by value into and out of each
/// state-machine step. Owned exclusively by the session loop; never shared
/// across sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseState {
    /// Completed repetitions; monotone non-decreasing within a session
    pub rep_count: u32,
    pub stage: Stage,
    /// Controlling angle from the previous processed frame
    pub last_angle: f32,
    /// Per-session anchor coordinate for displacement exercises (calf raise)
    pub baseline_y: Option<f32>,
}

impl ExerciseState {
    pub fn initial(kind: ExerciseKind) -> Self {
        Self {
            rep_count: 0,
            stage: kind.initial_stage(),
            last_angle: 0.0,
            baseline_y: None,
        }
    }
}

// ==============================================================================
// Per-Frame Result
// ==============================================================================

/// Form classification surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Correct,
    Incorrect,
    Adjust,
    Neutral,
}

/// Everything the UI and narration layers need about one processed frame.
/// Produced fresh every frame and never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    pub rep_count: u32,
    pub stage: Stage,
    /// Form accuracy score, 0-100
    pub accuracy: u8,
    /// Coaching cue for this frame (may be empty)
    pub feedback: String,
    pub quality: QualityStatus,
    /// Safety grader tier for this frame (Neutral when grading did not apply)
    pub safety: SafetyStatus,
    /// Controlling joint angle in whole degrees (0 for displacement exercises)
    pub angle: i32,
    /// Unix milliseconds when the frame was processed
    pub timestamp: i64,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("required landmark missing from frame: {0:?}")]
    MissingLandmark(BodyLandmark),

    #[error("unknown exercise key: {0}")]
    UnknownExercise(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("narration backend failed: {0}")]
    NarrationFailed(String),
}

pub type CoachResult<T> = Result<T, CoachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for kind in ALL_EXERCISES {
            assert_eq!(ExerciseKind::from_key(kind.key()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_key_fails_loudly() {
        let err = ExerciseKind::from_key("jumpingJack").unwrap_err();
        assert!(matches!(err, CoachError::UnknownExercise(ref k) if k == "jumpingJack"));
    }

    #[test]
    fn test_initial_state_matches_rest_stage() {
        let squat = ExerciseState::initial(ExerciseKind::Squat);
        assert_eq!(squat.stage, Stage::Up);
        assert_eq!(squat.rep_count, 0);
        assert!(squat.baseline_y.is_none());

        let curl = ExerciseState::initial(ExerciseKind::BicepCurl);
        assert_eq!(curl.stage, Stage::Down);
    }
}
