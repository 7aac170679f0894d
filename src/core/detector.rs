// Exercise state machines - one hysteresis-based rep classifier per exercise
//
// Each machine consumes one landmark frame plus the carried session state and
// emits the next state and a raw detection. Thresholds follow the tuned
// per-exercise values; they are intentionally not unified across exercises.

use crate::core::geometry::angle_at;
use crate::models::exercise::{
    CoachError, CoachResult, ExerciseKind, ExerciseState, QualityStatus, Stage,
};
use crate::models::pose::{BodyLandmark, Keypoint2D, LandmarkFrame};

// Two-phase transition thresholds, degrees
const SQUAT_DOWN_ANGLE: f32 = 100.0;
const SQUAT_UP_ANGLE: f32 = 160.0;
const CURL_FLEXED_ANGLE: f32 = 70.0;
const CURL_EXTENDED_ANGLE: f32 = 150.0;
const KNEE_RAISE_UP_ANGLE: f32 = 100.0;
const KNEE_RAISE_DOWN_ANGLE: f32 = 160.0;
const PRESS_UP_ANGLE: f32 = 160.0;
const PRESS_DOWN_ANGLE: f32 = 100.0;
const LUNGE_DOWN_ANGLE: f32 = 110.0;
const LUNGE_UP_ANGLE: f32 = 160.0;
const RAISE_UP_ANGLE: f32 = 70.0;
const RAISE_DOWN_ANGLE: f32 = 30.0;
const RAISE_IDEAL_MAX: f32 = 110.0;
const ARM_CIRCLE_STRAIGHT_ANGLE: f32 = 150.0;

// Positional zone offsets, normalized frame units
const ARM_CIRCLE_ZONE_OFFSET: f32 = 0.05;
const CALF_RAISE_LIFT_EPSILON: f32 = 0.03;
const CALF_RAISE_SETTLE_EPSILON: f32 = 0.01;

// Virtual reference point height for the knee-raise hip angle
const KNEE_RAISE_TORSO_OFFSET: f32 = -0.2;

/// Raw per-frame emission from a state machine, before safety refinement
/// and timestamping by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub accuracy: u8,
    pub feedback: String,
    pub quality: QualityStatus,
    /// Controlling joint angle, whole degrees; 0 for displacement exercises
    pub angle: i32,
}

impl ExerciseKind {
    /// Advance this exercise's state machine by one frame.
    ///
    /// Pure: the caller owns the state and decides what to do with the
    /// returned one. A missing required landmark yields `MissingLandmark`
    /// and the caller must drop the frame without touching its state.
    pub fn step(
        &self,
        frame: &LandmarkFrame,
        state: ExerciseState,
    ) -> CoachResult<(ExerciseState, Detection)> {
        match self {
            ExerciseKind::Squat => step_squat(frame, state),
            ExerciseKind::BicepCurl => step_bicep_curl(frame, state),
            ExerciseKind::KneeRaise => step_knee_raise(frame, state),
            ExerciseKind::ShoulderPress => step_shoulder_press(frame, state),
            ExerciseKind::Lunge => step_lunge(frame, state),
            ExerciseKind::LateralRaise => step_lateral_raise(frame, state),
            ExerciseKind::ArmCircle => step_arm_circle(frame, state),
            ExerciseKind::CalfRaise => step_calf_raise(frame, state),
        }
    }
}

fn require(frame: &LandmarkFrame, landmark: BodyLandmark) -> CoachResult<Keypoint2D> {
    frame
        .get(landmark)
        .ok_or(CoachError::MissingLandmark(landmark))
}

fn detection(accuracy: f32, feedback: &str, quality: QualityStatus, angle: f32) -> Detection {
    Detection {
        accuracy: accuracy.clamp(0.0, 100.0).round() as u8,
        feedback: feedback.to_string(),
        quality,
        angle: angle.round() as i32,
    }
}

// ==============================================================================
// Squat
// ==============================================================================

fn step_squat(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let left = angle_at(
        require(frame, BodyLandmark::LeftHip)?,
        require(frame, BodyLandmark::LeftKnee)?,
        require(frame, BodyLandmark::LeftAnkle)?,
    );
    let right = angle_at(
        require(frame, BodyLandmark::RightHip)?,
        require(frame, BodyLandmark::RightKnee)?,
        require(frame, BodyLandmark::RightAnkle)?,
    );
    // The more-flexed side limits squat depth
    let knee_angle = left.min(right);

    let is_down = knee_angle < SQUAT_DOWN_ANGLE;
    let is_up = knee_angle > SQUAT_UP_ANGLE;

    let mut feedback = "Stand with feet shoulder-width apart";
    let mut quality = QualityStatus::Neutral;

    if is_down && state.stage == Stage::Up {
        state.stage = Stage::Down;
        feedback = "Good! Now stand up";
        quality = QualityStatus::Correct;
    } else if is_up && state.stage == Stage::Down {
        state.stage = Stage::Up;
        state.rep_count += 1;
        feedback = "Great rep! Go down again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down && !is_down && !is_up {
        feedback = "Go lower for full squat";
        quality = QualityStatus::Adjust;
    } else if state.stage == Stage::Up {
        feedback = "Squat down";
    }

    let accuracy = if is_down || is_up {
        100.0
    } else {
        100.0 - (knee_angle - 90.0).abs()
    };

    state.last_angle = knee_angle;
    Ok((state, detection(accuracy, feedback, quality, knee_angle)))
}

// ==============================================================================
// Bicep Curl
// ==============================================================================

fn step_bicep_curl(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    // Left arm only: the exercise assumes a side-profile camera
    let elbow_angle = angle_at(
        require(frame, BodyLandmark::LeftShoulder)?,
        require(frame, BodyLandmark::LeftElbow)?,
        require(frame, BodyLandmark::LeftWrist)?,
    );

    let is_curled = elbow_angle < CURL_FLEXED_ANGLE;
    let is_extended = elbow_angle > CURL_EXTENDED_ANGLE;

    let mut feedback = "Keep elbow stable";
    let mut quality = QualityStatus::Neutral;

    if is_curled && state.stage == Stage::Down {
        state.stage = Stage::Up;
        feedback = "Good curl! Now lower";
        quality = QualityStatus::Correct;
    } else if is_extended && state.stage == Stage::Up {
        state.stage = Stage::Down;
        state.rep_count += 1;
        feedback = "Perfect! Curl again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down && !is_extended {
        feedback = "Extend arm fully";
        quality = QualityStatus::Adjust;
    } else if state.stage == Stage::Up && !is_curled {
        feedback = "Curl up more";
        quality = QualityStatus::Adjust;
    }

    let accuracy = if is_curled || is_extended { 100.0 } else { 70.0 };

    state.last_angle = elbow_angle;
    Ok((state, detection(accuracy, feedback, quality, elbow_angle)))
}

// ==============================================================================
// Knee Raise
// ==============================================================================

fn step_knee_raise(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let hip = require(frame, BodyLandmark::LeftHip)?;
    let knee = require(frame, BodyLandmark::LeftKnee)?;

    // Hip flexion measured against a virtual point directly above the hip
    let hip_angle = angle_at(hip.offset_y(KNEE_RAISE_TORSO_OFFSET), hip, knee);

    let is_raised = hip_angle < KNEE_RAISE_UP_ANGLE;
    let is_down = hip_angle > KNEE_RAISE_DOWN_ANGLE;

    let mut feedback = "Stand straight";
    let mut quality = QualityStatus::Neutral;

    if is_raised && state.stage == Stage::Down {
        state.stage = Stage::Up;
        feedback = "Good! Lower your leg";
        quality = QualityStatus::Correct;
    } else if is_down && state.stage == Stage::Up {
        state.stage = Stage::Down;
        state.rep_count += 1;
        feedback = "Nice! Raise again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down {
        feedback = "Raise your knee";
    } else {
        feedback = "Lower your leg";
        quality = QualityStatus::Adjust;
    }

    let accuracy = if is_raised || is_down { 100.0 } else { 75.0 };

    state.last_angle = hip_angle;
    Ok((state, detection(accuracy, feedback, quality, hip_angle)))
}

// ==============================================================================
// Shoulder Press
// ==============================================================================

fn step_shoulder_press(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let shoulder = require(frame, BodyLandmark::LeftShoulder)?;
    let elbow = require(frame, BodyLandmark::LeftElbow)?;
    let wrist = require(frame, BodyLandmark::LeftWrist)?;

    let elbow_angle = angle_at(shoulder, elbow, wrist);

    // A press only counts as locked out with the wrist above the shoulder
    let is_pressed = elbow_angle > PRESS_UP_ANGLE && wrist.y < shoulder.y;
    let is_down = elbow_angle < PRESS_DOWN_ANGLE;

    let mut feedback = "Start position";
    let mut quality = QualityStatus::Neutral;

    if is_pressed && state.stage == Stage::Down {
        state.stage = Stage::Up;
        feedback = "Great press! Lower down";
        quality = QualityStatus::Correct;
    } else if is_down && state.stage == Stage::Up {
        state.stage = Stage::Down;
        state.rep_count += 1;
        feedback = "Perfect! Press again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down {
        feedback = "Press arms up";
    } else {
        feedback = "Lower to shoulders";
        quality = QualityStatus::Adjust;
    }

    let accuracy = if is_pressed || is_down { 100.0 } else { 80.0 };

    state.last_angle = elbow_angle;
    Ok((state, detection(accuracy, feedback, quality, elbow_angle)))
}

// ==============================================================================
// Lunge
// ==============================================================================

fn step_lunge(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let left = angle_at(
        require(frame, BodyLandmark::LeftHip)?,
        require(frame, BodyLandmark::LeftKnee)?,
        require(frame, BodyLandmark::LeftAnkle)?,
    );
    let right = angle_at(
        require(frame, BodyLandmark::RightHip)?,
        require(frame, BodyLandmark::RightKnee)?,
        require(frame, BodyLandmark::RightAnkle)?,
    );
    // The front leg flexes deepest and limits lunge depth
    let knee_angle = left.min(right);

    let is_down = knee_angle < LUNGE_DOWN_ANGLE;
    let is_up = knee_angle > LUNGE_UP_ANGLE;

    let mut feedback = "Keep torso upright";
    let mut quality = QualityStatus::Neutral;

    if is_down && state.stage == Stage::Up {
        state.stage = Stage::Down;
        feedback = "Good depth! Now rise up";
        quality = QualityStatus::Correct;
    } else if is_up && state.stage == Stage::Down {
        state.stage = Stage::Up;
        state.rep_count += 1;
        feedback = "Great lunge! Step again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down && !is_down && !is_up {
        feedback = "Sink deeper into the lunge";
        quality = QualityStatus::Adjust;
    } else if state.stage == Stage::Up {
        feedback = "Step forward and lower";
    }

    let accuracy = if is_down || is_up {
        100.0
    } else {
        100.0 - (knee_angle - 95.0).abs()
    };

    state.last_angle = knee_angle;
    Ok((state, detection(accuracy, feedback, quality, knee_angle)))
}

// ==============================================================================
// Lateral Raise
// ==============================================================================

fn step_lateral_raise(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let shoulder_angle = angle_at(
        require(frame, BodyLandmark::LeftHip)?,
        require(frame, BodyLandmark::LeftShoulder)?,
        require(frame, BodyLandmark::LeftElbow)?,
    );

    let is_raised = shoulder_angle > RAISE_UP_ANGLE;
    let is_lowered = shoulder_angle < RAISE_DOWN_ANGLE;

    let mut feedback = "Keep arms slightly bent";
    let mut quality = QualityStatus::Neutral;

    if is_raised && state.stage == Stage::Down {
        state.stage = Stage::Up;
        feedback = "Good height! Now lower";
        quality = QualityStatus::Correct;
    } else if is_lowered && state.stage == Stage::Up {
        state.stage = Stage::Down;
        state.rep_count += 1;
        feedback = "Nice raise! Lift again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down {
        feedback = "Raise your arms out";
    } else {
        feedback = "Lower your arms";
        quality = QualityStatus::Adjust;
    }

    let in_ideal = (RAISE_UP_ANGLE..=RAISE_IDEAL_MAX).contains(&shoulder_angle);
    let accuracy = if in_ideal || is_lowered { 100.0 } else { 75.0 };

    state.last_angle = shoulder_angle;
    Ok((state, detection(accuracy, feedback, quality, shoulder_angle)))
}

// ==============================================================================
// Arm Circle
// ==============================================================================

fn step_arm_circle(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let shoulder = require(frame, BodyLandmark::LeftShoulder)?;
    let elbow = require(frame, BodyLandmark::LeftElbow)?;
    let wrist = require(frame, BodyLandmark::LeftWrist)?;

    // Positional machine: the wrist's vertical zone relative to the shoulder.
    // The stage itself de-bounces re-entry into the same zone.
    let in_top = wrist.y < shoulder.y - ARM_CIRCLE_ZONE_OFFSET;
    let in_bottom = wrist.y > shoulder.y + ARM_CIRCLE_ZONE_OFFSET;

    let elbow_angle = angle_at(shoulder, elbow, wrist);
    let arm_straight = elbow_angle >= ARM_CIRCLE_STRAIGHT_ANGLE;

    let mut feedback = "Make smooth circles";
    let mut quality = QualityStatus::Neutral;

    if in_top && state.stage == Stage::Down {
        state.stage = Stage::Up;
        state.rep_count += 1;
        feedback = "Full circle! Keep them coming";
        quality = QualityStatus::Correct;
    } else if in_bottom && state.stage == Stage::Up {
        state.stage = Stage::Down;
        feedback = "Swing back up";
        quality = QualityStatus::Correct;
    } else if !arm_straight {
        feedback = "Keep arms extended. Don't bend elbows";
        quality = QualityStatus::Adjust;
    }

    let accuracy = if arm_straight {
        100.0
    } else {
        100.0 - (ARM_CIRCLE_STRAIGHT_ANGLE - elbow_angle)
    };

    state.last_angle = elbow_angle;
    Ok((state, detection(accuracy, feedback, quality, elbow_angle)))
}

// ==============================================================================
// Calf Raise
// ==============================================================================

fn step_calf_raise(frame: &LandmarkFrame, mut state: ExerciseState) -> CoachResult<(ExerciseState, Detection)> {
    let ankle = require(frame, BodyLandmark::LeftAnkle)?;

    // The first usable frame anchors the session baseline; all later frames
    // are classified relative to it, never to an absolute height.
    let baseline = match state.baseline_y {
        Some(y) => y,
        None => {
            state.baseline_y = Some(ankle.y);
            let det = detection(
                100.0,
                "Stand tall, heels on the ground",
                QualityStatus::Neutral,
                0.0,
            );
            return Ok((state, det));
        }
    };

    let is_raised = ankle.y < baseline - CALF_RAISE_LIFT_EPSILON;
    let is_lowered = ankle.y >= baseline - CALF_RAISE_SETTLE_EPSILON;

    let mut feedback = "Keep your balance";
    let mut quality = QualityStatus::Neutral;

    if is_raised && state.stage == Stage::Down {
        state.stage = Stage::Up;
        feedback = "Good! Hold at the top";
        quality = QualityStatus::Correct;
    } else if is_lowered && state.stage == Stage::Up {
        state.stage = Stage::Down;
        state.rep_count += 1;
        feedback = "Nice! Rise again";
        quality = QualityStatus::Correct;
    } else if state.stage == Stage::Down {
        feedback = "Rise onto your toes";
    } else {
        feedback = "Lower your heels with control";
        quality = QualityStatus::Adjust;
    }

    let accuracy = if is_raised || is_lowered { 100.0 } else { 80.0 };

    state.last_angle = 0.0;
    Ok((state, detection(accuracy, feedback, quality, 0.0)))
}
