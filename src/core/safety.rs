// Safety/form grading - maps a joint angle to a severity tier and cue
//
// Exercise-agnostic: every decision here is driven by the rule row, so a new
// exercise only ever adds configuration, never a branch.

use crate::models::safety::{SafetyRule, SafetyStatus, SafetyVerdict};

/// Angle change between consecutive frames that reads as ballistic movement
pub const ANGLE_JUMP_THRESHOLD: f32 = 20.0;

/// Grade one frame's controlling angle against an exercise's rule row.
///
/// Evaluation order: risk zone (priority, overrides everything), ideal range,
/// over-extension, then uncontrolled movement. Silence is the default.
pub fn evaluate(rule: &SafetyRule, angle: f32, prev_angle: Option<f32>) -> SafetyVerdict {
    if rule.risk_threshold > 0.0 && angle < rule.risk_threshold {
        return SafetyVerdict {
            status: SafetyStatus::Risk,
            message: rule.too_low.clone(),
            priority: true,
        };
    }

    if angle >= rule.ideal_min && angle <= rule.ideal_max {
        return SafetyVerdict {
            status: SafetyStatus::Ideal,
            message: rule.perfect.clone(),
            priority: false,
        };
    }

    if angle > rule.ideal_max {
        return SafetyVerdict {
            status: SafetyStatus::Adjust,
            message: rule.too_high.clone(),
            priority: false,
        };
    }

    let angle_diff = prev_angle.map(|p| (angle - p).abs()).unwrap_or(0.0);
    if angle_diff > ANGLE_JUMP_THRESHOLD {
        return SafetyVerdict {
            status: SafetyStatus::Adjust,
            message: rule.slow_down.clone(),
            priority: false,
        };
    }

    SafetyVerdict::neutral()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exercise::ExerciseKind;
    use crate::models::safety::SafetyTable;

    fn squat_rule() -> SafetyRule {
        SafetyTable::default()
            .get(ExerciseKind::Squat)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_risk_overrides_everything() {
        // Squat risk threshold is 60: a 50 degree knee angle is risk tier
        // regardless of phase or history
        let verdict = evaluate(&squat_rule(), 50.0, Some(55.0));
        assert_eq!(verdict.status, SafetyStatus::Risk);
        assert!(verdict.priority);
        assert_eq!(verdict.message, "Too deep. Come up slightly.");
    }

    #[test]
    fn test_ideal_range_is_perfect() {
        let verdict = evaluate(&squat_rule(), 90.0, Some(92.0));
        assert_eq!(verdict.status, SafetyStatus::Ideal);
        assert!(!verdict.priority);
        assert_eq!(verdict.message, "Perfect squat depth. Hold it.");
    }

    #[test]
    fn test_above_ideal_is_adjust() {
        let verdict = evaluate(&squat_rule(), 120.0, Some(118.0));
        assert_eq!(verdict.status, SafetyStatus::Adjust);
        assert_eq!(verdict.message, "Bend your knees more. Go lower.");
    }

    #[test]
    fn test_ballistic_movement_gets_slow_down_cue() {
        // Between risk and ideal, but the angle jumped 25 degrees in a frame
        let verdict = evaluate(&squat_rule(), 75.0, Some(100.0));
        assert_eq!(verdict.status, SafetyStatus::Adjust);
        assert_eq!(verdict.message, "Slow down. Control the movement.");
    }

    #[test]
    fn test_silence_is_the_default() {
        // Below ideal but above risk, moving slowly: no message
        let verdict = evaluate(&squat_rule(), 75.0, Some(78.0));
        assert_eq!(verdict, SafetyVerdict::neutral());
        assert!(verdict.message.is_empty());
    }

    #[test]
    fn test_first_frame_has_no_jump() {
        let verdict = evaluate(&squat_rule(), 75.0, None);
        assert_eq!(verdict.status, SafetyStatus::Neutral);
    }

    #[test]
    fn test_zero_risk_threshold_disables_risk_tier() {
        let mut rule = squat_rule();
        rule.risk_threshold = 0.0;
        let verdict = evaluate(&rule, 30.0, None);
        assert_ne!(verdict.status, SafetyStatus::Risk);
    }
}
