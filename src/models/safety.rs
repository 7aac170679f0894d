// Data models for the safety/form grader: per-exercise rule rows and verdicts

use crate::models::exercise::{CoachError, CoachResult, ExerciseKind, ALL_EXERCISES};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==============================================================================
// Rule Rows
// ==============================================================================

/// Threshold row for one exercise. Pure data: the grader in `core::safety`
/// holds no per-exercise branches, only this configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyRule {
    /// Ideal angle range in degrees (inclusive)
    pub ideal_min: f32,
    pub ideal_max: f32,
    /// Angle below which the movement is flagged as injury-risk.
    /// Zero disables the risk tier.
    pub risk_threshold: f32,
    /// Joint the rule grades, for display
    pub joint: String,
    /// Cue when the angle is below the ideal range
    pub too_low: String,
    /// Cue when the angle is above the ideal range
    pub too_high: String,
    /// Cue when the angle is within the ideal range
    pub perfect: String,
    /// Cue for ballistic/uncontrolled movement between frames
    pub slow_down: String,
}

impl SafetyRule {
    /// Whether this rule grades a joint angle at all. Displacement exercises
    /// (calf raise) carry an empty ideal range and are not angle-gradable.
    pub fn is_angle_gradable(&self) -> bool {
        self.risk_threshold > 0.0 || self.ideal_max > 0.0
    }

    pub fn validate(&self, key: &str) -> CoachResult<()> {
        if !(0.0..=180.0).contains(&self.ideal_min) || !(0.0..=180.0).contains(&self.ideal_max) {
            return Err(CoachError::InvalidConfig(format!(
                "{}: ideal range [{}, {}] outside [0, 180]",
                key, self.ideal_min, self.ideal_max
            )));
        }
        if self.ideal_min > self.ideal_max {
            return Err(CoachError::InvalidConfig(format!(
                "{}: ideal min {} exceeds max {}",
                key, self.ideal_min, self.ideal_max
            )));
        }
        if self.risk_threshold < 0.0 || self.risk_threshold > 180.0 {
            return Err(CoachError::InvalidConfig(format!(
                "{}: risk threshold {} outside [0, 180]",
                key, self.risk_threshold
            )));
        }
        Ok(())
    }
}

// ==============================================================================
// Grader Output
// ==============================================================================

/// Severity tier produced by the grader for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    Risk,
    Ideal,
    Adjust,
    Neutral,
}

/// Grader result for one frame. `message` is empty for the Neutral tier;
/// `priority` marks the message for narration cooldown bypass.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyVerdict {
    pub status: SafetyStatus,
    pub message: String,
    pub priority: bool,
}

impl SafetyVerdict {
    pub fn neutral() -> Self {
        Self {
            status: SafetyStatus::Neutral,
            message: String::new(),
            priority: false,
        }
    }
}

// ==============================================================================
// Rule Table
// ==============================================================================

/// The full per-exercise threshold table. Loaded once, read-only afterwards,
/// shared by every session of an exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyTable {
    rules: HashMap<ExerciseKind, SafetyRule>,
}

impl SafetyTable {
    pub fn get(&self, kind: ExerciseKind) -> Option<&SafetyRule> {
        self.rules.get(&kind)
    }

    /// Reject malformed rows at configuration-load time, never at frame time
    pub fn validate(&self) -> CoachResult<()> {
        for kind in ALL_EXERCISES {
            if !self.rules.contains_key(&kind) {
                return Err(CoachError::InvalidConfig(format!(
                    "missing safety rule for exercise: {}",
                    kind.key()
                )));
            }
        }
        for (kind, rule) in &self.rules {
            rule.validate(kind.key())?;
        }
        Ok(())
    }
}

fn rule(
    ideal: (f32, f32),
    risk: f32,
    joint: &str,
    too_low: &str,
    too_high: &str,
    perfect: &str,
    slow_down: &str,
) -> SafetyRule {
    SafetyRule {
        ideal_min: ideal.0,
        ideal_max: ideal.1,
        risk_threshold: risk,
        joint: joint.to_string(),
        too_low: too_low.to_string(),
        too_high: too_high.to_string(),
        perfect: perfect.to_string(),
        slow_down: slow_down.to_string(),
    }
}

impl Default for SafetyTable {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            ExerciseKind::Squat,
            rule(
                (80.0, 100.0),
                60.0,
                "knee",
                "Too deep. Come up slightly.",
                "Bend your knees more. Go lower.",
                "Perfect squat depth. Hold it.",
                "Slow down. Control the movement.",
            ),
        );
        rules.insert(
            ExerciseKind::Lunge,
            rule(
                (80.0, 110.0),
                60.0,
                "knee",
                "Not too deep. Come up.",
                "Lower your back knee more.",
                "Great lunge form. Hold steady.",
                "Slow down. Control the movement.",
            ),
        );
        rules.insert(
            ExerciseKind::BicepCurl,
            rule(
                (50.0, 70.0),
                30.0,
                "elbow",
                "Curl up more. Bring weight to shoulder.",
                "Lower your arm. Extend fully.",
                "Perfect curl. Squeeze at the top.",
                "Slow and controlled movement.",
            ),
        );
        rules.insert(
            ExerciseKind::ShoulderPress,
            rule(
                (160.0, 180.0),
                140.0,
                "elbow",
                "Press arms up higher. Full extension.",
                "Lower to shoulder level.",
                "Perfect press. Arms fully extended.",
                "Slow down. Control the movement.",
            ),
        );
        rules.insert(
            ExerciseKind::LateralRaise,
            rule(
                (70.0, 110.0),
                40.0,
                "shoulder",
                "Raise arms higher. To shoulder level.",
                "Lower slightly. Don't go above shoulders.",
                "Perfect height. Arms parallel to floor.",
                "Slow and controlled. Feel the burn.",
            ),
        );
        rules.insert(
            ExerciseKind::KneeRaise,
            rule(
                (80.0, 100.0),
                60.0,
                "hip",
                "Lift knee higher. To hip level.",
                "Lower your knee slightly.",
                "Perfect knee height. Hold balance.",
                "Slow down. Control the movement.",
            ),
        );
        rules.insert(
            ExerciseKind::CalfRaise,
            rule(
                (0.0, 0.0),
                0.0,
                "ankle",
                "Rise higher on your toes.",
                "Good height. Hold at the top.",
                "Perfect calf raise. Squeeze at top.",
                "Slow descent. Control the movement.",
            ),
        );
        rules.insert(
            ExerciseKind::ArmCircle,
            rule(
                (150.0, 180.0),
                120.0,
                "shoulder",
                "Make bigger circles. Full range.",
                "Good range of motion.",
                "Perfect circles. Keep arms straight.",
                "Slow and smooth circles.",
            ),
        );
        Self { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = SafetyTable::default();
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_default_table_covers_every_exercise() {
        let table = SafetyTable::default();
        for kind in ALL_EXERCISES {
            assert!(table.get(kind).is_some(), "missing rule for {}", kind.key());
        }
    }

    #[test]
    fn test_inverted_ideal_range_rejected() {
        let mut table = SafetyTable::default();
        let squat = table.rules.get_mut(&ExerciseKind::Squat).unwrap();
        squat.ideal_min = 120.0;
        squat.ideal_max = 80.0;
        assert!(matches!(
            table.validate(),
            Err(CoachError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_out_of_range_ideal_rejected() {
        let mut table = SafetyTable::default();
        let press = table.rules.get_mut(&ExerciseKind::ShoulderPress).unwrap();
        press.ideal_max = 200.0;
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_missing_rule_rejected() {
        let mut table = SafetyTable::default();
        table.rules.remove(&ExerciseKind::Lunge);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_calf_raise_is_not_angle_gradable() {
        let table = SafetyTable::default();
        assert!(!table.get(ExerciseKind::CalfRaise).unwrap().is_angle_gradable());
        assert!(table.get(ExerciseKind::Squat).unwrap().is_angle_gradable());
    }
}
