// Frame dispatcher - owns a coaching session and drives one frame at a time
//
// The dispatcher ties the pieces together: it runs the active exercise's
// state machine, refines the result with the safety grader, stamps and
// publishes the frame result, and feeds the narrator. One dispatcher equals
// one on-screen session; switching exercises resets the session in place.

use crate::core::config::CoachConfig;
use crate::core::detector::Detection;
use crate::core::narration::Narrator;
use crate::core::safety;
use crate::models::exercise::{
    CoachError, CoachResult, ExerciseKind, ExerciseState, FrameResult, QualityStatus,
};
use crate::models::pose::LandmarkFrame;
use crate::models::safety::{SafetyStatus, SafetyVerdict};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct FrameDispatcher {
    session_id: String,
    exercise: ExerciseKind,
    state: ExerciseState,
    /// Controlling angle of the previous accepted frame, for jump detection
    prev_angle: Option<f32>,
    config: Arc<CoachConfig>,
    narrator: Arc<Narrator>,
    result_tx: Option<mpsc::Sender<FrameResult>>,
}

impl FrameDispatcher {
    pub fn new(exercise: ExerciseKind, config: Arc<CoachConfig>, narrator: Arc<Narrator>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            exercise,
            state: ExerciseState::initial(exercise),
            prev_angle: None,
            config,
            narrator,
            result_tx: None,
        }
    }

    /// Attach a channel that receives every accepted frame result. Delivery
    /// is best-effort: a full channel drops the result rather than blocking
    /// the frame path.
    pub fn with_result_channel(mut self, tx: mpsc::Sender<FrameResult>) -> Self {
        self.result_tx = Some(tx);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    /// Switch the active exercise. Rep count, phase, and angle history reset;
    /// any in-flight narration for the old exercise is cancelled.
    pub fn select_exercise(&mut self, exercise: ExerciseKind) {
        self.session_id = Uuid::new_v4().to_string();
        self.exercise = exercise;
        self.state = ExerciseState::initial(exercise);
        self.prev_angle = None;
        self.narrator.stop();
    }

    /// Switch by wire key (e.g. `"bicepCurl"`). Unknown keys fail loudly and
    /// leave the current session untouched.
    pub fn select_exercise_by_key(&mut self, key: &str) -> CoachResult<()> {
        let exercise = ExerciseKind::from_key(key)?;
        self.select_exercise(exercise);
        Ok(())
    }

    /// Process one landmark frame.
    ///
    /// Returns `Ok(None)` when a required landmark is missing: the frame is
    /// dropped and session state stays exactly as it was, so occlusion never
    /// corrupts a rep count. All other errors propagate.
    pub async fn process_frame(&mut self, frame: &LandmarkFrame) -> CoachResult<Option<FrameResult>> {
        let (next_state, detection) = match self.exercise.step(frame, self.state) {
            Ok(stepped) => stepped,
            Err(CoachError::MissingLandmark(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let reps_before = self.state.rep_count;
        self.state = next_state;

        let (verdict, quality, feedback) = self.grade(&detection);

        let result = FrameResult {
            rep_count: self.state.rep_count,
            stage: self.state.stage,
            accuracy: detection.accuracy,
            feedback,
            quality,
            safety: verdict.status,
            angle: detection.angle,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        if let Some(tx) = &self.result_tx {
            if let Err(e) = tx.try_send(result.clone()) {
                eprintln!("Dropping frame result, channel full: {}", e);
            }
        }

        self.narrate(&result, &verdict, reps_before).await;

        Ok(Some(result))
    }

    /// Refine the raw detection with the safety grader. The risk tier
    /// overrides the state machine's quality call; the ideal tier confirms it.
    fn grade(&mut self, detection: &Detection) -> (SafetyVerdict, QualityStatus, String) {
        let rule = self
            .config
            .safety
            .get(self.exercise)
            .filter(|r| r.is_angle_gradable());

        let Some(rule) = rule else {
            // Displacement exercises carry no gradable angle
            return (
                SafetyVerdict::neutral(),
                detection.quality,
                detection.feedback.clone(),
            );
        };

        let angle = detection.angle as f32;
        let verdict = safety::evaluate(rule, angle, self.prev_angle);
        self.prev_angle = Some(angle);

        match verdict.status {
            SafetyStatus::Risk => (verdict.clone(), QualityStatus::Incorrect, verdict.message),
            SafetyStatus::Ideal => (verdict, QualityStatus::Correct, detection.feedback.clone()),
            SafetyStatus::Adjust | SafetyStatus::Neutral => {
                (verdict, detection.quality, detection.feedback.clone())
            }
        }
    }

    /// Pick at most one utterance for this frame. Rep completion wins, then
    /// the safety verdict, then routine form feedback. The narrator applies
    /// its own dedup and cooldown gating on top.
    async fn narrate(&self, result: &FrameResult, verdict: &SafetyVerdict, reps_before: u32) {
        if result.rep_count > reps_before {
            let message = if result.rep_count == 1 {
                "First rep complete. Keep going.".to_string()
            } else {
                format!("{} reps done", result.rep_count)
            };
            self.narrator.announce(&message, true).await;
            return;
        }

        if !verdict.message.is_empty() {
            self.narrator.announce(&verdict.message, verdict.priority).await;
            return;
        }

        if result.quality != QualityStatus::Neutral && !result.feedback.is_empty() {
            self.narrator.announce(&result.feedback, false).await;
        }
    }

    /// End the session: silence the narrator immediately
    pub fn stop(&self) {
        self.narrator.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::narration::{Clock, Language, NarrationConfig, SpeechBackend};
    use crate::models::pose::{BodyLandmark, Keypoint2D};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestClock {
        ms: AtomicU64,
    }

    impl Clock for Arc<TestClock> {
        fn now_ms(&self) -> u64 {
            self.ms.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        utterances: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechBackend for Arc<RecordingBackend> {
        async fn begin_utterance(&self, text: &str, _language: Language) -> CoachResult<()> {
            self.utterances.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn cancel_all(&self) {}

        fn is_speaking(&self) -> bool {
            false
        }
    }

    fn dispatcher(exercise: ExerciseKind) -> (Arc<TestClock>, Arc<RecordingBackend>, FrameDispatcher) {
        let clock = Arc::new(TestClock::default());
        let backend = Arc::new(RecordingBackend::default());
        let narrator = Narrator::new(
            Box::new(clock.clone()),
            Box::new(backend.clone()),
            NarrationConfig::default(),
        );
        let dispatcher = FrameDispatcher::new(
            exercise,
            Arc::new(CoachConfig::default()),
            Arc::new(narrator),
        );
        (clock, backend, dispatcher)
    }

    fn spoken(backend: &RecordingBackend) -> Vec<String> {
        backend.utterances.lock().unwrap().clone()
    }

    /// Both legs at the given knee angle, knee at a fixed point
    fn squat_frame(angle_deg: f32) -> LandmarkFrame {
        let mut frame = LandmarkFrame::empty();
        let dir = (-90.0 + angle_deg).to_radians();
        for (hip, knee, ankle) in [
            (
                BodyLandmark::LeftHip,
                BodyLandmark::LeftKnee,
                BodyLandmark::LeftAnkle,
            ),
            (
                BodyLandmark::RightHip,
                BodyLandmark::RightKnee,
                BodyLandmark::RightAnkle,
            ),
        ] {
            frame.set(hip, Keypoint2D::new(0.5, 0.3));
            frame.set(knee, Keypoint2D::new(0.5, 0.5));
            frame.set(
                ankle,
                Keypoint2D::new(0.5 + 0.2 * dir.cos(), 0.5 + 0.2 * dir.sin()),
            );
        }
        frame
    }

    #[tokio::test]
    async fn test_full_squat_counts_one_rep() {
        let (clock, _backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);

        for (i, angle) in [170.0, 90.0, 170.0].into_iter().enumerate() {
            clock.ms.fetch_add(10_000, Ordering::SeqCst);
            let result = dispatcher
                .process_frame(&squat_frame(angle))
                .await
                .unwrap()
                .unwrap();
            if i == 2 {
                assert_eq!(result.rep_count, 1);
            }
        }
        assert_eq!(dispatcher.rep_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_landmark_drops_frame_and_preserves_state() {
        let (_clock, _backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);
        dispatcher
            .process_frame(&squat_frame(90.0))
            .await
            .unwrap()
            .unwrap();
        let reps = dispatcher.rep_count();
        let stage = dispatcher.state.stage;

        let result = dispatcher.process_frame(&LandmarkFrame::empty()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(dispatcher.rep_count(), reps);
        assert_eq!(dispatcher.state.stage, stage);
    }

    #[tokio::test]
    async fn test_risk_angle_overrides_quality_and_narrates_priority_cue() {
        let (_clock, backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);
        // 50 degrees is below the squat risk threshold of 60
        let result = dispatcher
            .process_frame(&squat_frame(50.0))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.safety, SafetyStatus::Risk);
        assert_eq!(result.quality, QualityStatus::Incorrect);
        assert_eq!(result.feedback, "Too deep. Come up slightly.");
        assert_eq!(spoken(&backend), vec!["Too deep. Come up slightly."]);
    }

    #[tokio::test]
    async fn test_ideal_angle_confirms_correct_quality() {
        let (_clock, _backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);
        let result = dispatcher
            .process_frame(&squat_frame(90.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.safety, SafetyStatus::Ideal);
        assert_eq!(result.quality, QualityStatus::Correct);
    }

    #[tokio::test]
    async fn test_first_rep_gets_its_own_announcement() {
        let (clock, backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);
        for angle in [170.0, 90.0, 170.0] {
            clock.ms.fetch_add(10_000, Ordering::SeqCst);
            dispatcher.process_frame(&squat_frame(angle)).await.unwrap();
        }
        assert!(spoken(&backend).contains(&"First rep complete. Keep going.".to_string()));
    }

    #[tokio::test]
    async fn test_exercise_switch_resets_session() {
        let (clock, _backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);
        for angle in [170.0, 90.0, 170.0] {
            clock.ms.fetch_add(10_000, Ordering::SeqCst);
            dispatcher.process_frame(&squat_frame(angle)).await.unwrap();
        }
        assert_eq!(dispatcher.rep_count(), 1);
        let old_session = dispatcher.session_id().to_string();

        dispatcher.select_exercise(ExerciseKind::BicepCurl);
        assert_eq!(dispatcher.exercise(), ExerciseKind::BicepCurl);
        assert_eq!(dispatcher.rep_count(), 0);
        assert!(dispatcher.prev_angle.is_none());
        assert_ne!(dispatcher.session_id(), old_session);
    }

    #[tokio::test]
    async fn test_unknown_exercise_key_fails_and_preserves_session() {
        let (_clock, _backend, mut dispatcher) = dispatcher(ExerciseKind::Squat);
        let session = dispatcher.session_id().to_string();

        let err = dispatcher.select_exercise_by_key("jumpingJack").unwrap_err();
        assert!(matches!(err, CoachError::UnknownExercise(_)));
        assert_eq!(dispatcher.exercise(), ExerciseKind::Squat);
        assert_eq!(dispatcher.session_id(), session);

        assert!(dispatcher.select_exercise_by_key("bicepCurl").is_ok());
        assert_eq!(dispatcher.exercise(), ExerciseKind::BicepCurl);
    }

    #[tokio::test]
    async fn test_result_channel_receives_accepted_frames() {
        let (_clock, _backend, dispatcher) = dispatcher(ExerciseKind::Squat);
        let (tx, mut rx) = mpsc::channel(16);
        let mut dispatcher = dispatcher.with_result_channel(tx);

        dispatcher.process_frame(&squat_frame(90.0)).await.unwrap();
        let result = rx.try_recv().unwrap();
        assert_eq!(result.safety, SafetyStatus::Ideal);
    }

    #[tokio::test]
    async fn test_calf_raise_skips_angle_grading() {
        let (_clock, _backend, mut dispatcher) = dispatcher(ExerciseKind::CalfRaise);
        let mut frame = LandmarkFrame::empty();
        frame.set(BodyLandmark::LeftAnkle, Keypoint2D::new(0.5, 0.9));
        frame.set(BodyLandmark::RightAnkle, Keypoint2D::new(0.5, 0.9));
        frame.set(BodyLandmark::LeftHeel, Keypoint2D::new(0.5, 0.92));
        frame.set(BodyLandmark::RightHeel, Keypoint2D::new(0.5, 0.92));

        let result = dispatcher.process_frame(&frame).await.unwrap().unwrap();
        assert_eq!(result.safety, SafetyStatus::Neutral);
        assert!(dispatcher.prev_angle.is_none());
    }
}
