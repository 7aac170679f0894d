// Narration throttle - decides which coaching cues are actually spoken
//
// The narrator sits between the frame loop and a black-box text-to-speech
// backend. It de-duplicates repeated cues, enforces cooldown windows, and
// lets priority (injury-risk) cues interrupt whatever is in flight. Clock and
// speech backend are injected so the gating logic tests deterministically.

use crate::models::exercise::CoachResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::RwLock;

// ==============================================================================
// Configuration
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NarrationConfig {
    /// Minimum gap between routine utterance starts
    pub routine_cooldown_ms: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            routine_cooldown_ms: 8_000,
        }
    }
}

/// Narration language mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Hindi,
}

// ==============================================================================
// Injected Collaborators
// ==============================================================================

/// Monotonic time source for cooldown gating
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

/// Wall-clock implementation used in production
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Black-box text-to-speech engine
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Start speaking. Resolves once the engine has actually begun the
    /// utterance, or with an error if it never started.
    async fn begin_utterance(&self, text: &str, language: Language) -> CoachResult<()>;

    /// Cancel whatever is currently being spoken
    fn cancel_all(&self);

    /// Whether an utterance is currently in flight
    fn is_speaking(&self) -> bool;
}

// ==============================================================================
// Narrator
// ==============================================================================

#[derive(Debug, Default)]
struct ThrottleState {
    last_text: String,
    last_start_ms: Option<u64>,
}

/// Rate-limited spoken coaching
pub struct Narrator {
    clock: Box<dyn Clock>,
    backend: Box<dyn SpeechBackend>,
    config: NarrationConfig,
    language: RwLock<Language>,
    enabled: RwLock<bool>,
    state: RwLock<ThrottleState>,
}

impl Narrator {
    pub fn new(
        clock: Box<dyn Clock>,
        backend: Box<dyn SpeechBackend>,
        config: NarrationConfig,
    ) -> Self {
        Self {
            clock,
            backend,
            config,
            language: RwLock::new(Language::English),
            enabled: RwLock::new(true),
            state: RwLock::new(ThrottleState::default()),
        }
    }

    pub async fn set_enabled(&self, enabled: bool) {
        *self.enabled.write().await = enabled;
    }

    pub async fn set_language(&self, language: Language) {
        *self.language.write().await = language;
    }

    /// Submit a candidate utterance. Applies translation, the repetition
    /// guard, and the cooldown guard; on acceptance cancels any in-flight
    /// speech and starts the new utterance. Backend failures are logged and
    /// swallowed so a failed utterance never stalls the frame path.
    pub async fn announce(&self, text: &str, priority: bool) {
        if text.is_empty() || !*self.enabled.read().await {
            return;
        }

        let language = *self.language.read().await;
        let text = match language {
            Language::English => text.to_string(),
            Language::Hindi => translate_to_hindi(text),
        };

        // Suppression applies to routine cues only. A priority cue skips the
        // repetition, cooldown, and in-flight guards entirely: an injury-risk
        // warning is never silently dropped.
        if !priority {
            let state = self.state.read().await;

            if text == state.last_text {
                return;
            }

            let now = self.clock.now_ms();
            if let Some(start) = state.last_start_ms {
                if now.saturating_sub(start) < self.config.routine_cooldown_ms {
                    return;
                }
            }
            if self.backend.is_speaking() {
                return;
            }
        }

        // Supersede whatever is in flight
        self.backend.cancel_all();

        let started_at = self.clock.now_ms();
        match self.backend.begin_utterance(&text, language).await {
            Ok(()) => {
                // Only a confirmed start updates the dedup state, so a
                // cancelled-and-superseded utterance cannot poison it
                let mut state = self.state.write().await;
                state.last_text = text;
                state.last_start_ms = Some(started_at);
            }
            Err(e) => {
                eprintln!("Narration backend error: {}", e);
            }
        }
    }

    /// Cancel any in-flight utterance immediately
    pub fn stop(&self) {
        self.backend.cancel_all();
    }
}

// ==============================================================================
// Hindi Phrasebook
// ==============================================================================

/// Exact-match translations for the coaching cue set
const HINDI_PHRASES: &[(&str, &str)] = &[
    // Squat
    ("Too deep. Come up slightly.", "बहुत नीचे। थोड़ा ऊपर आएं।"),
    ("Bend your knees more. Go lower.", "घुटने और मोड़ें। नीचे जाएं।"),
    ("Perfect squat depth. Hold it.", "बिल्कुल सही। इसे पकड़ें।"),
    ("Keep your back straight.", "अपनी पीठ सीधी रखें।"),
    // Lunge
    ("Not too deep. Come up.", "बहुत नीचे नहीं। ऊपर आएं।"),
    ("Lower your back knee more.", "पिछला घुटना और नीचे करें।"),
    ("Great lunge form. Hold steady.", "बहुत अच्छा। स्थिर रहें।"),
    ("Keep torso upright.", "धड़ सीधा रखें।"),
    // Bicep curl
    ("Curl up more. Bring weight to shoulder.", "और ऊपर उठाएं। कंधे तक लाएं।"),
    ("Lower your arm. Extend fully.", "हाथ नीचे करें। पूरा फैलाएं।"),
    ("Perfect curl. Squeeze at the top.", "बिल्कुल सही। ऊपर दबाएं।"),
    ("Keep elbow stable. Don't swing.", "कोहनी स्थिर रखें। झूलें नहीं।"),
    // Shoulder press
    ("Press arms up higher. Full extension.", "हाथ और ऊपर दबाएं। पूरा फैलाएं।"),
    ("Lower to shoulder level.", "कंधे के स्तर तक नीचे करें।"),
    ("Perfect press. Arms fully extended.", "बिल्कुल सही। हाथ पूरे फैले।"),
    ("Engage your core. Don't arch back.", "पेट कस लें। पीठ मोड़ें नहीं।"),
    // Lateral raise
    ("Raise arms higher. To shoulder level.", "हाथ और ऊपर उठाएं। कंधे तक।"),
    ("Lower slightly. Don't go above shoulders.", "थोड़ा नीचे करें। कंधे से ऊपर नहीं।"),
    ("Perfect height. Arms parallel to floor.", "सही ऊंचाई। हाथ जमीन के समानांतर।"),
    // Knee raise
    ("Lift knee higher. To hip level.", "घुटना और ऊपर उठाएं। कूल्हे तक।"),
    ("Lower your knee slightly.", "घुटना थोड़ा नीचे करें।"),
    ("Perfect knee height. Hold balance.", "सही ऊंचाई। संतुलन बनाएं।"),
    ("Focus on balance. Engage core.", "संतुलन पर ध्यान दें। पेट कसें।"),
    ("Stand tall. Don't lean back.", "सीधे खड़े रहें। पीछे झुकें नहीं।"),
    // Calf raise
    ("Rise higher on your toes.", "पंजों पर और ऊपर उठें।"),
    ("Good height. Hold at the top.", "अच्छी ऊंचाई। ऊपर रुकें।"),
    ("Perfect calf raise. Squeeze at top.", "बिल्कुल सही। ऊपर दबाएं।"),
    // General
    ("Slow and controlled movement.", "धीरे और नियंत्रित गति।"),
    ("Slow down. Control the movement.", "धीरे करें। गति नियंत्रित करें।"),
    ("First rep complete. Keep going.", "पहला पूरा हुआ। जारी रखें।"),
    ("Great work.", "बहुत अच्छा।"),
    ("Keep going.", "जारी रखें।"),
];

/// Translate a cue to Hindi: exact phrasebook match first, then the
/// rep-count announcement pattern; anything unmapped passes through.
fn translate_to_hindi(text: &str) -> String {
    for (english, hindi) in HINDI_PHRASES {
        if *english == text {
            return (*hindi).to_string();
        }
    }

    if let Some(n) = rep_count_phrase(text) {
        return format!("{} बार पूरे हुए। बहुत अच्छा।", n);
    }

    text.to_string()
}

/// Match "`N rep(s) done|completed`" anywhere in the text
fn rep_count_phrase(text: &str) -> Option<u32> {
    let words: Vec<&str> = text.split_whitespace().collect();
    for window in words.windows(3) {
        let Ok(n) = window[0].parse::<u32>() else {
            continue;
        };
        let noun = window[1];
        let verb = window[2].trim_end_matches(['.', '!']);
        if matches!(noun, "rep" | "reps") && matches!(verb, "done" | "completed") {
            return Some(n);
        }
    }
    None
}
