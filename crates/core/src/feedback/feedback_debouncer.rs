use std::time::{Duration, Instant};

use super::announcement::Announcement;
use crate::emotion::emotion_label::EmotionLabel;

/// Minimum gap between two no-face alerts.
pub const DEFAULT_NO_FACE_COOLDOWN: Duration = Duration::from_secs(10);

/// What was said last and when.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebounceState {
    last_spoken_label: Option<EmotionLabel>,
    last_event: Instant,
}

impl DebounceState {
    pub fn new(now: Instant) -> Self {
        Self {
            last_spoken_label: None,
            last_event: now,
        }
    }

    pub fn last_spoken_label(&self) -> Option<EmotionLabel> {
        self.last_spoken_label
    }

    pub fn last_event(&self) -> Instant {
        self.last_event
    }
}

/// Suppresses repeated or too-frequent announcements.
///
/// The caller supplies the clock and the speech channel's busy flag, so
/// the debouncer itself has no timers and no side effects beyond its state.
#[derive(Clone, Debug)]
pub struct FeedbackDebouncer {
    cooldown: Duration,
    state: DebounceState,
}

impl FeedbackDebouncer {
    pub fn new(cooldown: Duration, now: Instant) -> Self {
        Self {
            cooldown,
            state: DebounceState::new(now),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    /// Decide whether this observation should be spoken.
    ///
    /// With no face, a no-face alert goes out once the cooldown has fully
    /// elapsed since the last announcement. With a labelled face, the label
    /// goes out when it differs from the last one spoken. Nothing is
    /// emitted while the speech channel is busy.
    pub fn evaluate(
        &mut self,
        faces_detected: usize,
        label: Option<EmotionLabel>,
        is_speaking: bool,
        now: Instant,
    ) -> Option<Announcement> {
        if is_speaking {
            return None;
        }

        if faces_detected == 0 {
            if now.saturating_duration_since(self.state.last_event) <= self.cooldown {
                return None;
            }
            self.state.last_event = now;
            self.state.last_spoken_label = Some(EmotionLabel::Undetected);
            return Some(Announcement::NoFaceDetected);
        }

        let label = label?;
        if self.state.last_spoken_label == Some(label) {
            return None;
        }
        self.state.last_event = now;
        self.state.last_spoken_label = Some(label);
        Some(Announcement::Emotion(label))
    }
}
