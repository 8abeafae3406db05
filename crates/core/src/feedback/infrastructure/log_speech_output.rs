use std::time::{Duration, Instant};

use crate::feedback::domain::speech_output::SpeechOutput;

/// Estimated speaking time per word.
pub const MS_PER_WORD: u64 = 400;

/// Speech channel that logs utterances instead of synthesizing them.
///
/// It reports itself busy for an estimated utterance duration, so runs
/// over recorded frames see the same back-pressure a real voice would
/// apply.
#[derive(Debug, Default)]
pub struct LogSpeechOutput {
    busy_until: Option<Instant>,
    history: Vec<String>,
}

impl LogSpeechOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything spoken so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn utterance_duration(text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        Duration::from_millis(words * MS_PER_WORD)
    }
}

impl SpeechOutput for LogSpeechOutput {
    fn is_speaking(&self, now: Instant) -> bool {
        self.busy_until.map_or(false, |until| now < until)
    }

    fn speak(&mut self, text: &str, now: Instant) {
        log::info!("Speaking: {text}");
        self.busy_until = Some(now + Self::utterance_duration(text));
        self.history.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_before_first_utterance() {
        let speech = LogSpeechOutput::new();
        assert!(!speech.is_speaking(Instant::now()));
        assert!(speech.history().is_empty());
    }

    #[test]
    fn test_busy_for_estimated_duration() {
        let t0 = Instant::now();
        let mut speech = LogSpeechOutput::new();
        speech.speak("Back camera is open!", t0);

        assert!(speech.is_speaking(t0));
        assert!(speech.is_speaking(t0 + Duration::from_millis(1599)));
        assert!(!speech.is_speaking(t0 + Duration::from_millis(1600)));
        assert_eq!(speech.history(), &["Back camera is open!".to_string()]);
    }

    #[test]
    fn test_single_word_duration() {
        assert_eq!(
            LogSpeechOutput::utterance_duration("Happy"),
            Duration::from_millis(MS_PER_WORD)
        );
        assert_eq!(
            LogSpeechOutput::utterance_duration(""),
            Duration::from_millis(MS_PER_WORD)
        );
    }
}
