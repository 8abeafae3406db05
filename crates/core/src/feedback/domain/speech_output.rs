use std::time::Instant;

/// Voice channel the pipeline announces through.
///
/// `now` is the same frame clock the debouncer sees. Real synthesizers are
/// free to ignore it; simulated ones use it to model utterance length.
pub trait SpeechOutput: Send {
    fn is_speaking(&self, now: Instant) -> bool;
    fn speak(&mut self, text: &str, now: Instant);
}
