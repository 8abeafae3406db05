use std::collections::HashMap;
use std::time::Instant;

/// Per-frame stages, in the order the pipeline runs them.
pub const STAGES: &[&str] = &["orient", "detect", "preprocess", "infer", "render", "restore"];

/// Observer for pipeline orchestration events.
///
/// Keeps use cases free of output concerns; each caller decides where
/// progress, timings and announcements go.
pub trait PipelineLogger: Send {
    /// Report frame-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame or face.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Record something the pipeline said out loud.
    fn announcement(&mut self, text: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events. Used by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn announcement(&mut self, _text: &str) {}
}

/// CLI logger: accumulates stage timings and metrics and prints a
/// throughput report at the end.
///
/// Progress lines are throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    total_frames: usize,
    announcements: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            announcements: 0,
        }
    }

    pub fn announcements(&self) -> usize {
        self.announcements
    }

    /// Formatted report, or `None` if nothing was recorded.
    ///
    /// Known stages are listed in pipeline order, unknown ones after them
    /// alphabetically.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = vec![format!(
            "Pipeline summary ({frames} frames, {} announcements, {:.1}s total):",
            self.announcements,
            elapsed_ms / 1000.0
        )];

        let mut extra: Vec<&str> = self
            .timings
            .keys()
            .map(String::as_str)
            .filter(|s| !STAGES.contains(s))
            .collect();
        extra.sort_unstable();
        for stage in STAGES.iter().copied().chain(extra) {
            let Some(durations) = self.timings.get(stage) else {
                continue;
            };
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            lines.push(format!(
                "  {name}: avg {:.1}, max {:.0}",
                mean(values),
                values.iter().copied().fold(0.0, f64::max)
            ));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    #[cfg(test)]
    pub(crate) fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    #[cfg(test)]
    pub(crate) fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_frames = total;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn announcement(&mut self, text: &str) {
        self.announcements += 1;
        log::debug!("Announcement #{}: {text}", self.announcements);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
