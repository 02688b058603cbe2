use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for capture-loop events.
///
/// The loop reports through this trait; where the reports end up (stdout,
/// a GUI, nowhere) is the launcher's choice.
pub trait TrackingLogger: Send {
    /// One frame finished; `target_found` says whether a target was selected.
    fn frame(&mut self, sequence: usize, target_found: bool);

    /// Duration of one loop stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame measurement, e.g. the number of detections.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// A failure the loop reports without returning it. Default: `log::error!`.
    fn error(&mut self, message: &str) {
        log::error!("{message}");
    }

    /// End-of-session report. Default: nothing.
    fn summary(&self) {}
}

pub struct NullTrackingLogger;

impl TrackingLogger for NullTrackingLogger {
    fn frame(&mut self, _sequence: usize, _target_found: bool) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Count, sum and peak of a stream of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.max = if self.count == 0 {
            value
        } else {
            self.max.max(value)
        };
        self.count += 1;
        self.total += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Reports through `log`: a progress line every `progress_every` frames and
/// a summary of stage timings and target hit rate at the end.
pub struct StdoutTrackingLogger {
    progress_every: usize,
    stages: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    started: Instant,
    frames: usize,
    frames_with_target: usize,
}

impl StdoutTrackingLogger {
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames: 0,
            frames_with_target: 0,
        }
    }

    pub fn stage(&self, name: &str) -> Option<RunningStat> {
        self.stages.get(name).copied()
    }

    pub fn metric_stat(&self, name: &str) -> Option<RunningStat> {
        self.metrics.get(name).copied()
    }

    /// `None` until at least one frame has been reported.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let secs = self.started.elapsed().as_secs_f64();
        let hit_rate = self.frames_with_target as f64 / self.frames as f64 * 100.0;
        let mut out = format!(
            "Tracking summary ({} frames in {secs:.1}s):\n  Target found: {}/{} frames ({hit_rate:.1}%)",
            self.frames, self.frames_with_target, self.frames
        );
        for (name, stat) in &self.stages {
            out.push_str(&format!(
                "\n  {name:8}: avg {:6.2}ms  max {:6.2}ms",
                stat.mean(),
                stat.max
            ));
        }
        for (name, stat) in &self.metrics {
            out.push_str(&format!("\n  {name}: avg {:.1}  max {:.0}", stat.mean(), stat.max));
        }
        if secs > 0.0 {
            out.push_str(&format!("\n  Rate: {:.1} fps", self.frames as f64 / secs));
        }
        Some(out)
    }
}

impl Default for StdoutTrackingLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl TrackingLogger for StdoutTrackingLogger {
    fn frame(&mut self, sequence: usize, target_found: bool) {
        self.frames += 1;
        self.frames_with_target += usize::from(target_found);
        if self.frames % self.progress_every == 0 {
            log::info!(
                "Frame {sequence}: target in {}/{} frames",
                self.frames_with_target,
                self.frames
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_owned()).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_owned()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
