use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::capture::domain::frame_sink::FrameSink;
use crate::capture::domain::frame_source::FrameSource;
use crate::capture::domain::object_detector::ObjectDetector;
use crate::capture::domain::stop_signal::StopSignal;
use crate::response::domain::actuator::ActuatorError;
use crate::response::domain::tracking_responder::TrackingResponder;
use crate::shared::config::FrameGeometry;
use crate::shared::frame::Frame;
use crate::targeting::box_annotator::annotate;
use crate::targeting::target_selector::{rank_targets, RankedTarget};

use super::tracking_logger::{NullTrackingLogger, TrackingLogger};

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub sequence: usize,
    pub detections: usize,
    pub primary: Option<RankedTarget>,
}

/// Counters for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    pub frames: usize,
    pub frames_with_target: usize,
    pub actuator_faults: usize,
}

/// The capture loop: acquire → detect → select → respond → render.
///
/// Only the primary target's offset reaches the responder; the full ranking
/// is used for annotation when a sink is attached. When the loop ends for
/// any reason the responder is driven to idle once with `no_object()`.
pub struct TrackTargetsUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn ObjectDetector>,
    responder: Box<dyn TrackingResponder>,
    geometry: FrameGeometry,
    sink: Option<Box<dyn FrameSink>>,
    stop: Option<Box<dyn StopSignal>>,
    logger: Box<dyn TrackingLogger>,
    frame_interval: Option<Duration>,
    continue_on_fault: bool,
}

impl TrackTargetsUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn ObjectDetector>,
        responder: Box<dyn TrackingResponder>,
        geometry: FrameGeometry,
        sink: Option<Box<dyn FrameSink>>,
        stop: Option<Box<dyn StopSignal>>,
        logger: Option<Box<dyn TrackingLogger>>,
        target_fps: Option<f64>,
        continue_on_fault: bool,
    ) -> Self {
        let frame_interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / fps));
        Self {
            source,
            detector,
            responder,
            geometry,
            sink,
            stop,
            logger: logger.unwrap_or_else(|| Box::new(NullTrackingLogger)),
            frame_interval,
            continue_on_fault,
        }
    }

    /// Runs until the stop signal fires or the source is exhausted.
    pub fn execute(&mut self) -> Result<TrackingStats, Box<dyn std::error::Error>> {
        self.logger.info(&format!(
            "Tracking with responder '{}' on a {}x{} frame",
            self.responder.name(),
            self.geometry.width,
            self.geometry.height
        ));

        let mut stats = TrackingStats::default();
        let result = self.run_loop(&mut stats);

        // Idle even when the loop failed; the loop's error wins.
        let idle = self.responder.no_object();
        if let (Err(_), Err(e)) = (&result, &idle) {
            self.logger.error(&format!("Failed to idle responders: {e}"));
        }
        self.logger.summary();
        result?;
        idle?;
        Ok(stats)
    }

    fn run_loop(&mut self, stats: &mut TrackingStats) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            if self.stop.as_mut().is_some_and(|stop| stop.should_stop()) {
                self.logger.info("Stop requested");
                return Ok(());
            }

            let started = Instant::now();
            let Some(mut frame) = self.source.next_frame()? else {
                self.logger.info("Frame source exhausted");
                return Ok(());
            };

            let outcome = match self.process_frame(&mut frame) {
                Ok(outcome) => outcome,
                Err(FrameError::Actuator { outcome, source }) if self.continue_on_fault => {
                    self.logger.error(&format!("Frame {}: {source}", outcome.sequence));
                    stats.actuator_faults += 1;
                    outcome
                }
                Err(e) => return Err(e.into()),
            };

            stats.frames += 1;
            if outcome.primary.is_some() {
                stats.frames_with_target += 1;
            }
            self.logger.frame(outcome.sequence, outcome.primary.is_some());

            if let Some(interval) = self.frame_interval {
                let elapsed = started.elapsed();
                if elapsed < interval {
                    thread::sleep(interval - elapsed);
                }
            }
        }
    }

    /// One iteration over an already-acquired frame.
    pub fn process_frame(&mut self, frame: &mut Frame) -> Result<FrameOutcome, FrameError> {
        let t0 = Instant::now();
        let boxes = self.detector.detect(frame).map_err(FrameError::Detector)?;
        self.logger.timing("detect", elapsed_ms(t0));
        self.logger.metric("detections", boxes.len() as f64);

        let t0 = Instant::now();
        let ranked = rank_targets(&boxes, self.geometry);
        let primary = ranked.first().copied();
        self.logger.timing("select", elapsed_ms(t0));

        let t0 = Instant::now();
        let dispatched = match &primary {
            Some(target) => self.responder.found_object(target.offset),
            None => self.responder.no_object(),
        };
        let outcome = FrameOutcome {
            sequence: frame.sequence(),
            detections: boxes.len(),
            primary,
        };
        if let Err(source) = dispatched {
            return Err(FrameError::Actuator { outcome, source });
        }
        self.logger.timing("respond", elapsed_ms(t0));

        if let Some(sink) = self.sink.as_mut() {
            let t0 = Instant::now();
            annotate(frame, &ranked);
            sink.show(frame).map_err(FrameError::Sink)?;
            self.logger.timing("render", elapsed_ms(t0));
        }

        Ok(outcome)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Failure inside a single loop iteration, tagged by stage.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("detector failed: {0}")]
    Detector(Box<dyn std::error::Error>),
    /// The responder failed; `outcome` is what the frame would have reported.
    #[error("{source}")]
    Actuator {
        outcome: FrameOutcome,
        #[source]
        source: ActuatorError,
    },
    #[error("frame sink failed: {0}")]
    Sink(Box<dyn std::error::Error>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::offset::Offset;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const GEOMETRY: FrameGeometry = FrameGeometry {
        width: 320,
        height: 320,
    };

    // --- Stubs ---

    struct StubSource {
        remaining: usize,
        next: usize,
    }

    impl StubSource {
        fn new(frames: usize) -> Self {
            Self {
                remaining: frames,
                next: 0,
            }
        }
    }

    impl FrameSource for StubSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let frame = Frame::blank(GEOMETRY, self.next);
            self.next += 1;
            Ok(Some(frame))
        }
    }

    struct StubDetector {
        per_frame: VecDeque<Vec<BoundingBox>>,
    }

    impl StubDetector {
        fn new(per_frame: Vec<Vec<BoundingBox>>) -> Self {
            Self {
                per_frame: per_frame.into(),
            }
        }
    }

    impl ObjectDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(self.per_frame.pop_front().unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl ObjectDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Err("model not loaded".into())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Found(Offset),
        None,
    }

    struct RecordingResponder {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_found: bool,
        fail_idle: bool,
    }

    impl RecordingResponder {
        fn new(calls: Arc<Mutex<Vec<Call>>>) -> Self {
            Self {
                calls,
                fail_found: false,
                fail_idle: false,
            }
        }
    }

    impl TrackingResponder for RecordingResponder {
        fn name(&self) -> &str {
            "recording"
        }

        fn found_object(&mut self, offset: Offset) -> Result<(), ActuatorError> {
            self.calls.lock().unwrap().push(Call::Found(offset));
            if self.fail_found {
                return Err(ActuatorError::Rejected {
                    target: "servo".into(),
                    reason: "unreachable".into(),
                });
            }
            Ok(())
        }

        fn no_object(&mut self) -> Result<(), ActuatorError> {
            self.calls.lock().unwrap().push(Call::None);
            if self.fail_idle {
                return Err(ActuatorError::Rejected {
                    target: "led".into(),
                    reason: "stuck high".into(),
                });
            }
            Ok(())
        }
    }

    struct RecordingLogger {
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl TrackingLogger for RecordingLogger {
        fn frame(&mut self, _sequence: usize, _target_found: bool) {}
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn metric(&mut self, _name: &str, _value: f64) {}
        fn info(&mut self, _message: &str) {}

        fn error(&mut self, message: &str) {
            self.errors.lock().unwrap().push(message.to_owned());
        }
    }

    struct RecordingSink {
        shown: Arc<Mutex<Vec<Frame>>>,
    }

    impl FrameSink for RecordingSink {
        fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.shown.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    struct StopAfter {
        checks_left: usize,
    }

    impl StopSignal for StopAfter {
        fn should_stop(&mut self) -> bool {
            if self.checks_left == 0 {
                return true;
            }
            self.checks_left -= 1;
            false
        }
    }

    fn bbox(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> BoundingBox {
        BoundingBox::new(x_min, y_min, x_max, y_max).unwrap()
    }

    fn use_case(
        frames: usize,
        detections: Vec<Vec<BoundingBox>>,
        calls: Arc<Mutex<Vec<Call>>>,
    ) -> TrackTargetsUseCase {
        TrackTargetsUseCase::new(
            Box::new(StubSource::new(frames)),
            Box::new(StubDetector::new(detections)),
            Box::new(RecordingResponder::new(calls)),
            GEOMETRY,
            None,
            None,
            None,
            None,
            false,
        )
    }

    // --- Tests ---

    #[test]
    fn test_primary_offset_forwarded_to_responder() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        // Centers at x=110 and x=170; the second is closer to 160.
        let mut uc = use_case(
            1,
            vec![vec![bbox(100, 0, 120, 90), bbox(150, 30, 190, 120)]],
            calls.clone(),
        );

        let stats = uc.execute().unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.frames_with_target, 1);
        let calls = calls.lock().unwrap();
        // found_object for the frame, then the idle no_object on exit.
        assert_eq!(
            *calls,
            vec![Call::Found(Offset { dx: 10.0, dy: -100.0 }), Call::None]
        );
    }

    #[test]
    fn test_empty_detection_set_calls_only_no_object() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut uc = use_case(1, vec![vec![]], calls.clone());

        let mut frame = Frame::blank(GEOMETRY, 0);
        let outcome = uc.process_frame(&mut frame).unwrap();

        assert!(outcome.primary.is_none());
        assert_eq!(outcome.detections, 0);
        assert_eq!(*calls.lock().unwrap(), vec![Call::None]);
    }

    #[test]
    fn test_exhausted_source_ends_with_idle() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut uc = use_case(0, vec![], calls.clone());

        let stats = uc.execute().unwrap();

        assert_eq!(stats, TrackingStats::default());
        assert_eq!(*calls.lock().unwrap(), vec![Call::None]);
    }

    #[test]
    fn test_one_dispatch_per_frame() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut uc = use_case(
            3,
            vec![vec![bbox(150, 0, 170, 30)], vec![], vec![bbox(0, 0, 10, 10)]],
            calls.clone(),
        );

        let stats = uc.execute().unwrap();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.frames_with_target, 2);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert!(matches!(calls[0], Call::Found(_)));
        assert_eq!(calls[1], Call::None);
        assert!(matches!(calls[2], Call::Found(_)));
        assert_eq!(calls[3], Call::None);
    }

    #[test]
    fn test_stop_signal_ends_loop_before_next_frame() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(10)),
            Box::new(StubDetector::new(vec![])),
            Box::new(RecordingResponder::new(calls.clone())),
            GEOMETRY,
            None,
            Some(Box::new(StopAfter { checks_left: 2 })),
            None,
            None,
            false,
        );

        let stats = uc.execute().unwrap();

        assert_eq!(stats.frames, 2);
        // Two frame dispatches plus the idle call.
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_detector_failure_propagates_after_idle() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(2)),
            Box::new(FailingDetector),
            Box::new(RecordingResponder::new(calls.clone())),
            GEOMETRY,
            None,
            None,
            None,
            None,
            false,
        );

        let err = uc.execute().unwrap_err();

        assert!(err.to_string().contains("model not loaded"));
        assert_eq!(*calls.lock().unwrap(), vec![Call::None]);
    }

    #[test]
    fn test_actuator_fault_aborts_by_default() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut responder = RecordingResponder::new(calls.clone());
        responder.fail_found = true;
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(3)),
            Box::new(StubDetector::new(vec![vec![bbox(0, 0, 10, 10)]; 3])),
            Box::new(responder),
            GEOMETRY,
            None,
            None,
            None,
            None,
            false,
        );

        let err = uc.execute().unwrap_err();

        assert!(err.to_string().contains("unreachable"));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_actuator_fault_counted_when_continuing() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut responder = RecordingResponder::new(calls.clone());
        responder.fail_found = true;
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(3)),
            Box::new(StubDetector::new(vec![vec![bbox(0, 0, 10, 10)]; 3])),
            Box::new(responder),
            GEOMETRY,
            None,
            None,
            None,
            None,
            true,
        );

        let stats = uc.execute().unwrap();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.actuator_faults, 3);
        assert_eq!(stats.frames_with_target, 3);
        assert_eq!(calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_actuator_fault_keeps_frame_outcome() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut responder = RecordingResponder::new(calls);
        responder.fail_found = true;
        let target = bbox(150, 0, 170, 30);
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(0)),
            Box::new(StubDetector::new(vec![vec![target, bbox(0, 0, 10, 10)]])),
            Box::new(responder),
            GEOMETRY,
            None,
            None,
            None,
            None,
            false,
        );

        let mut frame = Frame::blank(GEOMETRY, 7);
        match uc.process_frame(&mut frame) {
            Err(FrameError::Actuator { outcome, source }) => {
                assert_eq!(outcome.sequence, 7);
                assert_eq!(outcome.detections, 2);
                assert_eq!(outcome.primary.map(|p| p.bounding_box), Some(target));
                assert!(source.to_string().contains("unreachable"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_faults_reported_to_logger_when_continuing() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut responder = RecordingResponder::new(calls);
        responder.fail_found = true;
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(2)),
            Box::new(StubDetector::new(vec![vec![bbox(0, 0, 10, 10)]; 2])),
            Box::new(responder),
            GEOMETRY,
            None,
            None,
            Some(Box::new(RecordingLogger {
                errors: errors.clone(),
            })),
            None,
            true,
        );

        uc.execute().unwrap();

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Frame 0: "));
        assert!(errors[1].starts_with("Frame 1: "));
    }

    #[test]
    fn test_idle_failure_after_loop_failure_is_reported() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut responder = RecordingResponder::new(calls.clone());
        responder.fail_idle = true;
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(2)),
            Box::new(FailingDetector),
            Box::new(responder),
            GEOMETRY,
            None,
            None,
            Some(Box::new(RecordingLogger {
                errors: errors.clone(),
            })),
            None,
            false,
        );

        let err = uc.execute().unwrap_err();

        assert!(err.to_string().contains("model not loaded"));
        assert_eq!(*calls.lock().unwrap(), vec![Call::None]);
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to idle responders"));
        assert!(errors[0].contains("stuck high"));
    }

    #[test]
    fn test_idle_failure_alone_is_returned() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut responder = RecordingResponder::new(calls);
        responder.fail_idle = true;
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(0)),
            Box::new(StubDetector::new(vec![])),
            Box::new(responder),
            GEOMETRY,
            None,
            None,
            Some(Box::new(RecordingLogger {
                errors: errors.clone(),
            })),
            None,
            false,
        );

        let err = uc.execute().unwrap_err();

        assert!(err.to_string().contains("stuck high"));
        assert!(errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sink_receives_annotated_frames() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let shown = Arc::new(Mutex::new(Vec::new()));
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(1)),
            Box::new(StubDetector::new(vec![vec![bbox(10, 10, 50, 50)]])),
            Box::new(RecordingResponder::new(calls)),
            GEOMETRY,
            Some(Box::new(RecordingSink {
                shown: shown.clone(),
            })),
            None,
            None,
            None,
            false,
        );

        uc.execute().unwrap();

        let shown = shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        let pixels = shown[0].as_ndarray();
        assert_eq!(pixels[[10, 10, 1]], 255);
        assert_eq!(pixels[[30, 30, 1]], 0);
    }

    #[test]
    fn test_frame_pacing_slows_loop() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(3)),
            Box::new(StubDetector::new(vec![])),
            Box::new(RecordingResponder::new(calls)),
            GEOMETRY,
            None,
            None,
            None,
            Some(100.0),
            false,
        );

        let started = Instant::now();
        uc.execute().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_invalid_fps_disables_pacing() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let uc = TrackTargetsUseCase::new(
            Box::new(StubSource::new(0)),
            Box::new(StubDetector::new(vec![])),
            Box::new(RecordingResponder::new(calls)),
            GEOMETRY,
            None,
            None,
            None,
            Some(0.0),
            false,
        );
        assert!(uc.frame_interval.is_none());
    }
}
