//! The run simulator: state, per-frame advancement, scoring and the snapshot log.
//!
//! `RunSimulator` is independent of the browser. Time comes from a
//! [`FrameScheduler`] and output goes to an optional [`RenderSink`], so the
//! whole state machine can be driven by hand in native tests.

use crate::config::{DEFAULT_SNAPSHOT_LABEL, DEFAULT_SPEED_KPH, MAX_LOG_ENTRIES};
use crate::score::{compute_score, ScoreBreakdown, Weights};
use crate::utils::{clamp_non_negative, now_epoch_ms};
use log::{debug, info};
use serde::Serialize;
use std::collections::VecDeque;

/// Identifier of a pending frame request, as returned by the scheduler.
pub type FrameId = i32;

/// Source of frame callbacks and high-resolution time.
pub trait FrameScheduler {
    /// High-resolution monotonic time in milliseconds.
    fn now(&self) -> f64;
    /// Ask for one call to [`RunSimulator::on_frame`] on the next display frame.
    /// Returns `None` if the request could not be made.
    fn request_frame(&mut self) -> Option<FrameId>;
    fn cancel_frame(&mut self, id: FrameId);
}

/// Receives a fresh [`RunView`] after every state change.
pub trait RenderSink {
    fn render(&mut self, view: &RunView);
}

impl<F: FnMut(&RunView)> RenderSink for F {
    fn render(&mut self, view: &RunView) {
        self(view)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub running: bool,
    pub distance_meters: f64,
    pub elapsed_ms: f64,
    pub speed_kph: f64,
}

/// A recorded score snapshot. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub label: String,
    pub total: u64,
    pub distance_km: f64,
    pub time_sec: f64,
    pub speed: f64,
    /// Wall-clock time in milliseconds since the Unix epoch.
    pub created_at: f64,
}

/// Partial state forced in from outside the normal intent flow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExternalState {
    pub distance_meters: Option<f64>,
    pub elapsed_ms: Option<f64>,
    pub speed_kph: Option<f64>,
    pub running: Option<bool>,
}

/// A single field read from a loosely typed override object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExternalField {
    Number(f64),
    Bool(bool),
    /// Present but neither a number nor a boolean.
    Other,
}

impl ExternalState {
    /// Build an override by looking up each known key on its own.
    ///
    /// `field` returns `None` for a missing key. Fields of the wrong type and
    /// non-finite numbers are skipped without affecting the other keys.
    pub fn from_fields(field: impl Fn(&str) -> Option<ExternalField>) -> Self {
        let number = |key: &str| match field(key) {
            Some(ExternalField::Number(v)) if v.is_finite() => Some(v),
            _ => None,
        };
        Self {
            distance_meters: number("distanceMeters"),
            elapsed_ms: number("elapsedMs"),
            speed_kph: number("speedKph"),
            running: match field("running") {
                Some(ExternalField::Bool(b)) => Some(b),
                _ => None,
            },
        }
    }

    /// Override from a JSON value, e.g. a message from an external feed.
    /// Anything that is not an object yields an empty override.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self::from_fields(|key| {
            value.get(key).map(|v| match v {
                serde_json::Value::Number(n) => n
                    .as_f64()
                    .map_or(ExternalField::Other, ExternalField::Number),
                serde_json::Value::Bool(b) => ExternalField::Bool(*b),
                _ => ExternalField::Other,
            })
        })
    }
}

/// Everything the presenter shows, computed from the simulator at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct RunView {
    pub score: ScoreBreakdown,
    pub weights: Weights,
    pub running: bool,
    pub kilometers: f64,
    pub distance_meters: f64,
    pub seconds: f64,
    /// Seconds since the last snapshot, never negative.
    pub delta_seconds: f64,
    pub speed_kph: f64,
    pub speed_meters_per_second: f64,
    /// Newest first.
    pub log: Vec<LogEntry>,
}

pub struct RunSimulator<S: FrameScheduler> {
    state: RunState,
    weights: Weights,
    delta_reference_seconds: f64,
    last_timestamp: f64,
    pending_frame: Option<FrameId>,
    log: VecDeque<LogEntry>,
    scheduler: S,
    sink: Option<Box<dyn RenderSink>>,
}

impl<S: FrameScheduler> RunSimulator<S> {
    /// Create an idle simulator. `initial_speed` is the value read from the
    /// speed input, if any; a missing or zero value falls back to the default.
    pub fn new(weights: Weights, initial_speed: Option<f64>, scheduler: S) -> Self {
        let speed_kph = match initial_speed.filter(|v| v.is_finite() && *v != 0.0) {
            Some(v) => clamp_non_negative(v),
            None => DEFAULT_SPEED_KPH,
        };
        Self {
            state: RunState {
                speed_kph,
                ..RunState::default()
            },
            weights,
            delta_reference_seconds: 0.0,
            last_timestamp: 0.0,
            pending_frame: None,
            log: VecDeque::with_capacity(MAX_LOG_ENTRIES + 1),
            scheduler,
            sink: None,
        }
    }

    /// Attach the display binding and render the current state into it.
    pub fn attach_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.sink = Some(sink);
        self.render();
    }

    pub fn detach_sink(&mut self) {
        self.sink = None;
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Snapshot log, newest first.
    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    pub fn is_frame_pending(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn seconds(&self) -> f64 {
        self.state.elapsed_ms / 1000.0
    }

    pub fn kilometers(&self) -> f64 {
        self.state.distance_meters / 1000.0
    }

    pub fn speed_meters_per_second(&self) -> f64 {
        self.state.speed_kph * 1000.0 / 3600.0
    }

    pub fn compute_score(&self) -> ScoreBreakdown {
        compute_score(self.state.distance_meters, self.state.elapsed_ms, &self.weights)
    }

    pub fn delta_seconds(&self) -> f64 {
        (self.seconds() - self.delta_reference_seconds).max(0.0)
    }

    pub fn start(&mut self) {
        if self.state.running {
            return;
        }
        self.state.running = true;
        self.last_timestamp = self.scheduler.now();
        self.schedule_next_frame();
        debug!("Run started at {:.1} ms", self.last_timestamp);
        self.render();
    }

    pub fn stop(&mut self) {
        if !self.state.running {
            return;
        }
        self.state.running = false;
        self.cancel_pending_frame();
        debug!(
            "Run stopped: {:.1} m in {:.1} s",
            self.state.distance_meters,
            self.seconds()
        );
        self.render();
    }

    pub fn toggle(&mut self) {
        if self.state.running {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn reset(&mut self) {
        let had_progress = self.state.distance_meters > 0.0 || self.state.elapsed_ms > 0.0;
        self.stop();
        // Only cleared when something was recorded; an idle reset keeps the reference.
        if had_progress {
            self.delta_reference_seconds = 0.0;
        }
        self.state.distance_meters = 0.0;
        self.state.elapsed_ms = 0.0;
        self.log.clear();
        info!("Run reset");
        self.render();
    }

    pub fn set_speed(&mut self, kph: f64) {
        self.state.speed_kph = clamp_non_negative(kph);
        self.render();
    }

    /// Administrative override: overwrite any subset of the state directly.
    ///
    /// Intended for test harnesses and external data feeds, not for UI
    /// intents. Numeric fields are clamped to zero; `running` routes through
    /// [`start`](Self::start) / [`stop`](Self::stop).
    pub fn apply_external_state(&mut self, external: ExternalState) {
        debug!("Applying external state {:?}", external);
        if let Some(distance) = external.distance_meters {
            self.state.distance_meters = clamp_non_negative(distance);
        }
        if let Some(elapsed) = external.elapsed_ms {
            self.state.elapsed_ms = clamp_non_negative(elapsed);
        }
        if let Some(speed) = external.speed_kph {
            self.state.speed_kph = clamp_non_negative(speed);
        }
        match external.running {
            Some(true) => self.start(),
            Some(false) => self.stop(),
            None => self.render(),
        }
    }

    /// Record the current score in the log. `None` uses the default label.
    pub fn snapshot(&mut self, label: Option<&str>) -> LogEntry {
        let score = self.compute_score();
        let entry = LogEntry {
            label: label.unwrap_or(DEFAULT_SNAPSHOT_LABEL).to_string(),
            total: score.total,
            distance_km: self.kilometers(),
            time_sec: self.seconds(),
            speed: self.state.speed_kph,
            created_at: now_epoch_ms(),
        };
        self.delta_reference_seconds = self.seconds();
        self.log.push_front(entry.clone());
        self.log.truncate(MAX_LOG_ENTRIES);
        info!("Snapshot '{}': {} points", entry.label, entry.total);
        self.render();
        entry
    }

    /// Frame callback. Advances the run by the time since the previous frame.
    pub fn on_frame(&mut self, timestamp: f64) {
        self.pending_frame = None;
        if !self.state.running {
            return;
        }
        // rAF timestamps can predate the `now()` read taken in `start`;
        // the reference only ever moves forward
        let delta_ms = clamp_non_negative(timestamp - self.last_timestamp);
        self.last_timestamp = self.last_timestamp.max(timestamp);

        self.state.elapsed_ms += delta_ms;
        self.state.distance_meters += self.speed_meters_per_second() * (delta_ms / 1000.0);

        self.render();
        self.schedule_next_frame();
    }

    /// Build the view model for the current state.
    pub fn view(&self) -> RunView {
        RunView {
            score: self.compute_score(),
            weights: self.weights,
            running: self.state.running,
            kilometers: self.kilometers(),
            distance_meters: self.state.distance_meters,
            seconds: self.seconds(),
            delta_seconds: self.delta_seconds(),
            speed_kph: self.state.speed_kph,
            speed_meters_per_second: self.speed_meters_per_second(),
            log: self.log.iter().cloned().collect(),
        }
    }

    fn render(&mut self) {
        if self.sink.is_none() {
            return;
        }
        let view = self.view();
        if let Some(sink) = self.sink.as_mut() {
            sink.render(&view);
        }
    }

    fn schedule_next_frame(&mut self) {
        self.cancel_pending_frame();
        self.pending_frame = self.scheduler.request_frame();
    }

    fn cancel_pending_frame(&mut self) {
        if let Some(id) = self.pending_frame.take() {
            self.scheduler.cancel_frame(id);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{recording_sink, simulator, ManualFrames};
    use super::*;
    use serde_json::json;

    /// Run for `ms` milliseconds in a single frame.
    fn run_for(sim: &mut RunSimulator<ManualFrames>, ms: f64) {
        let ts = sim.scheduler().now + ms;
        sim.scheduler.now = ts;
        sim.on_frame(ts);
    }

    #[test]
    fn new_simulator_is_idle_with_default_speed() {
        let sim = simulator();
        assert_eq!(
            *sim.state(),
            RunState {
                running: false,
                distance_meters: 0.0,
                elapsed_ms: 0.0,
                speed_kph: DEFAULT_SPEED_KPH,
            }
        );
        assert_eq!(sim.log().count(), 0);
        assert!(!sim.is_frame_pending());
    }

    #[test]
    fn initial_speed_comes_from_input_when_present() {
        let sim = RunSimulator::new(Weights::default(), Some(120.0), ManualFrames::default());
        assert_eq!(sim.state().speed_kph, 120.0);

        let sim = RunSimulator::new(Weights::default(), Some(0.0), ManualFrames::default());
        assert_eq!(sim.state().speed_kph, DEFAULT_SPEED_KPH);

        let sim = RunSimulator::new(Weights::default(), Some(f64::NAN), ManualFrames::default());
        assert_eq!(sim.state().speed_kph, DEFAULT_SPEED_KPH);
    }

    #[test]
    fn start_schedules_a_frame_and_renders() {
        let mut sim = simulator();
        let (sink, views) = recording_sink();
        sim.attach_sink(sink);
        sim.start();

        assert!(sim.state().running);
        assert!(sim.is_frame_pending());
        assert_eq!(sim.scheduler().pending.len(), 1);
        let views = views.borrow();
        assert_eq!(views.len(), 2);
        assert!(views[1].running);
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let mut sim = simulator();
        sim.start();
        sim.start();
        assert_eq!(sim.scheduler().next_id, 1);
    }

    #[test]
    fn frames_accrue_time_and_distance() {
        let mut sim = simulator();
        sim.set_speed(36.0); // 10 m/s
        sim.start();
        run_for(&mut sim, 500.0);
        run_for(&mut sim, 1500.0);

        assert!((sim.state().elapsed_ms - 2000.0).abs() < 1e-9);
        assert!((sim.state().distance_meters - 20.0).abs() < 1e-9);
        assert!(sim.is_frame_pending());
    }

    #[test]
    fn start_then_stop_without_time_changes_nothing() {
        let mut sim = simulator();
        sim.scheduler.now = 1234.0;
        sim.start();
        sim.stop();
        assert_eq!(sim.state().distance_meters, 0.0);
        assert_eq!(sim.state().elapsed_ms, 0.0);
        assert!(!sim.state().running);
    }

    #[test]
    fn stop_cancels_pending_frame() {
        let mut sim = simulator();
        sim.start();
        sim.stop();
        assert!(!sim.is_frame_pending());
        assert!(sim.scheduler().pending.is_empty());
        assert_eq!(sim.scheduler().cancelled, vec![1]);

        // second stop has nothing left to cancel
        sim.stop();
        assert_eq!(sim.scheduler().cancelled, vec![1]);
    }

    #[test]
    fn stale_frame_after_stop_is_ignored() {
        let mut sim = simulator();
        sim.start();
        sim.stop();
        sim.on_frame(10_000.0);
        assert_eq!(sim.state().elapsed_ms, 0.0);
        assert_eq!(sim.state().distance_meters, 0.0);
        assert!(!sim.is_frame_pending());
    }

    #[test]
    fn frame_timestamp_before_start_does_not_go_negative() {
        let mut sim = simulator();
        sim.scheduler.now = 1000.0;
        sim.start();
        sim.on_frame(990.0);
        assert_eq!(sim.state().elapsed_ms, 0.0);
        sim.on_frame(1000.0);
        assert_eq!(sim.state().elapsed_ms, 0.0);
        assert_eq!(sim.state().distance_meters, 0.0);
    }

    #[test]
    fn early_first_frame_does_not_count_time_before_start() {
        let mut sim = simulator();
        sim.set_speed(36.0); // 10 m/s
        sim.scheduler.now = 1000.0;
        sim.start();
        sim.on_frame(984.0);
        sim.on_frame(1016.0);
        assert_eq!(sim.state().elapsed_ms, 16.0);
        assert!((sim.state().distance_meters - 0.16).abs() < 1e-9);
    }

    #[test]
    fn toggle_alternates() {
        let mut sim = simulator();
        sim.toggle();
        assert!(sim.state().running);
        sim.toggle();
        assert!(!sim.state().running);
    }

    #[test]
    fn set_speed_clamps_negative_to_zero() {
        let mut sim = simulator();
        sim.set_speed(-10.0);
        assert_eq!(sim.state().speed_kph, 0.0);
        assert!(!sim.state().running);
    }

    #[test]
    fn set_speed_keeps_running_state() {
        let mut sim = simulator();
        sim.start();
        sim.set_speed(100.0);
        assert!(sim.state().running);
        assert_eq!(sim.state().speed_kph, 100.0);
    }

    #[test]
    fn reset_after_progress_clears_everything_and_stops() {
        let mut sim = simulator();
        sim.start();
        run_for(&mut sim, 3000.0);
        sim.snapshot(None);
        sim.reset();

        assert!(!sim.state().running);
        assert_eq!(sim.state().distance_meters, 0.0);
        assert_eq!(sim.state().elapsed_ms, 0.0);
        assert_eq!(sim.log().count(), 0);
        assert_eq!(sim.delta_seconds(), 0.0);
        assert!(!sim.is_frame_pending());
    }

    #[test]
    fn reset_without_progress_keeps_delta_reference() {
        let mut sim = simulator();
        sim.apply_external_state(ExternalState {
            elapsed_ms: Some(5000.0),
            ..Default::default()
        });
        sim.snapshot(None);
        sim.apply_external_state(ExternalState {
            elapsed_ms: Some(0.0),
            ..Default::default()
        });
        sim.reset();
        assert_eq!(sim.delta_reference_seconds, 5.0);

        // progress resumes below the old reference, so delta stays clamped
        sim.apply_external_state(ExternalState {
            elapsed_ms: Some(3000.0),
            ..Default::default()
        });
        assert_eq!(sim.delta_seconds(), 0.0);
    }

    #[test]
    fn snapshot_records_current_values() {
        let mut sim = simulator();
        sim.apply_external_state(ExternalState {
            distance_meters: Some(1000.0),
            elapsed_ms: Some(60_000.0),
            ..Default::default()
        });
        let entry = sim.snapshot(Some("lap"));

        assert_eq!(entry.label, "lap");
        assert_eq!(entry.total, 170);
        assert_eq!(entry.distance_km, 1.0);
        assert_eq!(entry.time_sec, 60.0);
        assert_eq!(entry.speed, DEFAULT_SPEED_KPH);
        assert!(entry.created_at > 0.0);
        assert_eq!(sim.log().next(), Some(&entry));
        assert_eq!(sim.delta_seconds(), 0.0);
    }

    #[test]
    fn snapshot_uses_default_label() {
        let mut sim = simulator();
        assert_eq!(sim.snapshot(None).label, DEFAULT_SNAPSHOT_LABEL);
    }

    #[test]
    fn delta_measures_time_since_last_snapshot() {
        let mut sim = simulator();
        sim.start();
        run_for(&mut sim, 4000.0);
        sim.snapshot(None);
        run_for(&mut sim, 2500.0);
        assert!((sim.delta_seconds() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn log_is_capped_newest_first() {
        let mut sim = simulator();
        for i in 0..MAX_LOG_ENTRIES {
            sim.snapshot(Some(&format!("s{}", i)));
        }
        assert_eq!(sim.log().count(), MAX_LOG_ENTRIES);

        sim.snapshot(Some("s6"));
        let labels: Vec<&str> = sim.log().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["s6", "s5", "s4", "s3", "s2", "s1"]);
    }

    #[test]
    fn external_distance_overwrites_only_distance() {
        let mut sim = simulator();
        sim.apply_external_state(ExternalState::from_value(&json!({ "elapsedMs": 700.0 })));
        sim.apply_external_state(ExternalState::from_value(&json!({ "distanceMeters": 500 })));

        let state = sim.state();
        assert_eq!(state.distance_meters, 500.0);
        assert_eq!(state.elapsed_ms, 700.0);
        assert_eq!(state.speed_kph, DEFAULT_SPEED_KPH);
        assert!(!state.running);
    }

    #[test]
    fn external_running_routes_through_start_and_stop() {
        let mut sim = simulator();
        sim.apply_external_state(ExternalState::from_value(&json!({ "running": true })));
        assert!(sim.state().running);
        assert!(sim.is_frame_pending());

        sim.apply_external_state(ExternalState::from_value(&json!({ "running": false })));
        assert!(!sim.state().running);
        assert!(!sim.is_frame_pending());
    }

    #[test]
    fn external_negatives_are_clamped() {
        let mut sim = simulator();
        sim.apply_external_state(ExternalState::from_value(
            &json!({ "distanceMeters": -5, "elapsedMs": -1, "speedKph": -30 }),
        ));
        assert_eq!(sim.state().distance_meters, 0.0);
        assert_eq!(sim.state().elapsed_ms, 0.0);
        assert_eq!(sim.state().speed_kph, 0.0);
    }

    #[test]
    fn external_fields_of_wrong_type_are_ignored_individually() {
        let external = ExternalState::from_value(&json!({
            "distanceMeters": "far",
            "elapsedMs": 1500,
            "speedKph": null,
            "running": "yes",
            "other": 1
        }));
        assert_eq!(
            external,
            ExternalState {
                elapsed_ms: Some(1500.0),
                ..Default::default()
            }
        );
        assert_eq!(ExternalState::from_value(&json!(42)), ExternalState::default());
    }

    #[test]
    fn unreadable_field_does_not_drop_the_others() {
        // e.g. a JS object carrying a function or symbol next to real values
        let external = ExternalState::from_fields(|key| match key {
            "distanceMeters" => Some(ExternalField::Number(500.0)),
            "elapsedMs" => Some(ExternalField::Number(f64::INFINITY)),
            "speedKph" => Some(ExternalField::Other),
            "running" => Some(ExternalField::Bool(false)),
            _ => None,
        });
        assert_eq!(
            external,
            ExternalState {
                distance_meters: Some(500.0),
                running: Some(false),
                ..Default::default()
            }
        );

        let mut sim = simulator();
        sim.apply_external_state(external);
        assert_eq!(sim.state().distance_meters, 500.0);
        assert_eq!(sim.state().speed_kph, DEFAULT_SPEED_KPH);
    }

    #[test]
    fn state_and_log_entry_serialize_with_js_field_names() {
        let state = RunState {
            running: true,
            distance_meters: 500.0,
            elapsed_ms: 1500.0,
            speed_kph: 80.0,
        };
        assert_eq!(
            serde_json::to_value(state).unwrap(),
            json!({ "running": true, "distanceMeters": 500.0, "elapsedMs": 1500.0, "speedKph": 80.0 })
        );

        let entry = LogEntry {
            label: "lap".into(),
            total: 170,
            distance_km: 1.0,
            time_sec: 60.0,
            speed: 80.0,
            created_at: 0.0,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "label": "lap",
                "total": 170,
                "distanceKm": 1.0,
                "timeSec": 60.0,
                "speed": 80.0,
                "createdAt": 0.0
            })
        );
    }

    #[test]
    fn external_state_without_running_still_renders() {
        let mut sim = simulator();
        let (sink, views) = recording_sink();
        sim.attach_sink(sink);
        sim.apply_external_state(ExternalState::default());
        assert_eq!(views.borrow().len(), 2);
    }

    #[test]
    fn missing_sink_is_a_no_op() {
        let mut sim = simulator();
        sim.start();
        run_for(&mut sim, 100.0);
        sim.snapshot(None);
        sim.reset();
        sim.detach_sink();
        sim.set_speed(10.0);
    }

    #[test]
    fn view_reflects_derived_values() {
        let mut sim = simulator();
        sim.apply_external_state(ExternalState {
            distance_meters: Some(1234.0),
            elapsed_ms: Some(61_500.0),
            speed_kph: Some(72.0),
            running: None,
        });
        let view = sim.view();
        assert_eq!(view.kilometers, 1.234);
        assert_eq!(view.seconds, 61.5);
        assert_eq!(view.speed_meters_per_second, 20.0);
        assert_eq!(view.score.distance_score, 61);
        assert_eq!(view.score.time_score, 123);
        assert_eq!(view.delta_seconds, 61.5);
        assert!(view.log.is_empty());
    }
}
