//! Simulated run tracker: accrues distance and time while running, scores
//! them with configurable weights and renders the result in the browser.

use log::warn;
use wasm_bindgen::prelude::*;

pub mod components;
pub mod config;
pub mod frame;
pub mod hooks;
pub mod racing;
pub mod score;
pub mod simulator;
pub mod utils;

pub use frame::{spawn_browser_simulator, SimulatorHandle};
pub use score::{compute_score, ScoreBreakdown, Weights};
pub use simulator::{ExternalField, ExternalState, LogEntry, RunSimulator, RunState, RunView};

/// Read one key of a JS override object. Missing keys, non-objects and
/// throwing getters all read as absent.
fn js_field(state: &JsValue, key: &str) -> Option<ExternalField> {
    if !state.is_object() {
        return None;
    }
    let value = match js_sys::Reflect::get(state, &JsValue::from_str(key)) {
        Ok(value) => value,
        Err(e) => {
            warn!("Skipping external field {}: {:?}", key, e);
            return None;
        }
    };
    if value.is_undefined() {
        return None;
    }
    Some(match (value.as_f64(), value.as_bool()) {
        (Some(n), _) => ExternalField::Number(n),
        (None, Some(b)) => ExternalField::Bool(b),
        _ => ExternalField::Other,
    })
}

/// Administrative entry point for callers outside the UI, such as test
/// harnesses or external data feeds.
///
/// Built by the host around its simulator; nothing here creates or finds a
/// simulator on its own.
#[wasm_bindgen]
pub struct ScoreController {
    simulator: SimulatorHandle,
}

impl ScoreController {
    pub fn new(simulator: SimulatorHandle) -> Self {
        Self { simulator }
    }
}

#[wasm_bindgen]
impl ScoreController {
    /// Force any subset of `{distanceMeters, elapsedMs, speedKph, running}`.
    /// Each key is read on its own; fields with the wrong type are skipped.
    #[wasm_bindgen(js_name = applyExternalState)]
    pub fn apply_external_state(&self, state: JsValue) {
        let external = ExternalState::from_fields(|key| js_field(&state, key));
        self.simulator.update(|sim| sim.apply_external_state(external));
    }

    /// Same as `applyExternalState`, for feeds that deliver JSON text.
    #[wasm_bindgen(js_name = applyExternalStateJson)]
    pub fn apply_external_state_json(&self, json: &str) {
        let value = serde_json::from_str(json).unwrap_or_else(|e| {
            warn!("Ignoring unreadable external state: {}", e);
            serde_json::Value::Null
        });
        let external = ExternalState::from_value(&value);
        self.simulator.update(|sim| sim.apply_external_state(external));
    }

    /// Take a snapshot and return the new log entry as a plain JS object.
    pub fn snapshot(&self, label: Option<String>) -> JsValue {
        let entry = self.simulator.update(|sim| sim.snapshot(label.as_deref()));
        serde_wasm_bindgen::to_value(&entry).unwrap_or(JsValue::NULL)
    }

    pub fn start(&self) {
        self.simulator.update(|sim| sim.start());
    }

    pub fn stop(&self) {
        self.simulator.update(|sim| sim.stop());
    }

    pub fn toggle(&self) {
        self.simulator.update(|sim| sim.toggle());
    }

    pub fn reset(&self) {
        self.simulator.update(|sim| sim.reset());
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&self, kph: f64) {
        self.simulator.update(|sim| sim.set_speed(kph));
    }

    /// Current raw state as `{running, distanceMeters, elapsedMs, speedKph}`.
    pub fn state(&self) -> JsValue {
        let state = self.simulator.update(|sim| *sim.state());
        serde_wasm_bindgen::to_value(&state).unwrap_or(JsValue::NULL)
    }
}
