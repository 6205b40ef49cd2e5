//! Browser bindings for the simulator's frame loop.
//!
//! `BrowserFrames` drives [`RunSimulator::on_frame`] from
//! `requestAnimationFrame`. The frame callback only holds a `Weak` reference to
//! the simulator, so dropping the last [`SimulatorHandle`] tears everything down.

use crate::score::Weights;
use crate::simulator::{FrameId, FrameScheduler, RunSimulator, RunView};
use log::{info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Performance, Window};

type FrameCallback = Closure<dyn FnMut(f64)>;

pub struct BrowserFrames {
    window: Window,
    performance: Option<Performance>,
    callback: FrameCallback,
}

impl BrowserFrames {
    fn new(window: Window, callback: FrameCallback) -> Self {
        let performance = window.performance();
        if performance.is_none() {
            warn!("window.performance unavailable, falling back to Date.now()");
        }
        Self {
            window,
            performance,
            callback,
        }
    }
}

impl FrameScheduler for BrowserFrames {
    fn now(&self) -> f64 {
        match &self.performance {
            Some(perf) => perf.now(),
            None => js_sys::Date::now(),
        }
    }

    fn request_frame(&mut self) -> Option<FrameId> {
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("requestAnimationFrame failed: {:?}", e);
                None
            }
        }
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if let Err(e) = self.window.cancel_animation_frame(id) {
            warn!("cancelAnimationFrame({}) failed: {:?}", id, e);
        }
    }
}

pub type BrowserSimulator = RunSimulator<BrowserFrames>;

/// Shared handle to the page's simulator. Equality is identity.
#[derive(Clone)]
pub struct SimulatorHandle(Rc<RefCell<BrowserSimulator>>);

impl PartialEq for SimulatorHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl SimulatorHandle {
    /// Run `f` with exclusive access to the simulator.
    pub fn update<R>(&self, f: impl FnOnce(&mut BrowserSimulator) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn view(&self) -> RunView {
        self.0.borrow().view()
    }
}

/// Build a simulator bound to the window's animation frames.
pub fn spawn_browser_simulator(
    weights: Weights,
    initial_speed: Option<f64>,
) -> Result<SimulatorHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;

    let inner = Rc::new_cyclic(|weak: &Weak<RefCell<BrowserSimulator>>| {
        let weak = weak.clone();
        let callback = Closure::wrap(Box::new(move |timestamp: f64| {
            if let Some(sim) = weak.upgrade() {
                sim.borrow_mut().on_frame(timestamp);
            }
        }) as Box<dyn FnMut(f64)>);
        RefCell::new(RunSimulator::new(
            weights,
            initial_speed,
            BrowserFrames::new(window, callback),
        ))
    });

    info!(
        "Simulator ready: {} pts / {} m, {} pts / s",
        weights.distance_weight, weights.distance_unit, weights.time_weight
    );
    Ok(SimulatorHandle(inner))
}
