//! Host for the run tracker: builds the simulator, exposes the administrative
//! controller and mounts the Yew view.

use log::{debug, error};
use run_score::{
    components::{Controls, DistanceCard, LogList, RunStatus, ScorePanel, SpeedCard, TimeCard},
    config::CONTROLLER_GLOBAL,
    hooks::use_run_view,
    spawn_browser_simulator,
    utils::parse_speed_input,
    ScoreController, SimulatorHandle, Weights,
};
use wasm_bindgen::JsValue;
use web_sys::HtmlInputElement;
use yew::prelude::*;

fn setup_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let _ = console_log::init_with_level(log::Level::Debug);
    }
}

/// Initial speed from `<body data-initial-speed="..">`, if the page sets one.
fn read_initial_speed() -> Option<f64> {
    let raw = gloo_utils::body().get_attribute("data-initial-speed")?;
    match parse_speed_input(&raw) {
        Ok(kph) => Some(kph),
        Err(e) => {
            debug!("Ignoring data-initial-speed: {}", e);
            None
        }
    }
}

/// Publish the controller on `window` for non-UI callers.
fn publish_controller(simulator: &SimulatorHandle) -> Result<(), JsValue> {
    let controller = JsValue::from(ScoreController::new(simulator.clone()));
    js_sys::Reflect::set(
        &gloo_utils::window(),
        &JsValue::from_str(CONTROLLER_GLOBAL),
        &controller,
    )?;
    Ok(())
}

#[derive(Properties, PartialEq)]
pub struct AppProps {
    pub simulator: SimulatorHandle,
}

/// Binds the simulator's view to the page and forwards user intents.
#[function_component]
pub fn App(props: &AppProps) -> Html {
    let view = use_run_view(&props.simulator);

    let on_toggle = {
        let simulator = props.simulator.clone();
        Callback::from(move |_: ()| simulator.update(|sim| sim.toggle()))
    };
    let on_reset = {
        let simulator = props.simulator.clone();
        Callback::from(move |_: ()| simulator.update(|sim| sim.reset()))
    };
    let on_snapshot = {
        let simulator = props.simulator.clone();
        Callback::from(move |_: ()| {
            simulator.update(|sim| {
                sim.snapshot(None);
            })
        })
    };
    let on_speed_input = {
        let simulator = props.simulator.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            match parse_speed_input(&input.value()) {
                Ok(kph) => simulator.update(|sim| sim.set_speed(kph)),
                Err(err) => debug!("Ignoring speed input: {}", err),
            }
        })
    };

    html! {
        <main class="container">
            <header class="run-header">
                <h1>{ "러닝 스코어" }</h1>
                <RunStatus running={view.running} />
            </header>

            <ScorePanel score={view.score} weights={view.weights} />

            <section class="metrics">
                <DistanceCard kilometers={view.kilometers} meters={view.distance_meters} />
                <TimeCard seconds={view.seconds} delta_seconds={view.delta_seconds} />
                <SpeedCard
                    speed_kph={view.speed_kph}
                    speed_meters_per_second={view.speed_meters_per_second}
                    oninput={on_speed_input}
                />
            </section>

            <Controls running={view.running} {on_toggle} {on_snapshot} {on_reset} />

            <section class="log-section">
                <h2>{ "스냅샷 기록" }</h2>
                <LogList entries={view.log.clone()} />
            </section>
        </main>
    }
}

/// Entry point: builds the simulator and hands it to the Yew renderer.
fn main() {
    setup_logging();

    let simulator = match spawn_browser_simulator(Weights::default(), read_initial_speed()) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!("Failed to start the run simulator: {:?}", e);
            return;
        }
    };
    if let Err(e) = publish_controller(&simulator) {
        error!("Failed to publish window.{}: {:?}", CONTROLLER_GLOBAL, e);
    }

    yew::Renderer::<App>::with_props(AppProps { simulator }).render();
}
