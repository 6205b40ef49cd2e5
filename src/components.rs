//! Pure Yew view components for the run tracker.
//!
//! Components take plain values from a [`RunView`](crate::simulator::RunView)
//! as props and forward user intents through callbacks; none of them touch
//! the simulator directly.

use crate::config::{
    MAX_LOG_ENTRIES, MAX_SPEED_KPH, STATUS_IDLE, STATUS_RUNNING, TOGGLE_PAUSE, TOGGLE_START,
};
use crate::score::{ScoreBreakdown, Weights};
use crate::simulator::LogEntry;
use crate::utils::{format_fixed, format_grouped, format_time_of_day};
use yew::prelude::*;

/// "거리 50 + 시간 120"
pub fn score_breakdown_text(score: &ScoreBreakdown) -> String {
    format!(
        "거리 {} + 시간 {}",
        format_grouped(score.distance_score as f64),
        format_grouped(score.time_score as f64)
    )
}

/// "100m 당 " for the configured distance unit.
pub fn distance_unit_caption(weights: &Weights) -> String {
    format!("{}m 당 ", weights.distance_unit)
}

pub fn status_label(running: bool) -> &'static str {
    if running {
        STATUS_RUNNING
    } else {
        STATUS_IDLE
    }
}

pub fn toggle_label(running: bool) -> &'static str {
    if running {
        TOGGLE_PAUSE
    } else {
        TOGGLE_START
    }
}

/// Detail line of a log entry: distance, time and speed.
pub fn log_entry_detail(entry: &LogEntry) -> String {
    format!(
        "거리 {} km · 시간 {} s · 속도 {} km/h",
        format_fixed(entry.distance_km, 2),
        format_fixed(entry.time_sec, 1),
        format_fixed(entry.speed, 0)
    )
}

#[derive(Properties, PartialEq)]
pub struct ScorePanelProps {
    pub score: ScoreBreakdown,
    pub weights: Weights,
}

#[function_component(ScorePanel)]
pub fn score_panel(props: &ScorePanelProps) -> Html {
    html! {
        <section class="score-panel">
            <div class="total-score" data-role="totalScore">
                { format_grouped(props.score.total as f64) }
            </div>
            <div class="score-breakdown" data-role="scoreBreakdown">
                { score_breakdown_text(&props.score) }
            </div>
            <div class="score-weights">
                <span>{ distance_unit_caption(&props.weights) }<span data-role="distanceWeight">{ props.weights.distance_weight }</span>{ "점" }</span>
                <span>{ "1초 당 " }<span data-role="timeWeight">{ props.weights.time_weight }</span>{ "점" }</span>
            </div>
        </section>
    }
}

#[derive(Properties, PartialEq)]
pub struct DistanceCardProps {
    pub kilometers: f64,
    pub meters: f64,
}

#[function_component(DistanceCard)]
pub fn distance_card(props: &DistanceCardProps) -> Html {
    html! {
        <div class="metric-card">
            <span class="metric-title">{ "거리" }</span>
            <span class="metric-value" data-role="distanceValue">{ format_fixed(props.kilometers, 2) }</span>
            <span class="metric-unit">{ "km" }</span>
            <span class="metric-sub">
                <span data-role="distanceMeters">{ format_grouped(props.meters) }</span>{ " m" }
            </span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TimeCardProps {
    pub seconds: f64,
    pub delta_seconds: f64,
}

#[function_component(TimeCard)]
pub fn time_card(props: &TimeCardProps) -> Html {
    html! {
        <div class="metric-card">
            <span class="metric-title">{ "시간" }</span>
            <span class="metric-value" data-role="timeValue">{ format_fixed(props.seconds, 1) }</span>
            <span class="metric-unit">{ "s" }</span>
            <span class="metric-sub" data-role="deltaTime">
                { format!("+{}", format_fixed(props.delta_seconds, 1)) }
            </span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SpeedCardProps {
    pub speed_kph: f64,
    pub speed_meters_per_second: f64,
    pub oninput: Callback<InputEvent>,
}

#[function_component(SpeedCard)]
pub fn speed_card(props: &SpeedCardProps) -> Html {
    let kph = format_fixed(props.speed_kph, 0);
    html! {
        <div class="metric-card">
            <span class="metric-title">{ "속도" }</span>
            <span class="metric-value" data-role="speedValue">{ kph.clone() }</span>
            <span class="metric-unit">{ "km/h" }</span>
            <span class="metric-sub">
                <span data-role="speedMeters">{ format_fixed(props.speed_meters_per_second, 2) }</span>{ " m/s" }
            </span>
            <div class="slider-with-value">
                <input type="range"
                    data-role="speedInput"
                    min="0"
                    max={MAX_SPEED_KPH.to_string()}
                    step="1"
                    value={props.speed_kph.to_string()}
                    oninput={props.oninput.clone()}
                />
                <span class="slider-value" data-role="speedLabel">{ format!("{} km/h", kph) }</span>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct RunStatusProps {
    pub running: bool,
}

#[function_component(RunStatus)]
pub fn run_status(props: &RunStatusProps) -> Html {
    html! {
        <span class={classes!("run-state", props.running.then_some("is-active"))} data-role="runState">
            { status_label(props.running) }
        </span>
    }
}

#[derive(Properties, PartialEq)]
pub struct ControlsProps {
    pub running: bool,
    pub on_toggle: Callback<()>,
    pub on_snapshot: Callback<()>,
    pub on_reset: Callback<()>,
}

#[function_component(Controls)]
pub fn controls(props: &ControlsProps) -> Html {
    html! {
        <div class="controls">
            <button class="btn-primary" data-action="toggle" onclick={props.on_toggle.reform(|_| ())}>
                { toggle_label(props.running) }
            </button>
            <button class="btn-secondary" data-action="snapshot" onclick={props.on_snapshot.reform(|_| ())}>
                { "스냅샷" }
            </button>
            <button class="btn-secondary" data-action="reset" onclick={props.on_reset.reform(|_| ())}>
                { "초기화" }
            </button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LogListProps {
    /// Newest first.
    pub entries: Vec<LogEntry>,
}

#[function_component(LogList)]
pub fn log_list(props: &LogListProps) -> Html {
    html! {
        <ol class="log" data-role="log">
            { props.entries.iter().take(MAX_LOG_ENTRIES).map(render_log_entry).collect::<Html>() }
        </ol>
    }
}

fn render_log_entry(entry: &LogEntry) -> Html {
    html! {
        <li>
            <strong>{ format!("{}점", format_grouped(entry.total as f64)) }</strong>
            <span>{ format!("{} · {}", entry.label, format_time_of_day(entry.created_at)) }</span>
            <span>{ log_entry_detail(entry) }</span>
        </li>
    }
}
