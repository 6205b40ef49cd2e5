/// Clamp a numeric input to `[0, ∞)`. Non-finite values collapse to zero,
/// except positive infinity which is left alone.
pub fn clamp_non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Format a number rounded to an integer with `,` grouping every three digits.
///
/// # Examples
/// ```
/// assert_eq!(run_score::utils::format_grouped(1234567.4), "1,234,567");
/// ```
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format with a fixed number of fractional digits.
pub fn format_fixed(value: f64, digits: usize) -> String {
    format!("{:.*}", digits, value)
}

/// Parse the speed input. Range is not checked here; the simulator clamps.
pub fn parse_speed_input(input: &str) -> Result<f64, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Speed cannot be empty".to_string());
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| "Speed must be a valid number".to_string())
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_epoch_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_epoch_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Render an epoch timestamp as a local time-of-day string.
#[cfg(target_arch = "wasm32")]
pub fn format_time_of_day(epoch_ms: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(epoch_ms));
    String::from(date.to_locale_time_string(crate::config::LOCALE))
}

/// Native builds have no locale database; fall back to `HH:MM:SS` in UTC.
#[cfg(not(target_arch = "wasm32"))]
pub fn format_time_of_day(epoch_ms: f64) -> String {
    let secs_of_day = (clamp_non_negative(epoch_ms) / 1000.0).floor() as u64 % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        secs_of_day / 3600,
        (secs_of_day % 3600) / 60,
        secs_of_day % 60
    )
}
