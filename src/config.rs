//! Application-level configuration constants.

// Scoring defaults: 5 points per 100 m, 2 points per second
pub const DEFAULT_DISTANCE_WEIGHT: f64 = 5.0;
pub const DEFAULT_TIME_WEIGHT: f64 = 2.0;
pub const DEFAULT_DISTANCE_UNIT: f64 = 100.0;

// Default values for input fields
pub const DEFAULT_SPEED_KPH: f64 = 80.0;
pub const MAX_SPEED_KPH: f64 = 300.0;

// Snapshot log
pub const MAX_LOG_ENTRIES: usize = 6;
pub const DEFAULT_SNAPSHOT_LABEL: &str = "수동 스냅샷";

// Display
pub const LOCALE: &str = "ko-KR";
pub const STATUS_RUNNING: &str = "진행 중";
pub const STATUS_IDLE: &str = "대기 중";
pub const TOGGLE_PAUSE: &str = "일시 정지";
pub const TOGGLE_START: &str = "주행 시작";

/// Name under which the host publishes the administrative controller on `window`.
pub const CONTROLLER_GLOBAL: &str = "scoreController";
