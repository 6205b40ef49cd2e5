//! Lane-switching and collision rules for the racing mini-game.
//!
//! The player sits at a fixed `y` and opponents travel toward it. Positions
//! are vehicle centers along the track; lanes are indexed from the left.

use log::debug;
use std::fmt;

pub const DEFAULT_VEHICLE_LENGTH: f64 = 4.2;
pub const DEFAULT_LANE_CHANGE_COOLDOWN: f64 = 0.15;
pub const DEFAULT_DESPAWN_MARGIN: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaneChange {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub lane_index: usize,
    pub y: f64,
    pub length: f64,
}

impl Vehicle {
    pub fn new(lane_index: usize, y: f64) -> Self {
        Self {
            lane_index,
            y,
            length: DEFAULT_VEHICLE_LENGTH,
        }
    }

    pub fn half_length(&self) -> f64 {
        self.length * 0.5
    }
}

/// A player/opponent overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub lane_index: usize,
    pub overlap: f64,
    pub opponent_center: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RacingError {
    NoLanes,
    PlayerOutsideLanes { lane_index: usize, lane_count: usize },
    LaneOutOfRange { lane_index: usize, lane_count: usize },
    SpawnNotAhead { distance_ahead: f64, player_y: f64 },
    NegativeDeltaTime(f64),
    NegativeSpeed(f64),
}

impl fmt::Display for RacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RacingError::NoLanes => write!(f, "lane_count must be positive"),
            RacingError::PlayerOutsideLanes {
                lane_index,
                lane_count,
            } => write!(
                f,
                "player lane {} is outside the available lanes (0..{})",
                lane_index, lane_count
            ),
            RacingError::LaneOutOfRange {
                lane_index,
                lane_count,
            } => write!(
                f,
                "lane {} must fall within the configured lanes (0..{})",
                lane_index, lane_count
            ),
            RacingError::SpawnNotAhead {
                distance_ahead,
                player_y,
            } => write!(
                f,
                "distance_ahead {} must be greater than the player's position {}",
                distance_ahead, player_y
            ),
            RacingError::NegativeDeltaTime(dt) => {
                write!(f, "delta_time must be non-negative, got {}", dt)
            }
            RacingError::NegativeSpeed(speed) => {
                write!(f, "opponent_speed must be non-negative, got {}", speed)
            }
        }
    }
}

impl std::error::Error for RacingError {}

#[derive(Debug, Clone)]
pub struct RacingGame {
    lane_count: usize,
    pub lane_change_cooldown: f64,
    pub despawn_margin: f64,
    player: Vehicle,
    opponents: Vec<Vehicle>,
    lane_timer: f64,
}

impl RacingGame {
    pub fn new(lane_count: usize, player: Vehicle) -> Result<Self, RacingError> {
        if lane_count < 1 {
            return Err(RacingError::NoLanes);
        }
        if player.lane_index >= lane_count {
            return Err(RacingError::PlayerOutsideLanes {
                lane_index: player.lane_index,
                lane_count,
            });
        }
        Ok(Self {
            lane_count,
            lane_change_cooldown: DEFAULT_LANE_CHANGE_COOLDOWN,
            despawn_margin: DEFAULT_DESPAWN_MARGIN,
            player,
            opponents: Vec::new(),
            lane_timer: 0.0,
        })
    }

    pub fn with_despawn_margin(mut self, margin: f64) -> Self {
        self.despawn_margin = margin;
        self
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn player(&self) -> &Vehicle {
        &self.player
    }

    pub fn opponents(&self) -> &[Vehicle] {
        &self.opponents
    }

    /// Place an opponent ahead of the player. Returns its index in [`opponents`](Self::opponents).
    pub fn spawn_opponent(
        &mut self,
        lane_index: usize,
        distance_ahead: f64,
        length: f64,
    ) -> Result<usize, RacingError> {
        if lane_index >= self.lane_count {
            return Err(RacingError::LaneOutOfRange {
                lane_index,
                lane_count: self.lane_count,
            });
        }
        if distance_ahead <= self.player.y {
            return Err(RacingError::SpawnNotAhead {
                distance_ahead,
                player_y: self.player.y,
            });
        }
        self.opponents.push(Vehicle {
            lane_index,
            y: distance_ahead,
            length,
        });
        Ok(self.opponents.len() - 1)
    }

    /// Whether `command` would move the player right now.
    pub fn can_change_lane(&self, command: LaneChange) -> bool {
        if self.lane_timer > 0.0 {
            return false;
        }
        match command {
            LaneChange::None => false,
            LaneChange::Left => self.player.lane_index > 0,
            LaneChange::Right => self.player.lane_index + 1 < self.lane_count,
        }
    }

    /// Advance by `delta_time` seconds and report the first collision, if any.
    pub fn advance(
        &mut self,
        delta_time: f64,
        opponent_speed: f64,
        command: LaneChange,
    ) -> Result<Option<CollisionEvent>, RacingError> {
        if delta_time < 0.0 {
            return Err(RacingError::NegativeDeltaTime(delta_time));
        }
        if opponent_speed < 0.0 {
            return Err(RacingError::NegativeSpeed(opponent_speed));
        }

        self.tick_cooldown(delta_time);
        self.apply_lane_change(command);
        self.advance_opponents(delta_time, opponent_speed);
        let collision = self.detect_collision();
        self.cull_passed_opponents();
        Ok(collision)
    }

    pub fn detect_collision(&self) -> Option<CollisionEvent> {
        let player_center = self.player.y;
        let player_half = self.player.half_length();
        self.opponents
            .iter()
            .filter(|o| o.lane_index == self.player.lane_index)
            .find_map(|o| {
                let overlap = player_half + o.half_length() - (player_center - o.y).abs();
                (overlap > 0.0).then_some(CollisionEvent {
                    lane_index: self.player.lane_index,
                    overlap,
                    opponent_center: o.y,
                })
            })
    }

    fn tick_cooldown(&mut self, delta_time: f64) {
        if self.lane_timer > 0.0 {
            self.lane_timer = (self.lane_timer - delta_time).max(0.0);
        }
    }

    fn apply_lane_change(&mut self, command: LaneChange) {
        if !self.can_change_lane(command) {
            return;
        }
        match command {
            LaneChange::Left => self.player.lane_index -= 1,
            LaneChange::Right => self.player.lane_index += 1,
            LaneChange::None => return,
        }
        debug!("Player moved to lane {}", self.player.lane_index);
        self.lane_timer = self.lane_change_cooldown;
    }

    fn advance_opponents(&mut self, delta_time: f64, opponent_speed: f64) {
        let distance = opponent_speed * delta_time;
        if distance == 0.0 {
            return;
        }
        for opponent in &mut self.opponents {
            opponent.y -= distance;
        }
    }

    fn cull_passed_opponents(&mut self) {
        let cutoff = self.player.y - self.despawn_margin;
        self.opponents.retain(|o| o.y + o.half_length() >= cutoff);
    }
}
