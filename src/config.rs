use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Tunables for a run. Every field has a default so a partial `config.json`
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,

    pub player_start_x: f64,
    pub player_start_y: f64,
    pub player_size: f64,
    pub player_speed: f64,

    pub obstacle_size: f64,
    /// Fall speed is drawn uniformly from `[obstacle_min_speed, obstacle_max_speed)`
    pub obstacle_min_speed: f64,
    pub obstacle_max_speed: f64,
    /// Score ticks that must pass (strictly more than) between spawns
    pub spawn_interval: u32,
    /// Obstacles are dropped once `y >= canvas_height + despawn_margin`
    pub despawn_margin: f64,

    /// speed multiplier = 1 + score / multiplier_divisor
    pub multiplier_divisor: f64,
    pub background_scroll: f64,
    pub background_wrap: f64,

    /// Ascending score values, each of which offers one blessing per run
    pub blessing_thresholds: Vec<u32>,

    /// Fixed RNG seed; a random one is used when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            canvas_width: 800.0,
            canvas_height: 500.0,
            player_start_x: 380.0,
            player_start_y: 420.0,
            player_size: 40.0,
            player_speed: 6.0,
            obstacle_size: 40.0,
            obstacle_min_speed: 3.0,
            obstacle_max_speed: 5.0,
            spawn_interval: 30,
            despawn_margin: 40.0,
            multiplier_divisor: 2000.0,
            background_scroll: 2.0,
            background_wrap: 60.0,
            blessing_thresholds: vec![500, 1500, 3000, 5000, 8000],
            seed: None,
        }
    }
}

impl GameConfig {
    /// Check a loaded config before a run uses it. Thresholds come back sorted
    /// ascending with duplicates removed.
    pub fn validated(mut self) -> Result<Self> {
        for (name, value) in [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("player_size", self.player_size),
            ("obstacle_size", self.obstacle_size),
            ("multiplier_divisor", self.multiplier_divisor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{} must be a positive number, got {}", name, value);
            }
        }
        if self.canvas_width > f64::from(u32::MAX) || self.canvas_height > f64::from(u32::MAX) {
            bail!(
                "canvas {}x{} does not fit a canvas element",
                self.canvas_width,
                self.canvas_height
            );
        }
        // spawn x is drawn from [0, canvas_width - obstacle_size)
        if self.obstacle_size >= self.canvas_width {
            bail!(
                "obstacle_size {} leaves no room on a {} wide canvas",
                self.obstacle_size,
                self.canvas_width
            );
        }
        if !(self.obstacle_min_speed < self.obstacle_max_speed) {
            bail!(
                "obstacle speed range [{}, {}) is empty",
                self.obstacle_min_speed,
                self.obstacle_max_speed
            );
        }

        self.blessing_thresholds.sort_unstable();
        self.blessing_thresholds.dedup();
        Ok(self)
    }

    /// Canvas element size in whole pixels
    pub fn canvas_pixels(&self) -> (u32, u32) {
        (
            self.canvas_width.round() as u32,
            self.canvas_height.round() as u32,
        )
    }
}
