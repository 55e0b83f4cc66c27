//! Run state and the entities it owns
//!
//! Everything that changes during a run lives in [`GameState`], so starting a
//! new run is just building a fresh one.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::blessing::Choice;
use crate::config::GameConfig;
use crate::engine::{Point, Rect, Size};

/// Sand colour the dunes start with
pub const INITIAL_WORLD_COLOR: &str = "#f0e4c2";

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    /// side length of the square hitbox
    pub size: f64,
    pub speed: f64,
}

impl Player {
    pub fn new(config: &GameConfig) -> Self {
        Player {
            x: config.player_start_x,
            y: config.player_start_y,
            size: config.player_size,
            speed: config.player_speed,
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(
            Point {
                x: self.x,
                y: self.y,
            },
            Size::square(self.size),
        )
    }

    /// Keep the whole hitbox on the canvas horizontally
    pub fn clamp_to(&mut self, canvas_width: f64) {
        let max_x = (canvas_width - self.size).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
    }
}

/// Artwork variant an obstacle is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleSkin {
    First,
    Second,
    Third,
}

impl ObstacleSkin {
    pub const ALL: [ObstacleSkin; 3] = [ObstacleSkin::First, ObstacleSkin::Second, ObstacleSkin::Third];

    pub fn image_path(&self) -> &'static str {
        match self {
            ObstacleSkin::First => "obstacle1.png",
            ObstacleSkin::Second => "obstacle2.png",
            ObstacleSkin::Third => "obstacle3.png",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ObstacleSkin::First => 0,
            ObstacleSkin::Second => 1,
            ObstacleSkin::Third => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// base fall speed, scaled by the speed multiplier every tick
    pub speed: f64,
    pub skin: ObstacleSkin,
}

impl Obstacle {
    pub fn bounding_box(&self) -> Rect {
        Rect::new(
            Point {
                x: self.x,
                y: self.y,
            },
            Size::square(self.size),
        )
    }
}

/// Which thresholds already offered a blessing, and what was picked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoicesMade {
    fired: BTreeSet<u32>,
    log: Vec<Choice>,
}

impl ChoicesMade {
    pub fn has_fired(&self, threshold: u32) -> bool {
        self.fired.contains(&threshold)
    }

    pub fn mark_fired(&mut self, threshold: u32) {
        self.fired.insert(threshold);
    }

    pub fn record(&mut self, choice: Choice) {
        self.log.push(choice);
    }

    pub fn fired(&self) -> impl Iterator<Item = u32> + '_ {
        self.fired.iter().copied()
    }

    pub fn log(&self) -> &[Choice] {
        &self.log
    }
}

/// Title and message shown when a run ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOver {
    pub title: String,
    pub message: String,
    pub final_score: u32,
}

impl GameOver {
    pub fn new(final_score: u32) -> Self {
        GameOver {
            title: "Game Over".to_string(),
            message: format!(
                "Final Score: {}\nThe Runner's spark fades into the dunes...",
                final_score
            ),
            final_score,
        }
    }
}

#[derive(Debug)]
pub struct GameState {
    pub config: Rc<GameConfig>,
    pub score: u32,
    pub speed_multiplier: f64,
    pub last_spawn_score: u32,
    pub background_offset: f64,
    pub world_color: &'static str,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub choices: ChoicesMade,
    pub rng: Pcg32,
}

impl GameState {
    pub fn new(config: Rc<GameConfig>, seed: u64) -> Self {
        GameState {
            player: Player::new(&config),
            config,
            score: 0,
            speed_multiplier: 1.0,
            last_spawn_score: 0,
            background_offset: 0.0,
            world_color: INITIAL_WORLD_COLOR,
            obstacles: Vec::new(),
            choices: ChoicesMade::default(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// A fresh state for the next run, seeded from this run's RNG
    pub fn next_run(&mut self) -> GameState {
        let seed = self.rng.gen();
        GameState::new(Rc::clone(&self.config), seed)
    }

    pub fn multiplier_for(&self, score: u32) -> f64 {
        1.0 + f64::from(score) / self.config.multiplier_divisor
    }

    pub fn canvas_size(&self) -> Size {
        Size {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
        }
    }
}
