//! Deterministic simulation
//!
//! Pure game rules with no browser dependencies:
//! - one owned `GameState` per run
//! - seeded RNG only
//! - one `tick` per fixed frame step

pub mod blessing;
pub mod spawner;
pub mod state;
pub mod tick;

pub use blessing::{Blessing, BlessingEvent, Choice, CATALOG};
pub use state::{ChoicesMade, GameOver, GameState, Obstacle, ObstacleSkin, Player};
pub use tick::{tick, TickInput, TickOutcome};
