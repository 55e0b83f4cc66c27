use rand::seq::SliceRandom;
use rand::Rng;

use super::state::{GameState, Obstacle, ObstacleSkin};

/// Drop a new obstacle in just above the visible area.
///
/// Overlap with existing obstacles is allowed; they never collide with each other.
pub fn spawn(state: &mut GameState) {
    let config = &state.config;
    let size = config.obstacle_size;
    let max_x = (config.canvas_width - size).max(0.0);
    let (min_speed, max_speed) = (config.obstacle_min_speed, config.obstacle_max_speed);

    let x = if max_x > 0.0 {
        state.rng.gen_range(0.0..max_x)
    } else {
        0.0
    };
    let speed = if max_speed > min_speed {
        state.rng.gen_range(min_speed..max_speed)
    } else {
        min_speed
    };
    let skin = *ObstacleSkin::ALL
        .choose(&mut state.rng)
        .unwrap_or(&ObstacleSkin::First);

    log::debug!(
        "Spawned obstacle at x {:.1} with speed {:.2} (score {})",
        x,
        speed,
        state.score
    );
    state.obstacles.push(Obstacle {
        x,
        y: -size,
        size,
        speed,
        skin,
    });
}
