//! One simulation step
//!
//! Order within a tick: score, player movement, spawning, obstacle fall,
//! collision, despawn, blessing thresholds, background scroll.

use super::spawner;
use super::state::{GameOver, GameState};

/// Movement intents sampled for a single tick.
///
/// The two flags are independent; holding both cancels out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
}

/// What the controller has to react to after a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// A threshold fired and was marked; a blessing should be offered
    Blessing { threshold: u32 },
    Collided(GameOver),
}

/// Advance the run by exactly one tick
pub fn tick(state: &mut GameState, input: &TickInput) -> TickOutcome {
    state.score += 1;
    state.speed_multiplier = state.multiplier_for(state.score);

    let player = &mut state.player;
    if input.left {
        player.x -= player.speed;
    }
    if input.right {
        player.x += player.speed;
    }
    player.clamp_to(state.config.canvas_width);

    if state.score.saturating_sub(state.last_spawn_score) > state.config.spawn_interval {
        spawner::spawn(state);
        state.last_spawn_score = state.score;
    }

    let multiplier = state.speed_multiplier;
    for obstacle in state.obstacles.iter_mut() {
        obstacle.y += obstacle.speed * multiplier;
    }

    let player_box = state.player.bounding_box();
    if state
        .obstacles
        .iter()
        .any(|obstacle| obstacle.bounding_box().intersects(&player_box))
    {
        log::info!("Collision at score {}", state.score);
        return TickOutcome::Collided(GameOver::new(state.score));
    }

    let despawn_at = state.config.canvas_height + state.config.despawn_margin;
    state.obstacles.retain(|obstacle| obstacle.y < despawn_at);

    let outcome = match next_threshold(state) {
        Some(threshold) => {
            state.choices.mark_fired(threshold);
            TickOutcome::Blessing { threshold }
        }
        None => TickOutcome::Continue,
    };

    state.background_offset += state.config.background_scroll * multiplier;
    if state.background_offset >= state.config.background_wrap {
        state.background_offset = 0.0;
    }

    outcome
}

/// Lowest threshold the score has reached that has not offered a blessing yet
fn next_threshold(state: &GameState) -> Option<u32> {
    state
        .config
        .blessing_thresholds
        .iter()
        .copied()
        .filter(|&threshold| state.score >= threshold && !state.choices.has_fired(threshold))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::state::{Obstacle, ObstacleSkin};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::rc::Rc;

    fn state() -> GameState {
        GameState::new(Rc::new(GameConfig::default()), 12345)
    }

    fn obstacle_at(x: f64, y: f64, speed: f64) -> Obstacle {
        Obstacle {
            x,
            y,
            size: 40.0,
            speed,
            skin: ObstacleSkin::First,
        }
    }

    /// Drop every obstacle so longer runs cannot end in a collision
    fn clear_obstacles(state: &mut GameState) {
        state.obstacles.clear();
    }

    #[test]
    fn score_increments_once_per_tick() {
        let mut state = state();
        for n in 1..=100u32 {
            tick(&mut state, &TickInput::default());
            clear_obstacles(&mut state);
            assert_eq!(state.score, n);
        }
    }

    #[test]
    fn multiplier_follows_score() {
        let mut state = state();
        state.score = 999;
        tick(&mut state, &TickInput::default());
        assert_relative_eq!(state.speed_multiplier, 1.5);
    }

    #[test]
    fn movement_left_right_and_both() {
        let mut state = state();
        tick(&mut state, &TickInput { left: true, right: false });
        assert_eq!(state.player.x, 374.0);

        tick(&mut state, &TickInput { left: false, right: true });
        assert_eq!(state.player.x, 380.0);

        tick(&mut state, &TickInput { left: true, right: true });
        assert_eq!(state.player.x, 380.0);
    }

    #[test]
    fn movement_is_clamped_at_edges() {
        let mut state = state();
        state.player.x = 2.0;
        tick(&mut state, &TickInput { left: true, right: false });
        assert_eq!(state.player.x, 0.0);

        state.player.x = 758.0;
        tick(&mut state, &TickInput { left: false, right: true });
        assert_eq!(state.player.x, 760.0);
    }

    #[test]
    fn spawns_one_obstacle_when_score_passes_interval() {
        let mut state = state();
        for _ in 0..30 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.score, 30);
        assert!(state.obstacles.is_empty());

        tick(&mut state, &TickInput::default());
        assert_eq!(state.score, 31);
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.last_spawn_score, 31);
    }

    #[test]
    fn spawned_obstacle_falls_on_its_first_tick() {
        let mut state = state();
        state.score = 30;
        tick(&mut state, &TickInput::default());
        let obstacle = &state.obstacles[0];
        let expected = -40.0 + obstacle.speed * state.speed_multiplier;
        assert_relative_eq!(obstacle.y, expected);
    }

    #[test]
    fn obstacles_fall_scaled_by_multiplier() {
        let mut state = state();
        state.score = 1999;
        state.obstacles.push(obstacle_at(0.0, 0.0, 4.0));
        state.last_spawn_score = state.score;
        tick(&mut state, &TickInput::default());
        assert_relative_eq!(state.obstacles[0].y, 8.0);
    }

    #[test]
    fn collision_ends_run_with_score() {
        let mut state = state();
        state.score = 41;
        state.last_spawn_score = 41;
        // speed 0 keeps the obstacle exactly where it was placed
        state.obstacles.push(obstacle_at(390.0, 430.0, 0.0));
        match tick(&mut state, &TickInput::default()) {
            TickOutcome::Collided(over) => {
                assert_eq!(over.final_score, 42);
                assert!(over.message.contains("Final Score: 42"));
            }
            other => panic!("expected a collision, got {:?}", other),
        }
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let mut state = state();
        state.obstacles.push(obstacle_at(420.0, 420.0, 0.0));
        state.obstacles.push(obstacle_at(380.0, 380.0, 0.0));
        assert_eq!(tick(&mut state, &TickInput::default()), TickOutcome::Continue);
    }

    #[test]
    fn obstacles_removed_exactly_at_margin() {
        let mut state = state();
        // multiplier after the tick is 1.0005, speed 0 keeps y fixed
        state.obstacles.push(obstacle_at(0.0, 539.9, 0.0));
        state.obstacles.push(obstacle_at(100.0, 540.0, 0.0));
        state.obstacles.push(obstacle_at(200.0, 541.0, 0.0));
        tick(&mut state, &TickInput::default());
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].x, 0.0);
    }

    #[test]
    fn obstacle_crossing_margin_during_tick_is_removed() {
        let mut state = state();
        state.obstacles.push(obstacle_at(0.0, 538.0, 3.0));
        tick(&mut state, &TickInput::default());
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn threshold_fires_once() {
        let mut state = state();
        state.score = 499;
        assert_eq!(
            tick(&mut state, &TickInput::default()),
            TickOutcome::Blessing { threshold: 500 }
        );
        assert!(state.choices.has_fired(500));
        clear_obstacles(&mut state);
        assert_eq!(tick(&mut state, &TickInput::default()), TickOutcome::Continue);
    }

    #[test]
    fn skipped_thresholds_fire_one_per_tick() {
        let mut state = state();
        state.score = 3100;
        state.last_spawn_score = 4000;
        let mut fired = Vec::new();
        for _ in 0..5 {
            if let TickOutcome::Blessing { threshold } = tick(&mut state, &TickInput::default()) {
                fired.push(threshold);
            }
        }
        assert_eq!(fired, vec![500, 1500, 3000]);
    }

    #[test]
    fn lowest_reached_threshold_fires_first_in_any_order() {
        let config = GameConfig {
            blessing_thresholds: vec![1500, 500],
            ..GameConfig::default()
        };
        let mut state = GameState::new(Rc::new(config), 12345);
        state.score = 1599;
        state.last_spawn_score = 1599;
        assert_eq!(
            tick(&mut state, &TickInput::default()),
            TickOutcome::Blessing { threshold: 500 }
        );
        assert_eq!(
            tick(&mut state, &TickInput::default()),
            TickOutcome::Blessing { threshold: 1500 }
        );
    }

    #[test]
    fn background_wraps_to_zero() {
        let mut state = state();
        state.background_offset = 57.0;
        tick(&mut state, &TickInput::default());
        assert_relative_eq!(state.background_offset, 59.001, epsilon = 1e-9);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.background_offset, 0.0);
    }

    proptest! {
        #[test]
        fn player_always_inside_canvas(moves in prop::collection::vec((any::<bool>(), any::<bool>()), 1..200)) {
            let mut state = state();
            for (left, right) in moves {
                tick(&mut state, &TickInput { left, right });
                state.obstacles.clear();
                let max_x = state.config.canvas_width - state.player.size;
                prop_assert!(state.player.x >= 0.0 && state.player.x <= max_x);
            }
        }

        #[test]
        fn multiplier_matches_score(start in 0u32..1_000_000) {
            let mut state = state();
            state.score = start;
            state.last_spawn_score = start;
            tick(&mut state, &TickInput::default());
            prop_assert_eq!(state.speed_multiplier, 1.0 + f64::from(start + 1) / 2000.0);
        }
    }
}
