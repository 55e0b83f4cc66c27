//! Blessings: the choice events offered at score thresholds
//!
//! Offering one picks an event uniformly from [`CATALOG`], with no link to the
//! threshold that fired. Resolving it applies that event's effect for the
//! chosen option and logs the choice. Effects are never undone.

use anyhow::{anyhow, Error};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use super::state::{GameState, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    A,
    B,
}

impl Choice {
    pub fn letter(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Choice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Choice::A),
            "B" | "b" => Ok(Choice::B),
            other => Err(anyhow!("Unknown blessing choice : '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlessingEvent {
    pub text: &'static str,
    pub option_a: &'static str,
    pub option_b: &'static str,
}

impl BlessingEvent {
    pub fn label(&self, choice: Choice) -> &'static str {
        match choice {
            Choice::A => self.option_a,
            Choice::B => self.option_b,
        }
    }
}

pub const CATALOG: [BlessingEvent; 4] = [
    BlessingEvent {
        text: "A spirit of the dunes whispers. Choose a boon:",
        option_a: "Windform: Move Faster",
        option_b: "Stoneform: Smaller Hitbox",
    },
    BlessingEvent {
        text: "Lightning crackles in the sands. Pick your blessing:",
        option_a: "Giantstride: Bigger but Slower",
        option_b: "Needleform: Faster but Smaller",
    },
    BlessingEvent {
        text: "Mystical light shimmers. Select your boon:",
        option_a: "Shadow Step: Dodge Obstacles More Easily",
        option_b: "Ironhide: Become Tougher",
    },
    BlessingEvent {
        text: "A vortex appears. Choose your fate:",
        option_a: "Chaos Flux: Random speed & size",
        option_b: "Blazeform: Faster & Brighter aura",
    },
];

/// A blessing waiting on the player's pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blessing {
    event_index: usize,
    threshold: u32,
}

impl Blessing {
    /// Pick a random event for the threshold that just fired
    pub fn offer(state: &mut GameState, threshold: u32) -> Self {
        let event_index = state.rng.gen_range(0..CATALOG.len());
        log::info!(
            "Blessing offered at score {} (threshold {}) : {}",
            state.score,
            threshold,
            CATALOG[event_index].text
        );
        Blessing {
            event_index,
            threshold,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_event(event_index: usize, threshold: u32) -> Self {
        Blessing {
            event_index,
            threshold,
        }
    }

    pub fn event(&self) -> &'static BlessingEvent {
        &CATALOG[self.event_index]
    }

    pub fn event_index(&self) -> usize {
        self.event_index
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Log the choice and apply its effect to the player and world
    pub fn resolve(self, state: &mut GameState, choice: Choice) {
        state.choices.record(choice);
        match apply_effect(self.event_index, choice, &mut state.player, &mut state.rng) {
            Some(color) => state.world_color = color,
            None => log::error!("No blessing event #{}", self.event_index),
        }
        log::info!(
            "Blessing chosen : {} ({}) -> speed {:.2}, size {:.2}",
            choice,
            self.event().label(choice),
            state.player.speed,
            state.player.size
        );
    }
}

/// Mutate the player for `event_index`/`choice`, returning the new world colour
fn apply_effect(
    event_index: usize,
    choice: Choice,
    player: &mut Player,
    rng: &mut impl Rng,
) -> Option<&'static str> {
    let color = match (event_index, choice) {
        (0, Choice::A) => {
            player.speed += 2.0;
            "#3af"
        }
        (0, Choice::B) => {
            player.size = (player.size - 10.0).max(20.0);
            "#7f3"
        }
        (1, Choice::A) => {
            player.size += 8.0;
            player.speed = (player.speed - 2.0).max(3.0);
            "#fa3"
        }
        (1, Choice::B) => {
            player.speed += 1.0;
            player.size = (player.size - 6.0).max(15.0);
            "#f3f"
        }
        (2, Choice::A) => {
            player.speed += 1.5;
            "#09f"
        }
        (2, Choice::B) => {
            player.size += 4.0;
            "#f90"
        }
        (3, Choice::A) => {
            player.speed = rng.gen_range(3.0..9.0);
            player.size = rng.gen_range(20.0..40.0);
            "#f0f"
        }
        (3, Choice::B) => {
            player.speed += 2.0;
            "#fa0"
        }
        _ => return None,
    };
    Some(color)
}
