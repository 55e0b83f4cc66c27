/// Each phase is its own type, so a run can only move through the transitions
/// implemented below:
/// - PUBLIC  : RunState and the phase markers
/// - PRIVATE : the GameState context, reachable read-only through context()
use std::rc::Rc;

use crate::config::GameConfig;
use crate::run::{AwaitingChoice, Ended, Idle, Running};
use crate::sim::{self, Blessing, Choice, GameOver, GameState, TickInput, TickOutcome};

/// Result of ticking a running run
pub enum IsTicking {
    Continue(RunState<Running>),
    Blessing(RunState<AwaitingChoice>),
    Over(RunState<Ended>),
}

#[derive(Debug)]
pub struct RunState<S> {
    context: GameState,
    state: S,
}

/// shared by all phases
impl<S> RunState<S> {
    pub fn context(&self) -> &GameState {
        &self.context
    }

    pub fn phase(&self) -> &S {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn context_mut(&mut self) -> &mut GameState {
        &mut self.context
    }

    /// Throw the run away and build a fresh one, whatever phase it was in
    pub fn reset(mut self) -> RunState<Idle> {
        RunState {
            context: self.context.next_run(),
            state: Idle,
        }
    }
}

impl RunState<Idle> {
    pub fn new(config: Rc<GameConfig>, seed: u64) -> Self {
        RunState {
            context: GameState::new(config, seed),
            state: Idle,
        }
    }

    pub fn start(self) -> RunState<Running> {
        log::info!("Run started");
        RunState {
            context: self.context,
            state: Running,
        }
    }
}

impl RunState<Running> {
    pub fn update(mut self, input: &TickInput) -> IsTicking {
        match sim::tick(&mut self.context, input) {
            TickOutcome::Continue => IsTicking::Continue(self),
            TickOutcome::Blessing { threshold } => {
                let blessing = Blessing::offer(&mut self.context, threshold);
                IsTicking::Blessing(RunState {
                    context: self.context,
                    state: AwaitingChoice { blessing },
                })
            }
            TickOutcome::Collided(summary) => IsTicking::Over(self.end(summary)),
        }
    }

    fn end(self, summary: GameOver) -> RunState<Ended> {
        log::info!("Run ended : {}", summary.message.replace('\n', " "));
        RunState {
            context: self.context,
            state: Ended { summary },
        }
    }
}

impl RunState<AwaitingChoice> {
    pub fn blessing(&self) -> &Blessing {
        &self.state.blessing
    }

    pub fn choose(mut self, choice: Choice) -> RunState<Running> {
        self.state.blessing.resolve(&mut self.context, choice);
        RunState {
            context: self.context,
            state: Running,
        }
    }
}

impl RunState<Ended> {
    pub fn summary(&self) -> &GameOver {
        &self.state.summary
    }
}
