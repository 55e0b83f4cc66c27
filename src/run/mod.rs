// Lifecycle of a single run
// ┌───────────┐  Start   ┌───────────┐  threshold  ┌────────────────┐
// │   Idle    ├─────────►│  Running  ├────────────►│ AwaitingChoice │
// └─────▲─────┘          │           │◄────────────┤                │
//       │                └─────┬─────┘   Choose    └────────────────┘
//       │ Reset                │ collision
//       │                ┌─────▼─────┐
//       └────────────────┤   Ended   │
//                        └───────────┘
// - state.rs      : RunState<Phase> typestate, the only way to move a run forward
// - controller.rs : RunStateMachine enum + Controller the game shell talks to
pub mod controller;
pub mod state;

pub use controller::{Controller, Event, Notice, RunStateMachine};
pub use state::{IsTicking, RunState};

use crate::sim::{Blessing, GameOver};

pub trait RunPhase {
    fn name() -> &'static str;
}

/// Built but not started; nothing ticks
#[derive(Debug, Clone, Copy)]
pub struct Idle;

#[derive(Debug, Clone, Copy)]
pub struct Running;

/// Simulation halted until the player picks a blessing option
#[derive(Debug, Clone, Copy)]
pub struct AwaitingChoice {
    pub blessing: Blessing,
}

/// Terminal for this run, only `Reset` leaves it
#[derive(Debug, Clone)]
pub struct Ended {
    pub summary: GameOver,
}

impl RunPhase for Idle {
    fn name() -> &'static str {
        "Idle"
    }
}

impl RunPhase for Running {
    fn name() -> &'static str {
        "Running"
    }
}

impl RunPhase for AwaitingChoice {
    fn name() -> &'static str {
        "AwaitingChoice"
    }
}

impl RunPhase for Ended {
    fn name() -> &'static str {
        "Ended"
    }
}
