use anyhow::{anyhow, Result};
use std::mem;
use std::rc::Rc;

use crate::config::GameConfig;
use crate::run::state::{IsTicking, RunState};
use crate::run::{AwaitingChoice, Ended, Idle, RunPhase, Running};
use crate::sim::{BlessingEvent, Choice, GameOver, GameState, TickInput};

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State      →  Event   →  To State                 │
/// ├─────────────────────────────────────────────────────────┤
/// │  Idle            →  Start   →  Running                  │
/// │  Running         →  Tick    →  Running                  │
/// │  Running         →  Tick    →  AwaitingChoice           │
/// │  Running         →  Tick    →  Ended                    │
/// │  AwaitingChoice  →  Choose  →  Running                  │
/// │  (any)           →  Reset   →  Idle                     │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Tick(TickInput),
    Choose(Choice),
    Reset,
}

#[derive(Debug)]
pub enum RunStateMachine {
    Idle(RunState<Idle>),
    Running(RunState<Running>),
    AwaitingChoice(RunState<AwaitingChoice>),
    Ended(RunState<Ended>),
}

impl From<RunState<Idle>> for RunStateMachine {
    fn from(state: RunState<Idle>) -> Self {
        RunStateMachine::Idle(state)
    }
}

impl From<RunState<Running>> for RunStateMachine {
    fn from(state: RunState<Running>) -> Self {
        RunStateMachine::Running(state)
    }
}

impl From<RunState<AwaitingChoice>> for RunStateMachine {
    fn from(state: RunState<AwaitingChoice>) -> Self {
        RunStateMachine::AwaitingChoice(state)
    }
}

impl From<RunState<Ended>> for RunStateMachine {
    fn from(state: RunState<Ended>) -> Self {
        RunStateMachine::Ended(state)
    }
}

impl From<IsTicking> for RunStateMachine {
    fn from(is_ticking: IsTicking) -> Self {
        match is_ticking {
            IsTicking::Continue(running) => running.into(),
            IsTicking::Blessing(waiting) => waiting.into(),
            IsTicking::Over(ended) => ended.into(),
        }
    }
}

impl RunStateMachine {
    pub fn transition(self, event: Event) -> Self {
        match (self, event) {
            (RunStateMachine::Idle(state), Event::Start) => state.start().into(),
            (RunStateMachine::Running(state), Event::Tick(input)) => state.update(&input).into(),
            (RunStateMachine::AwaitingChoice(state), Event::Choose(choice)) => {
                state.choose(choice).into()
            }
            (RunStateMachine::Idle(state), Event::Reset) => state.reset().into(),
            (RunStateMachine::Running(state), Event::Reset) => state.reset().into(),
            (RunStateMachine::AwaitingChoice(state), Event::Reset) => state.reset().into(),
            (RunStateMachine::Ended(state), Event::Reset) => state.reset().into(),
            // anything else (ticking while waiting on a choice, starting twice, ...)
            // leaves the run where it is
            (machine, _) => machine,
        }
    }

    pub fn context(&self) -> &GameState {
        match self {
            RunStateMachine::Idle(state) => state.context(),
            RunStateMachine::Running(state) => state.context(),
            RunStateMachine::AwaitingChoice(state) => state.context(),
            RunStateMachine::Ended(state) => state.context(),
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            RunStateMachine::Idle(_) => Idle::name(),
            RunStateMachine::Running(_) => Running::name(),
            RunStateMachine::AwaitingChoice(_) => AwaitingChoice::name(),
            RunStateMachine::Ended(_) => Ended::name(),
        }
    }

    /// What the presentation layer has to show for the current phase
    fn notice(&self) -> Option<Notice> {
        match self {
            RunStateMachine::AwaitingChoice(state) => {
                Some(Notice::BlessingOffered(state.blessing().event()))
            }
            RunStateMachine::Ended(state) => Some(Notice::RunEnded(state.summary().clone())),
            _ => None,
        }
    }
}

/// Raised by [`Controller::update`] when a tick moves the run out of `Running`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    BlessingOffered(&'static BlessingEvent),
    RunEnded(GameOver),
}

/// Owns the run and drives it through the state machine
pub struct Controller {
    machine: RunStateMachine,
}

impl Controller {
    pub fn new(config: Rc<GameConfig>, seed: u64) -> Self {
        Controller {
            machine: RunState::new(config, seed).into(),
        }
    }

    fn apply(&mut self, event: Event) {
        // transition consumes the machine; an unstarted run holds the slot meanwhile
        let config = Rc::clone(&self.machine.context().config);
        let machine = mem::replace(&mut self.machine, RunState::new(config, 0).into());
        self.machine = machine.transition(event);
    }

    pub fn start(&mut self) {
        self.apply(Event::Start);
    }

    /// Tick once if the run is `Running`; otherwise nothing happens
    pub fn update(&mut self, input: &TickInput) -> Option<Notice> {
        if !self.is_running() {
            return None;
        }
        self.apply(Event::Tick(*input));
        self.machine.notice()
    }

    pub fn choose(&mut self, choice: Choice) -> Result<()> {
        if !self.is_awaiting_choice() {
            return Err(anyhow!(
                "No blessing pending, cannot choose {} while {}",
                choice,
                self.phase_name()
            ));
        }
        self.apply(Event::Choose(choice));
        Ok(())
    }

    /// Back to `Idle` with a completely fresh run
    pub fn reset(&mut self) {
        self.apply(Event::Reset);
    }

    pub fn state(&self) -> &GameState {
        self.machine.context()
    }

    pub fn phase_name(&self) -> &'static str {
        self.machine.phase_name()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.machine, RunStateMachine::Running(_))
    }

    pub fn is_awaiting_choice(&self) -> bool {
        matches!(self.machine, RunStateMachine::AwaitingChoice(_))
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.machine, RunStateMachine::Ended(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Obstacle, ObstacleSkin};

    fn controller() -> Controller {
        Controller::new(Rc::new(GameConfig::default()), 2024)
    }

    fn idle_ticks(controller: &mut Controller, n: usize) -> Vec<Notice> {
        (0..n)
            .filter_map(|_| controller.update(&TickInput::default()))
            .collect()
    }

    /// Mutable access to the run for setting up scenarios
    fn context_mut(controller: &mut Controller) -> &mut GameState {
        match &mut controller.machine {
            RunStateMachine::Idle(state) => state.context_mut(),
            RunStateMachine::Running(state) => state.context_mut(),
            _ => panic!("scenario setup expects Idle or Running"),
        }
    }

    #[test]
    fn idle_does_not_tick() {
        let mut controller = controller();
        assert_eq!(controller.phase_name(), "Idle");
        assert!(idle_ticks(&mut controller, 10).is_empty());
        assert_eq!(controller.state().score, 0);
    }

    #[test]
    fn start_then_tick() {
        let mut controller = controller();
        controller.start();
        assert!(controller.is_running());
        idle_ticks(&mut controller, 5);
        assert_eq!(controller.state().score, 5);
    }

    #[test]
    fn threshold_pauses_until_choice() {
        let mut controller = controller();
        controller.start();
        context_mut(&mut controller).score = 499;

        let notices = idle_ticks(&mut controller, 1);
        assert!(matches!(notices.as_slice(), [Notice::BlessingOffered(_)]));
        assert!(controller.is_awaiting_choice());

        // frozen while waiting
        assert!(idle_ticks(&mut controller, 20).is_empty());
        assert_eq!(controller.state().score, 500);

        controller.choose(Choice::B).unwrap();
        assert!(controller.is_running());
        idle_ticks(&mut controller, 1);
        assert_eq!(controller.state().score, 501);
        assert_eq!(controller.state().choices.log(), &[Choice::B]);
    }

    #[test]
    fn choose_without_pending_blessing_fails() {
        let mut controller = controller();
        assert!(controller.choose(Choice::A).is_err());
        controller.start();
        assert!(controller.choose(Choice::A).is_err());
        assert!(controller.is_running());
    }

    #[test]
    fn every_threshold_fires_once_per_run() {
        let mut controller = controller();
        controller.start();
        let mut offered = 0;
        while controller.state().score < 9000 {
            context_mut(&mut controller).obstacles.clear();
            if let Some(Notice::BlessingOffered(_)) = controller.update(&TickInput::default()) {
                offered += 1;
                controller.choose(Choice::A).unwrap();
            }
        }
        assert_eq!(offered, 5);
        let fired: Vec<u32> = controller.state().choices.fired().collect();
        assert_eq!(fired, vec![500, 1500, 3000, 5000, 8000]);
    }

    #[test]
    fn state_and_phase_follow_every_transition() {
        let mut controller = controller();
        assert_eq!(controller.phase_name(), "Idle");
        controller.start();
        assert_eq!(controller.phase_name(), "Running");
        context_mut(&mut controller).score = 499;
        idle_ticks(&mut controller, 1);
        assert_eq!(controller.phase_name(), "AwaitingChoice");
        assert_eq!(controller.state().score, 500);
        controller.choose(Choice::A).unwrap();
        assert_eq!(controller.phase_name(), "Running");
        assert_eq!(controller.state().choices.log(), &[Choice::A]);
    }

    /// Event texts offered over a whole run, choosing A every time
    fn offered_events(seed: u64) -> Vec<&'static str> {
        let mut controller = Controller::new(Rc::new(GameConfig::default()), seed);
        controller.start();
        let mut events = Vec::new();
        while controller.state().score < 8000 {
            context_mut(&mut controller).obstacles.clear();
            if let Some(Notice::BlessingOffered(event)) = controller.update(&TickInput::default())
            {
                events.push(event.text);
                controller.choose(Choice::A).unwrap();
            }
        }
        events
    }

    #[test]
    fn events_are_not_tied_to_threshold_position() {
        let runs: Vec<Vec<&str>> = (1..=8).map(offered_events).collect();
        assert!(runs.iter().all(|events| events.len() == 5));
        assert!(runs.iter().any(|events| events != &runs[0]));
    }

    #[test]
    fn collision_ends_run_and_stops_ticking() {
        let mut controller = controller();
        controller.start();
        context_mut(&mut controller).score = 99;
        context_mut(&mut controller).last_spawn_score = 99;
        context_mut(&mut controller).obstacles.push(Obstacle {
            x: 390.0,
            y: 430.0,
            size: 40.0,
            speed: 0.0,
            skin: ObstacleSkin::First,
        });

        match controller.update(&TickInput::default()) {
            Some(Notice::RunEnded(over)) => assert!(over.message.contains("100")),
            other => panic!("expected the run to end, got {:?}", other),
        }
        assert!(controller.is_ended());
        assert!(idle_ticks(&mut controller, 10).is_empty());
        assert_eq!(controller.state().score, 100);

        // starting an ended run does nothing
        controller.start();
        assert!(controller.is_ended());
    }

    #[test]
    fn reset_gives_a_fresh_run() {
        let mut controller = controller();
        controller.start();
        context_mut(&mut controller).score = 499;
        idle_ticks(&mut controller, 1);
        controller.choose(Choice::A).unwrap();

        controller.reset();
        assert_eq!(controller.phase_name(), "Idle");
        let state = controller.state();
        assert_eq!(state.score, 0);
        assert_eq!(state.player.speed, 6.0);
        assert!(state.choices.log().is_empty());
        assert!(state.obstacles.is_empty());

        controller.start();
        assert!(controller.is_running());
    }
}
