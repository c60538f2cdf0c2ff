// Party run phases as a statig state machine
//
// The machine only decides which transitions are legal; the orchestrator
// applies side effects for each (from, to) pair.

use statig::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Start,
    WarpDue,
    DisbandDue,
    InviteFailed,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Assembling,
    Warping,
    TearingDown,
}

#[derive(Debug, Default)]
pub struct RunLifecycle {
    pub runs_started: u64,
}

#[state_machine(initial = "State::idle()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl RunLifecycle {
    #[state]
    fn idle(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::Start => {
                self.runs_started += 1;
                tracing::debug!(runs_started = self.runs_started, "Party run starting");
                Transition(State::assembling())
            }
            _ => Handled,
        }
    }

    #[state]
    fn assembling(event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::WarpDue => Transition(State::warping()),
            RunEvent::InviteFailed => Transition(State::tearing_down()),
            _ => Handled,
        }
    }

    #[state]
    fn warping(event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::DisbandDue => Transition(State::tearing_down()),
            _ => Handled,
        }
    }

    #[state]
    fn tearing_down(event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::TornDown => Transition(State::idle()),
            _ => Handled,
        }
    }
}

fn phase_of(state: &State) -> RunPhase {
    match state {
        State::Idle {} => RunPhase::Idle,
        State::Assembling {} => RunPhase::Assembling,
        State::Warping {} => RunPhase::Warping,
        State::TearingDown {} => RunPhase::TearingDown,
    }
}

/// Feed `event` to the machine and report the phase before and after.
pub fn step(machine: &mut StateMachine<RunLifecycle>, event: RunEvent) -> (RunPhase, RunPhase) {
    let from = phase_of(machine.state());
    machine.handle(&event);
    (from, phase_of(machine.state()))
}

pub fn current_phase(machine: &StateMachine<RunLifecycle>) -> RunPhase {
    phase_of(machine.state())
}

pub fn new_machine() -> StateMachine<RunLifecycle> {
    RunLifecycle::default().state_machine()
}
