//! Group Orchestrator
//!
//! Runs one party at a time through a fixed timed sequence:
//! invite everyone, wait, `p warp`, wait, `p disband`. A failed invite aborts
//! the whole run; there are no retries and no partial parties.

pub mod phase;

use statig::prelude::StateMachine;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::commands::{Effects, GameCommand};
use crate::config::Timings;
use crate::cycler::{Blocker, LocationCycler};
use crate::notifications::Notification;
use crate::scheduler::{Timer, TimerHandle};
use crate::telemetry::{create_run_span, generate_run_id};

pub use phase::{RunEvent, RunPhase};
use phase::RunLifecycle;

/// The one party run currently in flight
#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub run_id: String,
    pub participants: Vec<String>,
    /// Players seen joining; informational only
    pub joined: Vec<String>,
    span: tracing::Span,
}

pub struct GroupOrchestrator {
    machine: StateMachine<RunLifecycle>,
    run: Option<ActiveRun>,
    warp_delay: Duration,
    disband_delay: Duration,
    phase_timer: Option<TimerHandle>,
}

impl fmt::Debug for GroupOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupOrchestrator")
            .field("phase", &self.phase())
            .field("run", &self.run)
            .field("phase_timer", &self.phase_timer)
            .finish()
    }
}

impl GroupOrchestrator {
    pub fn new(timings: &Timings) -> Self {
        Self {
            machine: phase::new_machine(),
            run: None,
            warp_delay: timings.warp_delay,
            disband_delay: timings.disband_delay,
            phase_timer: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        phase::current_phase(&self.machine)
    }

    pub fn is_active(&self) -> bool {
        self.phase() != RunPhase::Idle
    }

    pub fn active_run(&self) -> Option<&ActiveRun> {
        self.run.as_ref()
    }

    /// Start a party run. Returns false if a run is already active or there is
    /// nobody to invite; a rejected start issues no command and is not queued.
    pub fn start_run(
        &mut self,
        participants: Vec<String>,
        fx: &mut Effects<'_>,
        cycler: &mut LocationCycler,
    ) -> bool {
        if let Some(run) = &self.run {
            warn!(run_id = %run.run_id, phase = ?self.phase(), "Party already in progress");
            return false;
        }
        if participants.is_empty() {
            warn!("Party run requested with no participants");
            return false;
        }

        let (from, to) = phase::step(&mut self.machine, RunEvent::Start);
        if (from, to) != (RunPhase::Idle, RunPhase::Assembling) {
            warn!(phase = ?to, "Party run could not start");
            return false;
        }

        let run_id = generate_run_id();
        let span = create_run_span(&run_id, participants.len());
        let entered = span.enter();

        let invite = GameCommand::PartyInvite(participants.clone());
        info!(command = %invite, delay_ms = self.warp_delay.as_millis() as u64, "Creating party");
        fx.commands.send(invite);
        cycler.block(Blocker::PartyRun);
        self.phase_timer = Some(fx.scheduler.schedule(self.warp_delay, Timer::RunWarpDue));

        drop(entered);
        self.run = Some(ActiveRun {
            run_id,
            participants,
            joined: Vec::new(),
            span,
        });
        true
    }

    /// D1 elapsed: warp the party
    pub fn on_warp_due(&mut self, fx: &mut Effects<'_>) {
        self.phase_timer = None;
        let (_, to) = phase::step(&mut self.machine, RunEvent::WarpDue);
        if to != RunPhase::Warping {
            return;
        }

        let span = self.span();
        let _entered = span.enter();
        info!("Warping party");
        fx.commands.send(GameCommand::PartyWarp);
        self.phase_timer = Some(fx.scheduler.schedule(self.disband_delay, Timer::RunDisbandDue));
    }

    /// D2 elapsed: disband and release the cycler
    pub fn on_disband_due(&mut self, fx: &mut Effects<'_>, cycler: &mut LocationCycler) {
        self.phase_timer = None;
        let (_, to) = phase::step(&mut self.machine, RunEvent::DisbandDue);
        if to == RunPhase::TearingDown {
            self.tear_down(fx, cycler);
        }
    }

    /// Party chat while a run is in flight
    pub fn on_notification(
        &mut self,
        notification: &Notification,
        fx: &mut Effects<'_>,
        cycler: &mut LocationCycler,
    ) {
        let span = self.span();
        let _entered = span.enter();

        match notification {
            Notification::InviteFailed { reason } => {
                let (from, to) = phase::step(&mut self.machine, RunEvent::InviteFailed);
                if to != RunPhase::TearingDown {
                    return;
                }
                warn!(phase = ?from, reason = %reason, "Failed to invite player - cancelling party");
                fx.commands.notify("Failed to invite player - cancelling party");
                fx.scheduler.cancel_slot(&mut self.phase_timer);
                self.tear_down(fx, cycler);
            }
            Notification::PlayerJoined { player } => {
                if self.phase() != RunPhase::Assembling {
                    return;
                }
                if let Some(run) = self.run.as_mut() {
                    info!(player = %player, "Player joined");
                    run.joined.push(player.clone());
                }
            }
            _ => {}
        }
    }

    /// Disband an in-flight run immediately, e.g. on shutdown
    pub fn abort(&mut self, fx: &mut Effects<'_>, cycler: &mut LocationCycler) {
        if !self.is_active() {
            return;
        }
        fx.scheduler.cancel_slot(&mut self.phase_timer);
        // Force the machine into teardown from whichever phase it is in
        phase::step(&mut self.machine, RunEvent::InviteFailed);
        phase::step(&mut self.machine, RunEvent::DisbandDue);
        if self.phase() == RunPhase::TearingDown {
            self.tear_down(fx, cycler);
        }
    }

    fn tear_down(&mut self, fx: &mut Effects<'_>, cycler: &mut LocationCycler) {
        info!("Disbanding party");
        fx.commands.send(GameCommand::PartyDisband);

        phase::step(&mut self.machine, RunEvent::TornDown);
        if let Some(run) = self.run.take() {
            info!(
                run_id = %run.run_id,
                joined = run.joined.len(),
                invited = run.participants.len(),
                "Party run finished"
            );
        }

        cycler.unblock(Blocker::PartyRun);
        cycler.resume(fx.scheduler);
    }

    fn span(&self) -> tracing::Span {
        self.run
            .as_ref()
            .map(|run| run.span.clone())
            .unwrap_or_else(tracing::Span::none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingSink;
    use crate::notifications::INVITE_FAILED_OFFLINE;
    use crate::scheduler::TimerQueue;

    struct Harness {
        orchestrator: GroupOrchestrator,
        cycler: LocationCycler,
        queue: TimerQueue,
        sink: RecordingSink,
    }

    impl Harness {
        fn new() -> Self {
            let timings = Timings::default();
            Self {
                orchestrator: GroupOrchestrator::new(&timings),
                cycler: LocationCycler::new(&timings),
                queue: TimerQueue::new(),
                sink: RecordingSink::new(),
            }
        }

        fn start(&mut self, players: &[&str]) -> bool {
            let mut fx = Effects {
                scheduler: &mut self.queue,
                commands: &mut self.sink,
            };
            self.orchestrator.start_run(
                players.iter().map(|p| p.to_string()).collect(),
                &mut fx,
                &mut self.cycler,
            )
        }

        fn notify(&mut self, notification: Notification) {
            let mut fx = Effects {
                scheduler: &mut self.queue,
                commands: &mut self.sink,
            };
            self.orchestrator
                .on_notification(&notification, &mut fx, &mut self.cycler);
        }

        /// Fire every timer due within `by`
        fn advance(&mut self, by: Duration) {
            let until = self.queue.now() + by;
            while let Some((_, timer)) = self.queue.pop_due(until) {
                let mut fx = Effects {
                    scheduler: &mut self.queue,
                    commands: &mut self.sink,
                };
                match timer {
                    Timer::RunWarpDue => self.orchestrator.on_warp_due(&mut fx),
                    Timer::RunDisbandDue => {
                        self.orchestrator.on_disband_due(&mut fx, &mut self.cycler)
                    }
                    Timer::CycleTick => self.cycler.tick(&mut fx),
                    Timer::CooldownElapsed => self.cycler.on_cooldown_elapsed(),
                    other => panic!("unexpected timer {other:?}"),
                }
            }
            self.queue.set_now(until);
        }
    }

    #[test]
    fn test_full_run_sequence_timing() {
        let mut h = Harness::new();
        assert!(h.start(&["a", "b"]));
        assert_eq!(h.sink.command_lines(), vec!["p a b"]);
        assert_eq!(h.orchestrator.phase(), RunPhase::Assembling);
        assert!(h.cycler.is_blocked_by(Blocker::PartyRun));

        h.advance(Duration::from_millis(4999));
        assert_eq!(h.sink.command_lines(), vec!["p a b"]);

        h.advance(Duration::from_millis(1));
        assert_eq!(h.sink.command_lines(), vec!["p a b", "p warp"]);
        assert_eq!(h.orchestrator.phase(), RunPhase::Warping);

        h.advance(Duration::from_millis(4999));
        assert!(h.orchestrator.is_active());

        h.advance(Duration::from_millis(1));
        assert_eq!(h.queue.now(), Duration::from_secs(10));
        assert_eq!(h.sink.command_lines(), vec!["p a b", "p warp", "p disband"]);
        assert!(!h.orchestrator.is_active());
        assert!(h.orchestrator.active_run().is_none());
        assert!(!h.cycler.is_blocked_by(Blocker::PartyRun));
    }

    #[test]
    fn test_start_rejected_while_active() {
        let mut h = Harness::new();
        h.start(&["a"]);
        h.advance(Duration::from_secs(2));
        let pending_before = h.queue.len();

        assert!(!h.start(&["b", "c"]));
        assert_eq!(h.sink.command_lines(), vec!["p a"]);
        assert_eq!(h.orchestrator.phase(), RunPhase::Assembling);
        assert_eq!(h.queue.len(), pending_before);
        assert_eq!(
            h.orchestrator.active_run().unwrap().participants,
            vec!["a"]
        );

        // The first run keeps its own timers
        h.advance(Duration::from_secs(3));
        assert_eq!(h.sink.command_lines(), vec!["p a", "p warp"]);
    }

    #[test]
    fn test_empty_participants_rejected() {
        let mut h = Harness::new();
        assert!(!h.start(&[]));
        assert!(h.sink.sent().is_empty());
        assert!(!h.orchestrator.is_active());
    }

    #[test]
    fn test_invite_failure_aborts_immediately() {
        let mut h = Harness::new();
        h.start(&["a", "b"]);
        h.advance(Duration::from_secs(1));

        h.notify(Notification::InviteFailed {
            reason: INVITE_FAILED_OFFLINE,
        });
        assert_eq!(h.sink.command_lines(), vec!["p a b", "p disband"]);
        assert!(!h.orchestrator.is_active());
        assert_eq!(h.queue.count(Timer::RunWarpDue), 0);

        h.advance(Duration::from_secs(30));
        assert!(!h
            .sink
            .command_lines()
            .contains(&"p warp".to_string()));
    }

    #[test]
    fn test_invite_failure_after_warp_is_ignored() {
        let mut h = Harness::new();
        h.start(&["a"]);
        h.advance(Duration::from_secs(6));

        h.notify(Notification::InviteFailed {
            reason: INVITE_FAILED_OFFLINE,
        });
        assert_eq!(h.orchestrator.phase(), RunPhase::Warping);

        h.advance(Duration::from_secs(4));
        assert_eq!(h.sink.command_lines(), vec!["p a", "p warp", "p disband"]);
    }

    #[test]
    fn test_join_is_informational() {
        let mut h = Harness::new();
        h.start(&["a"]);
        h.notify(Notification::PlayerJoined {
            player: "a".to_string(),
        });

        assert_eq!(h.orchestrator.active_run().unwrap().joined, vec!["a"]);
        assert_eq!(h.orchestrator.phase(), RunPhase::Assembling);
        assert_eq!(
            h.queue.remaining(h.orchestrator.phase_timer.unwrap()),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_teardown_leaves_single_cycle_tick() {
        let mut h = Harness::new();
        let mut fx = Effects {
            scheduler: &mut h.queue,
            commands: &mut h.sink,
        };
        h.cycler.enable(&mut fx);

        h.start(&["a"]);
        h.advance(Duration::from_secs(10));

        assert!(h.sink.command_lines().contains(&"p disband".to_string()));
        assert!(h.cycler.has_pending_tick());
        assert_eq!(h.queue.count(Timer::CycleTick), 1);
    }

    #[test]
    fn test_abort_disbands_in_flight_run() {
        let mut h = Harness::new();
        h.start(&["a"]);
        h.advance(Duration::from_secs(6));

        let mut fx = Effects {
            scheduler: &mut h.queue,
            commands: &mut h.sink,
        };
        h.orchestrator.abort(&mut fx, &mut h.cycler);

        assert!(!h.orchestrator.is_active());
        assert_eq!(h.queue.count(Timer::RunDisbandDue), 0);
        assert_eq!(h.sink.command_lines(), vec!["p a", "p warp", "p disband"]);
    }
}
