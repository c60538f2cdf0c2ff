//! State-Transition Controller
//!
//! Owns every piece of session state and is the only entry point for the
//! runtime: timer fires, chat lines and operator commands all arrive here, one
//! callback at a time.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::commands::{CommandSink, Effects};
use crate::config::Timings;
use crate::console::{self, OperatorCommand};
use crate::cycler::{Blocker, Location, LocationCycler};
use crate::notifications::Notification;
use crate::orchestrator::GroupOrchestrator;
use crate::scheduler::{Scheduler, Timer, TimerHandle, TimerQueue};
use crate::status::{BossPhase, BossStatus, Entity, EntityState, StatusResolver};
use crate::warp_list::WarpListStore;

#[derive(Debug, Default)]
struct EntityStates {
    broodmother: EntityState,
    protector: EntityState,
}

impl EntityStates {
    fn get(&self, entity: Entity) -> &EntityState {
        match entity {
            Entity::Broodmother => &self.broodmother,
            Entity::Protector => &self.protector,
        }
    }

    fn get_mut(&mut self, entity: Entity) -> &mut EntityState {
        match entity {
            Entity::Broodmother => &mut self.broodmother,
            Entity::Protector => &mut self.protector,
        }
    }
}

pub struct Controller {
    enabled: bool,
    timings: Timings,
    resolver: StatusResolver,
    entities: EntityStates,
    orchestrator: GroupOrchestrator,
    cycler: LocationCycler,
    store: WarpListStore,
    scheduler: TimerQueue,
    commands: Box<dyn CommandSink>,
    poll_timer: Option<TimerHandle>,
    brood_hold_timer: Option<TimerHandle>,
    protector_resume_timer: Option<TimerHandle>,
}

impl Controller {
    pub fn new(
        timings: Timings,
        resolver: StatusResolver,
        store: WarpListStore,
        commands: Box<dyn CommandSink>,
    ) -> Self {
        Self {
            enabled: false,
            orchestrator: GroupOrchestrator::new(&timings),
            cycler: LocationCycler::new(&timings),
            timings,
            resolver,
            entities: EntityStates::default(),
            store,
            scheduler: TimerQueue::new(),
            commands,
            poll_timer: None,
            brood_hold_timer: None,
            protector_resume_timer: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn entity_state(&self, entity: Entity) -> &EntityState {
        self.entities.get(entity)
    }

    pub fn cycler(&self) -> &LocationCycler {
        &self.cycler
    }

    pub fn orchestrator(&self) -> &GroupOrchestrator {
        &self.orchestrator
    }

    pub fn scheduler(&self) -> &TimerQueue {
        &self.scheduler
    }

    pub fn store(&self) -> &WarpListStore {
        &self.store
    }

    /// Deadline of the next timer, relative to when the controller was created
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((_, timer)) = self.scheduler.pop_due(now) {
            self.on_timer(timer);
        }
        self.scheduler.set_now(now);
    }

    pub fn advance(&mut self, by: Duration) {
        let now = self.scheduler.now() + by;
        self.advance_to(now);
    }

    pub fn toggle_cycling(&mut self) -> bool {
        if self.enabled {
            self.disable();
        } else {
            self.enable();
        }
        self.enabled
    }

    /// Start polling and cycling. Both loops run once immediately.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        info!("Cycling enabled");
        self.commands
            .notify("Cycling enabled - will check boss states and party automatically");

        self.poll();
        let (mut fx, cycler, _) = self.parts();
        cycler.enable(&mut fx);
    }

    /// Stop both loops. A party run already in flight still completes.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        info!("Cycling disabled");
        self.commands.notify("Cycling disabled");

        self.scheduler.cancel_slot(&mut self.poll_timer);
        self.scheduler.cancel_slot(&mut self.brood_hold_timer);
        self.scheduler.cancel_slot(&mut self.protector_resume_timer);
        self.cycler.disable(&mut self.scheduler);
        self.cycler.unblock(Blocker::ProtectorPending);
        self.cycler.unblock(Blocker::BroodmotherPending);
    }

    /// Cancel all timers and disband any party still formed
    pub fn shutdown(&mut self) {
        self.disable();
        let (mut fx, cycler, orchestrator) = self.parts();
        orchestrator.abort(&mut fx, cycler);
        info!(pending_timers = self.scheduler.len(), "Controller shut down");
    }

    /// One boss state poll. Re-arms itself while cycling is enabled.
    pub fn poll(&mut self) {
        if !self.enabled {
            return;
        }
        self.scheduler.cancel_slot(&mut self.poll_timer);

        for entity in Entity::ALL {
            let state = self.entities.get_mut(entity);
            let Some(status) = self.resolver.resolve(entity, state) else {
                continue;
            };
            let unchanged = state
                .value
                .as_ref()
                .is_some_and(|current| current.raw() == status.raw());
            if !unchanged {
                self.on_transition(entity, status);
            }
        }

        self.poll_timer = Some(
            self.scheduler
                .schedule(self.timings.poll_interval, Timer::Poll),
        );
    }

    pub fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Poll => {
                self.poll_timer = None;
                self.poll();
            }
            Timer::CycleTick => {
                let (mut fx, cycler, _) = self.parts();
                cycler.tick(&mut fx);
            }
            Timer::CooldownElapsed => self.cycler.on_cooldown_elapsed(),
            Timer::RunWarpDue => {
                let (mut fx, _, orchestrator) = self.parts();
                orchestrator.on_warp_due(&mut fx);
            }
            Timer::RunDisbandDue => {
                let (mut fx, cycler, orchestrator) = self.parts();
                orchestrator.on_disband_due(&mut fx, cycler);
            }
            Timer::ProtectorResume => {
                self.protector_resume_timer = None;
                self.resume_after_protector();
            }
            Timer::BroodHoldExpired => {
                self.brood_hold_timer = None;
                if self.cycler.unblock(Blocker::BroodmotherPending) {
                    warn!(
                        timeout_ms = self
                            .timings
                            .brood_hold_timeout
                            .map_or(0, |t| t.as_millis() as u64),
                        "Broodmother never spawned, releasing hold"
                    );
                }
            }
        }
    }

    /// One inbound chat line
    pub fn handle_chat(&mut self, raw: &str) {
        let Some(notification) = Notification::parse(raw) else {
            return;
        };

        if notification.is_party_event() {
            if self.orchestrator.is_active() {
                let (mut fx, cycler, orchestrator) = self.parts();
                orchestrator.on_notification(&notification, &mut fx, cycler);
            }
            return;
        }

        if !self.enabled {
            return;
        }

        match notification {
            Notification::ProtectorRising => {
                if self.cycler.is_blocked_by(Blocker::ProtectorPending) {
                    info!("Protector rising, preparing party");
                    self.start_run_for(Entity::Protector);
                }
            }
            Notification::ProtectorSpawned => {
                self.cycler.unblock(Blocker::ProtectorPending);
                info!("Protector fully spawned");
            }
            Notification::ProtectorDefeated => {
                info!("Protector killed, waiting before resuming cycle");
                self.entities
                    .protector
                    .record(BossStatus::dead(Entity::Protector));
                self.cycler.unblock(Blocker::ProtectorPending);
                self.schedule_protector_resume();
            }
            Notification::InviteFailed { .. } | Notification::PlayerJoined { .. } => {}
        }
    }

    /// One operator command line such as `/warpadd brood Steve`
    pub fn handle_command_line(&mut self, line: &str) {
        let command = match console::parse_line(line) {
            Ok(command) => command,
            Err(usage) => {
                self.commands.notify(&usage);
                return;
            }
        };

        let feedback = match command {
            OperatorCommand::Cycle => {
                self.toggle_cycling();
                return;
            }
            OperatorCommand::CheckBoss => console::boss_report(
                self.entities.get(Entity::Broodmother),
                self.entities.get(Entity::Protector),
                self.enabled,
            ),
            OperatorCommand::Help => console::help_lines(),
            list_command => console::run_list_command(&self.store, &list_command),
        };

        for line in feedback {
            self.commands.notify(&line);
        }
    }

    fn on_transition(&mut self, entity: Entity, status: BossStatus) {
        let previous = self.entities.get_mut(entity).record(status.clone());
        info!(
            entity = %entity,
            previous = ?previous.as_ref().map(BossStatus::raw),
            state = %status,
            "Boss state changed"
        );
        self.commands.notify(&format!("{entity}: {status}"));

        match entity {
            Entity::Broodmother => self.apply_broodmother_policy(previous.as_ref(), &status),
            Entity::Protector => self.apply_protector_policy(&status),
        }
    }

    fn apply_broodmother_policy(&mut self, previous: Option<&BossStatus>, status: &BossStatus) {
        if previous.is_some_and(BossStatus::is_pending)
            && !status.is_pending()
            && self.brood_hold_timer.is_some()
        {
            self.scheduler.cancel_slot(&mut self.brood_hold_timer);
            debug!("Cleared Broodmother hold timer due to state change");
        }

        match status.phase() {
            Some(BossPhase::Intermediate) => {
                info!("Broodmother imminent, holding position until spawn");
                self.cycler.block(Blocker::BroodmotherPending);
                self.scheduler.cancel_slot(&mut self.brood_hold_timer);
                self.brood_hold_timer = self
                    .timings
                    .brood_hold_timeout
                    .map(|timeout| self.scheduler.schedule(timeout, Timer::BroodHoldExpired));
            }
            Some(BossPhase::Active) => {
                info!("Broodmother alive, starting party");
                self.cycler.unblock(Blocker::BroodmotherPending);
                self.start_run_for(Entity::Broodmother);
            }
            Some(BossPhase::Dead) | None => {
                self.cycler.unblock(Blocker::BroodmotherPending);
            }
        }
    }

    fn apply_protector_policy(&mut self, status: &BossStatus) {
        match status.phase() {
            Some(BossPhase::Intermediate) => {
                info!("Protector awakening, waiting for spawn");
                self.cycler.block(Blocker::ProtectorPending);
            }
            Some(BossPhase::Active) => {
                info!("Protector summoned, starting party");
                self.cycler.unblock(Blocker::ProtectorPending);
                self.start_run_for(Entity::Protector);
            }
            Some(BossPhase::Dead) | None => {
                if self.cycler.unblock(Blocker::ProtectorPending) {
                    info!("Protector killed, waiting before resuming cycle");
                    self.schedule_protector_resume();
                }
            }
        }
    }

    fn start_run_for(&mut self, entity: Entity) {
        let Some(members) = self.store.party_members(entity) else {
            debug!(entity = %entity, "Warp list disabled or empty, no party");
            return;
        };
        let (mut fx, cycler, orchestrator) = self.parts();
        orchestrator.start_run(members, &mut fx, cycler);
    }

    fn schedule_protector_resume(&mut self) {
        self.scheduler.cancel_slot(&mut self.protector_resume_timer);
        self.protector_resume_timer = Some(
            self.scheduler
                .schedule(self.timings.resume_delay, Timer::ProtectorResume),
        );
    }

    /// Land the next warp on the top location, without waiting a cycle period
    fn resume_after_protector(&mut self) {
        if !self.enabled {
            return;
        }
        info!("Resuming normal cycle");
        self.cycler.force_location(Location::Drag);
        let (mut fx, cycler, _) = self.parts();
        cycler.tick(&mut fx);
    }

    fn parts(&mut self) -> (Effects<'_>, &mut LocationCycler, &mut GroupOrchestrator) {
        (
            Effects {
                scheduler: &mut self.scheduler,
                commands: &mut *self.commands,
            },
            &mut self.cycler,
            &mut self.orchestrator,
        )
    }
}
