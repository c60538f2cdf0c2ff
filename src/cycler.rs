//! Location Cycler
//!
//! Alternates the player between the two warp locations every cycle period.
//! While any [`Blocker`] holds, ticks keep re-arming but the location stays put.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::commands::{Effects, GameCommand};
use crate::config::Timings;
use crate::scheduler::{Scheduler, Timer, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Top,
    Drag,
}

impl Location {
    /// Argument of the `warp` command
    pub fn warp_target(self) -> &'static str {
        match self {
            Location::Top => "top",
            Location::Drag => "drag",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Location::Top => Location::Drag,
            Location::Drag => Location::Top,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.warp_target())
    }
}

/// A condition that holds the player at the current location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Blocker {
    /// A party run is in flight
    PartyRun,
    /// The Protector is awakening
    ProtectorPending,
    /// The Broodmother is imminent
    BroodmotherPending,
    /// A location warp was just issued
    WarpCooldown,
}

#[derive(Debug)]
pub struct LocationCycler {
    enabled: bool,
    current: Location,
    blockers: BTreeSet<Blocker>,
    period: Duration,
    cooldown: Duration,
    tick_timer: Option<TimerHandle>,
    cooldown_timer: Option<TimerHandle>,
    /// Set once the current Broodmother hold has been logged at info
    hold_announced: bool,
}

impl LocationCycler {
    pub fn new(timings: &Timings) -> Self {
        Self {
            enabled: false,
            current: Location::Top,
            blockers: BTreeSet::new(),
            period: timings.cycle_period,
            cooldown: timings.warp_cooldown,
            tick_timer: None,
            cooldown_timer: None,
            hold_announced: false,
        }
    }

    /// Start cycling from the top location; the first warp goes to drag.
    pub fn enable(&mut self, fx: &mut Effects<'_>) {
        self.enabled = true;
        self.current = Location::Top;
        self.tick(fx);
    }

    /// Stop cycling. Only `enable` restarts the loop.
    pub fn disable(&mut self, scheduler: &mut dyn Scheduler) {
        self.enabled = false;
        scheduler.cancel_slot(&mut self.tick_timer);
    }

    /// One cycle step. Safe to call directly: any pending tick is replaced.
    pub fn tick(&mut self, fx: &mut Effects<'_>) {
        if !self.enabled {
            return;
        }

        fx.scheduler.cancel_slot(&mut self.tick_timer);

        if !self.blockers.is_empty() {
            if self.blockers.contains(&Blocker::BroodmotherPending) {
                if self.hold_announced {
                    debug!("Still holding for Broodmother");
                } else {
                    info!("Holding position for Broodmother imminent spawn");
                    self.hold_announced = true;
                }
            } else {
                debug!(blockers = ?self.blockers, "Cycle tick deferred");
            }
            self.arm_tick(fx.scheduler);
            return;
        }

        self.current = self.current.other();
        info!(location = %self.current, "Warping to next location");
        fx.commands.send(GameCommand::Warp(self.current));

        self.blockers.insert(Blocker::WarpCooldown);
        fx.scheduler.cancel_slot(&mut self.cooldown_timer);
        self.cooldown_timer = Some(fx.scheduler.schedule(self.cooldown, Timer::CooldownElapsed));

        self.arm_tick(fx.scheduler);
    }

    pub fn on_cooldown_elapsed(&mut self) {
        self.cooldown_timer = None;
        if self.blockers.remove(&Blocker::WarpCooldown) {
            debug!("Ready for next warp");
        }
    }

    /// Re-arm the loop after a party run, unless a tick is already pending.
    pub fn resume(&mut self, scheduler: &mut dyn Scheduler) {
        if self.enabled && self.tick_timer.is_none() {
            self.arm_tick(scheduler);
        }
    }

    /// Overwrite the current location without warping
    pub fn force_location(&mut self, location: Location) {
        self.current = location;
    }

    /// Returns true if the blocker was not already set
    pub fn block(&mut self, blocker: Blocker) -> bool {
        self.blockers.insert(blocker)
    }

    /// Returns true if the blocker was set
    pub fn unblock(&mut self, blocker: Blocker) -> bool {
        if blocker == Blocker::BroodmotherPending {
            self.hold_announced = false;
        }
        self.blockers.remove(&blocker)
    }

    pub fn is_blocked_by(&self, blocker: Blocker) -> bool {
        self.blockers.contains(&blocker)
    }

    pub fn blockers(&self) -> impl Iterator<Item = Blocker> + '_ {
        self.blockers.iter().copied()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn current_location(&self) -> Location {
        self.current
    }

    pub fn has_pending_tick(&self) -> bool {
        self.tick_timer.is_some()
    }

    fn arm_tick(&mut self, scheduler: &mut dyn Scheduler) {
        self.tick_timer = Some(scheduler.schedule(self.period, Timer::CycleTick));
    }
}
