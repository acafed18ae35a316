//! Employee snooze cycle
//!
//! Working -> Snoozing -> Working -> ... with Dead as an absorbing state.
//! A nap is a two-phase timer: after the re-snooze buffer a repeat press
//! restarts the nap, and at `wake_up_time` from nap start the employee wakes.

use super::clock::{Scheduler, TimerClass, TimerHandle};
use super::host::{Actor, AnimationSink, Meter, MeterSink};
use super::state::{EmployeeState, SessionTimer, SnoozeTimer};
use crate::consts::SNOOZE_QUANTUM;
use crate::tuning::Tuning;

/// What a snooze press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeResponse {
    /// Fresh nap from Working
    Started,
    /// Active nap cancelled and begun again
    Restarted,
    /// Not eligible right now
    Ignored,
}

/// Employee sleep/wake state machine and snooze meter
#[derive(Debug, Clone)]
pub struct SnoozeCycle {
    state: EmployeeState,
    amount: f32,
    needed: f32,
    reduce_speed: f32,
    resnooze_buffer: f32,
    wake_up_time: f32,
    /// A press starts a new nap
    allow_snooze: bool,
    /// A press restarts the current nap
    allow_resnooze: bool,
    /// The single live nap continuation
    timer: Option<TimerHandle>,
    /// Scaled-clock time the current nap began
    nap_started_at: Option<f32>,
    naps: u32,
}

impl SnoozeCycle {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            state: EmployeeState::Working,
            amount: 0.0,
            needed: tuning.snooze_needed,
            reduce_speed: tuning.snooze_reduce_speed,
            resnooze_buffer: tuning.allow_resnooze_buffer,
            wake_up_time: tuning.wake_up_time,
            allow_snooze: false,
            allow_resnooze: false,
            timer: None,
            nap_started_at: None,
            naps: 0,
        }
    }

    pub fn state(&self) -> EmployeeState {
        self.state
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    pub fn needed(&self) -> f32 {
        self.needed
    }

    /// Snooze meter fill, 0..=1
    pub fn ratio(&self) -> f32 {
        (self.amount / self.needed).clamp(0.0, 1.0)
    }

    pub fn target_reached(&self) -> bool {
        self.amount >= self.needed
    }

    pub fn can_snooze(&self) -> bool {
        self.allow_snooze && self.state != EmployeeState::Dead
    }

    pub fn can_resnooze(&self) -> bool {
        self.allow_resnooze && self.state == EmployeeState::Snoozing
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn nap_started_at(&self) -> Option<f32> {
        self.nap_started_at
    }

    /// Scaled-clock time the current nap ends
    pub fn wakes_at(&self) -> Option<f32> {
        self.nap_started_at.map(|t| t + self.wake_up_time)
    }

    /// Naps begun this session, restarts included
    pub fn naps(&self) -> u32 {
        self.naps
    }

    /// Let the player start napping (end of countdown)
    pub fn enable(&mut self) {
        if self.state != EmployeeState::Dead {
            self.allow_snooze = true;
        }
    }

    pub fn push_meter<H: MeterSink>(&self, host: &mut H) {
        host.set_meter_progress(Meter::Snooze, self.ratio());
    }

    fn set_state<H: AnimationSink>(&mut self, state: EmployeeState, host: &mut H) {
        self.state = state;
        host.set_animation_state(Actor::Employee, state.animator_value());
    }

    /// Player pressed snooze
    pub fn request_snooze<H: MeterSink + AnimationSink>(
        &mut self,
        sched: &mut Scheduler<SessionTimer>,
        host: &mut H,
    ) -> SnoozeResponse {
        if self.state == EmployeeState::Dead {
            return SnoozeResponse::Ignored;
        }

        if self.allow_snooze {
            self.enter_snoozing(sched, host);
            SnoozeResponse::Started
        } else if self.can_resnooze() {
            if let Some(handle) = self.timer.take() {
                sched.cancel(handle);
            }
            self.enter_snoozing(sched, host);
            SnoozeResponse::Restarted
        } else {
            SnoozeResponse::Ignored
        }
    }

    /// Begin a nap: +1 quantum, arm the re-snooze buffer
    pub fn enter_snoozing<H: MeterSink + AnimationSink>(
        &mut self,
        sched: &mut Scheduler<SessionTimer>,
        host: &mut H,
    ) {
        if self.state == EmployeeState::Dead {
            return;
        }
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }

        self.allow_snooze = false;
        self.allow_resnooze = false;
        self.set_state(EmployeeState::Snoozing, host);

        self.amount = (self.amount + SNOOZE_QUANTUM).clamp(0.0, self.needed);
        self.push_meter(host);

        self.naps += 1;
        self.nap_started_at = Some(sched.scaled_now());
        self.timer = Some(sched.schedule_after(
            TimerClass::Scaled,
            self.resnooze_buffer,
            SessionTimer::Snooze(SnoozeTimer::BufferElapsed),
        ));
        log::debug!(
            "nap #{} started at {:.2}s, snooze {:.0}/{:.0}",
            self.naps,
            sched.scaled_now(),
            self.amount,
            self.needed
        );
    }

    /// A nap continuation came due
    pub fn on_timer<H: MeterSink + AnimationSink>(
        &mut self,
        handle: TimerHandle,
        step: SnoozeTimer,
        sched: &mut Scheduler<SessionTimer>,
        host: &mut H,
    ) {
        if self.timer != Some(handle) {
            log::warn!("ignoring stale snooze timer {:?} ({:?})", handle, step);
            return;
        }
        self.timer = None;

        match step {
            SnoozeTimer::BufferElapsed => {
                self.allow_resnooze = true;
                let until_wake = (self.wake_up_time - self.resnooze_buffer).max(0.0);
                self.timer = Some(sched.schedule_after(
                    TimerClass::Scaled,
                    until_wake,
                    SessionTimer::Snooze(SnoozeTimer::WakeUp),
                ));
            }
            SnoozeTimer::WakeUp => {
                self.allow_snooze = true;
                self.allow_resnooze = false;
                self.nap_started_at = None;
                self.set_state(EmployeeState::Working, host);
                log::debug!("employee woke up at {:.2}s", sched.scaled_now());
            }
        }
    }

    /// Snooze drains while working
    pub fn tick_working<H: MeterSink>(&mut self, dt: f32, host: &mut H) {
        if self.state != EmployeeState::Working || self.target_reached() {
            return;
        }
        let reduced = (self.amount - dt * self.reduce_speed).clamp(0.0, self.needed);
        if reduced != self.amount {
            self.amount = reduced;
            self.push_meter(host);
        }
    }

    /// Cancel any pending nap continuation, leaving the state as is
    pub fn halt(&mut self, sched: &mut Scheduler<SessionTimer>) {
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
        self.allow_snooze = false;
        self.allow_resnooze = false;
    }

    /// Collapse from fatigue; nothing works afterwards
    pub fn kill<H: AnimationSink>(&mut self, sched: &mut Scheduler<SessionTimer>, host: &mut H) {
        if self.state == EmployeeState::Dead {
            return;
        }
        self.halt(sched);
        self.nap_started_at = None;
        self.set_state(EmployeeState::Dead, host);
    }
}
