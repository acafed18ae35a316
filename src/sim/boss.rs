//! Boss patrol cycle
//!
//! Roaming -> Knocking -> InRoom -> Roaming -> ... forever, until the session
//! forces `FiredYou` or halts the patrol. Each cycle draws a fresh check delay
//! and leave delay; long stays come with a greeting exchange.

use glam::Vec2;
use rand::Rng;

use super::clock::{Scheduler, TimerClass, TimerHandle};
use super::host::{Actor, AnimationSink, AudioSink, Indicator, IndicatorSink, SoundClip};
use super::state::{BossState, BossTimer, SessionTimer};
use crate::consts::*;
use crate::tuning::{DelayRange, Tuning};

/// Boss roam/knock/in-room/leave state machine
#[derive(Debug, Clone)]
pub struct BossPatrolCycle {
    state: BossState,
    check_delay: DelayRange,
    leave_delay: DelayRange,
    position: Vec2,
    /// Halve the next check delay (first patrol of the session)
    first_check: bool,
    /// The single live patrol continuation
    pending: Option<TimerHandle>,
    /// Leave delay left to wait once greetings are done
    leave_remaining: f32,
    /// Delays drawn for the current cycle
    drawn: Option<(f32, f32)>,
    cycles: u32,
}

impl BossPatrolCycle {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            state: BossState::Roaming,
            check_delay: tuning.check_delay,
            leave_delay: tuning.leave_delay,
            position: tuning.boss_position,
            first_check: false,
            pending: None,
            leave_remaining: 0.0,
            drawn: None,
            cycles: 0,
        }
    }

    pub fn state(&self) -> BossState {
        self.state
    }

    /// Patrol has a continuation scheduled
    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// `(check_delay, leave_delay)` drawn for the current cycle
    pub fn drawn_delays(&self) -> Option<(f32, f32)> {
        self.drawn
    }

    /// Patrol cycles begun this session
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Seconds until the next patrol transition
    pub fn time_to_next(&self, sched: &Scheduler<SessionTimer>) -> Option<f32> {
        self.pending.and_then(|handle| sched.remaining(handle))
    }

    pub fn arm_first_check(&mut self) {
        self.first_check = true;
    }

    fn set_state<H: AnimationSink>(&mut self, state: BossState, host: &mut H) {
        self.state = state;
        host.set_animation_state(Actor::Boss, state.animator_value());
    }

    fn schedule(&mut self, sched: &mut Scheduler<SessionTimer>, delay: f32, step: BossTimer) {
        self.pending = Some(sched.schedule_after(
            TimerClass::Scaled,
            delay,
            SessionTimer::Boss(step),
        ));
    }

    /// Draw this cycle's delays and wait to knock
    pub fn start_cycle<R: Rng + ?Sized>(&mut self, sched: &mut Scheduler<SessionTimer>, rng: &mut R) {
        if self.state == BossState::FiredYou {
            return;
        }
        if let Some(handle) = self.pending.take() {
            sched.cancel(handle);
        }

        let mut check = self.check_delay.sample(rng);
        let leave = self.leave_delay.sample(rng);
        if self.first_check {
            self.first_check = false;
            check *= 0.5;
        }

        self.cycles += 1;
        self.drawn = Some((check, leave));
        self.leave_remaining = leave;
        self.schedule(sched, check, BossTimer::Knock);
        log::debug!(
            "patrol #{}: knock in {:.2}s, stay {:.2}s",
            self.cycles,
            check,
            leave
        );
    }

    /// A patrol continuation came due
    pub fn on_timer<R, H>(
        &mut self,
        handle: TimerHandle,
        step: BossTimer,
        sched: &mut Scheduler<SessionTimer>,
        rng: &mut R,
        host: &mut H,
    ) where
        R: Rng + ?Sized,
        H: AnimationSink + AudioSink + IndicatorSink,
    {
        if self.pending != Some(handle) {
            log::warn!("ignoring stale patrol timer {:?} ({:?})", handle, step);
            return;
        }
        self.pending = None;

        match step {
            BossTimer::Knock => {
                self.set_state(BossState::Knocking, host);
                host.play_sound(SoundClip::Knock, self.position);
                host.set_indicator_visible(Indicator::Warning, true);
                self.schedule(sched, KNOCK_SECS, BossTimer::EnterRoom);
            }
            BossTimer::EnterRoom => {
                host.play_sound(SoundClip::DoorOpen, self.position);
                self.set_state(BossState::InRoom, host);
                host.set_indicator_visible(Indicator::Warning, false);
                log::debug!("boss entered the room");

                if self.leave_remaining >= GREETING_LEAVE_THRESHOLD {
                    self.schedule(sched, BOSS_GREETING_SECS, BossTimer::BossGreeting);
                } else {
                    self.schedule(sched, self.leave_remaining, BossTimer::Leave);
                }
            }
            BossTimer::BossGreeting => {
                self.leave_remaining -= BOSS_GREETING_SECS;
                host.set_indicator_visible(Indicator::BossGreeting, true);
                self.schedule(sched, REPLY_GREETING_SECS, BossTimer::ReplyGreeting);
            }
            BossTimer::ReplyGreeting => {
                self.leave_remaining -= REPLY_GREETING_SECS;
                host.set_indicator_visible(Indicator::EmployeeGreeting, true);
                host.set_indicator_visible(Indicator::CoworkerGreeting, true);
                self.schedule(sched, self.leave_remaining.max(0.0), BossTimer::Leave);
            }
            BossTimer::Leave => {
                self.hide_greetings(host);
                host.play_sound(SoundClip::DoorClose, self.position);
                self.set_state(BossState::Roaming, host);
                log::debug!("boss left the room");
                self.start_cycle(sched, rng);
            }
        }
    }

    pub fn hide_greetings<H: IndicatorSink>(&self, host: &mut H) {
        for indicator in Indicator::GREETINGS {
            host.set_indicator_visible(indicator, false);
        }
    }

    /// Stop patrolling; no further transitions happen
    pub fn halt(&mut self, sched: &mut Scheduler<SessionTimer>) {
        if let Some(handle) = self.pending.take() {
            sched.cancel(handle);
        }
    }

    /// Caught the employee napping. The animation is pushed later by
    /// [`reveal_fired`](Self::reveal_fired).
    pub fn fire<H: IndicatorSink>(&mut self, sched: &mut Scheduler<SessionTimer>, host: &mut H) {
        self.halt(sched);
        self.hide_greetings(host);
        self.state = BossState::FiredYou;
    }

    pub fn reveal_fired<H: AnimationSink>(&self, host: &mut H) {
        host.set_animation_state(Actor::Boss, self.state.animator_value());
    }
}
