//! Game session orchestrator
//!
//! Owns the scheduler, RNG, both actor cycles and the injected host. The
//! per-frame logic lives in `tick.rs`; this file covers setup, restart, the
//! endings and timer dispatch.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::boss::BossPatrolCycle;
use super::clock::{Scheduler, TimerClass, TimerHandle};
use super::host::{Actor, Host, Indicator, Meter, SoundClip};
use super::snooze::SnoozeCycle;
use super::state::{
    BossState, EmployeeState, Outcome, SequenceStep, SessionPhase, SessionTimer,
};
use crate::consts::*;
use crate::tuning::{Tuning, TuningError};

/// One play session, from countdown to ending
#[derive(Debug)]
pub struct GameSession<H: Host> {
    pub(super) tuning: Tuning,
    pub(super) seed: u64,
    pub(super) rng: Pcg32,
    pub(super) sched: Scheduler<SessionTimer>,
    pub(super) host: H,
    pub(super) phase: SessionPhase,
    pub(super) paused: bool,
    /// Gameplay seconds, clamped to `game_over_time`
    pub(super) game_time: f32,
    pub(super) snooze: SnoozeCycle,
    pub(super) boss: BossPatrolCycle,
    /// Patrol starts the first time snooze crosses the threshold
    pub(super) patrol_armed: bool,
    pub(super) patrol_started: bool,
}

impl<H: Host> GameSession<H> {
    /// Start a session (the countdown begins immediately)
    pub fn new(tuning: Tuning, seed: u64, host: H) -> Self {
        let mut session = Self {
            rng: Pcg32::seed_from_u64(seed),
            sched: Scheduler::new(),
            host,
            phase: SessionPhase::CountingDown,
            paused: false,
            game_time: 0.0,
            snooze: SnoozeCycle::new(&tuning),
            boss: BossPatrolCycle::new(&tuning),
            patrol_armed: false,
            patrol_started: false,
            seed,
            tuning,
        };
        session.begin();
        session
    }

    /// Validate `tuning` first
    pub fn try_new(tuning: Tuning, seed: u64, host: H) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::new(tuning, seed, host))
    }

    /// Throw everything away and start over with a new seed. Only the host survives.
    pub fn restart(&mut self, seed: u64) {
        log::info!("restarting session (seed {})", seed);
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.sched = Scheduler::new();
        self.phase = SessionPhase::CountingDown;
        self.paused = false;
        self.game_time = 0.0;
        self.snooze = SnoozeCycle::new(&self.tuning);
        self.boss = BossPatrolCycle::new(&self.tuning);
        self.patrol_armed = false;
        self.patrol_started = false;
        self.begin();
    }

    fn begin(&mut self) {
        for indicator in [
            Indicator::Warning,
            Indicator::BossGreeting,
            Indicator::EmployeeGreeting,
            Indicator::CoworkerGreeting,
            Indicator::FatiguePanel,
            Indicator::GameOverPanel,
            Indicator::WinPanel,
        ] {
            self.host.set_indicator_visible(indicator, false);
        }
        self.host.set_animation_state(
            Actor::Boss,
            BossState::Roaming.animator_value(),
        );
        self.host.set_animation_state(
            Actor::Employee,
            EmployeeState::Working.animator_value(),
        );
        self.snooze.push_meter(&mut self.host);
        self.host.set_meter_progress(Meter::Time, 0.0);

        // Countdown runs on real time with gameplay frozen
        self.host.set_indicator_visible(Indicator::Countdown, true);
        self.sched.set_time_scale(0.0);
        self.sched.schedule_after(
            TimerClass::Realtime,
            COUNTDOWN_SECS,
            SessionTimer::Sequence(SequenceStep::CountdownFinished),
        );
        log::info!("session started (seed {})", self.seed);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            SessionPhase::Stopped(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, SessionPhase::Stopped(_))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    pub fn snooze_amount(&self) -> f32 {
        self.snooze.amount()
    }

    pub fn employee_state(&self) -> EmployeeState {
        self.snooze.state()
    }

    pub fn boss_state(&self) -> BossState {
        self.boss.state()
    }

    /// Whether the patrol latch has fired
    pub fn patrol_started(&self) -> bool {
        self.patrol_started
    }

    pub fn snooze(&self) -> &SnoozeCycle {
        &self.snooze
    }

    pub fn boss(&self) -> &BossPatrolCycle {
        &self.boss
    }

    pub fn scheduler(&self) -> &Scheduler<SessionTimer> {
        &self.sched
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Latch the session into its ending. Only the first call has any effect.
    pub(super) fn stop(&mut self, outcome: Outcome) {
        if let SessionPhase::Stopped(previous) = self.phase {
            log::warn!("ignoring {:?}, session already ended with {:?}", outcome, previous);
            return;
        }
        self.phase = SessionPhase::Stopped(outcome);
        self.paused = false;
        log::info!(
            "session over: {:?} at {:.2}s (snooze {:.1}/{:.0})",
            outcome,
            self.game_time,
            self.snooze.amount(),
            self.snooze.needed()
        );

        self.snooze.halt(&mut self.sched);
        match outcome {
            Outcome::Win => {
                self.boss.halt(&mut self.sched);
                self.freeze();
                self.host
                    .play_sound(SoundClip::Win, self.tuning.employee_position);
                self.sequence_after(WIN_PANEL_SECS, SequenceStep::ShowWinPanel);
            }
            Outcome::Fatigue => {
                self.boss.halt(&mut self.sched);
                self.boss.hide_greetings(&mut self.host);
                self.freeze();
                self.snooze.kill(&mut self.sched, &mut self.host);
                self.host
                    .play_sound(SoundClip::Die, self.tuning.employee_position);
                self.sequence_after(FATIGUE_PANEL_SECS, SequenceStep::ShowFatiguePanel);
            }
            Outcome::Fired => {
                self.boss.fire(&mut self.sched, &mut self.host);
                self.freeze();
                self.sequence_after(FIRED_REVEAL_SECS, SequenceStep::FiredReveal);
            }
        }
    }

    /// Pause gameplay for good and cut the ambience
    fn freeze(&mut self) {
        self.sched.set_time_scale(0.0);
        self.host.stop_ambient_audio();
    }

    fn sequence_after(&mut self, secs: f32, step: SequenceStep) {
        self.sched
            .schedule_after(TimerClass::Realtime, secs, SessionTimer::Sequence(step));
    }

    /// Check the endings in priority order: win, fatigue, caught napping.
    /// Returns true if the session just stopped.
    pub(super) fn check_endings(&mut self) -> bool {
        let outcome = if self.snooze.target_reached() {
            Some(Outcome::Win)
        } else if self.game_time >= self.tuning.game_over_time {
            Some(Outcome::Fatigue)
        } else if self.snooze.state() == EmployeeState::Snoozing
            && self.boss.state() == BossState::InRoom
        {
            Some(Outcome::Fired)
        } else {
            None
        };
        match outcome {
            Some(outcome) => {
                self.stop(outcome);
                true
            }
            None => false,
        }
    }

    /// Fire everything that came due this tick
    pub(super) fn run_due_timers(&mut self) {
        while let Some((handle, timer)) = self.sched.pop_due() {
            let gameplay = !matches!(timer, SessionTimer::Sequence(_));
            self.dispatch(handle, timer);
            // Every actor transition gets checked before the next timer fires,
            // however many of them one tick covers
            if gameplay && self.is_running() {
                self.check_endings();
            }
        }
    }

    fn dispatch(&mut self, handle: TimerHandle, timer: SessionTimer) {
        match timer {
            SessionTimer::Snooze(step) => {
                if !self.is_stopped() {
                    self.snooze
                        .on_timer(handle, step, &mut self.sched, &mut self.host);
                }
            }
            SessionTimer::Boss(step) => {
                if !self.is_stopped() {
                    self.boss.on_timer(
                        handle,
                        step,
                        &mut self.sched,
                        &mut self.rng,
                        &mut self.host,
                    );
                }
            }
            SessionTimer::Sequence(step) => self.run_sequence(step),
        }
    }

    fn run_sequence(&mut self, step: SequenceStep) {
        match step {
            SequenceStep::CountdownFinished => {
                if self.phase != SessionPhase::CountingDown {
                    return;
                }
                self.phase = SessionPhase::Running;
                self.sched.set_time_scale(1.0);
                self.snooze.enable();
                self.patrol_armed = true;
                self.boss.arm_first_check();
                self.sequence_after(COUNTDOWN_LINGER_SECS, SequenceStep::HideCountdown);
                log::info!("countdown finished, go!");
            }
            SequenceStep::HideCountdown => {
                self.host.set_indicator_visible(Indicator::Countdown, false);
            }
            SequenceStep::ShowWinPanel => {
                self.host
                    .set_indicator_visible(Indicator::GameOverPanel, false);
                self.host.set_indicator_visible(Indicator::FatiguePanel, false);
                self.host.set_indicator_visible(Indicator::WinPanel, true);
            }
            SequenceStep::ShowFatiguePanel => {
                self.host.set_indicator_visible(Indicator::FatiguePanel, true);
            }
            SequenceStep::FiredReveal => {
                self.boss.reveal_fired(&mut self.host);
                self.host
                    .play_sound(SoundClip::Lose, self.tuning.employee_position);
                self.sequence_after(GAME_OVER_PANEL_SECS, SequenceStep::ShowGameOverPanel);
            }
            SequenceStep::ShowGameOverPanel => {
                self.host
                    .set_indicator_visible(Indicator::GameOverPanel, true);
            }
        }
    }
}
