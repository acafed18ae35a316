//! Per-frame session update
//!
//! Each tick advances both clocks, runs one gameplay frame (if the session is
//! live), then fires every timer that came due.

use super::host::{Host, Meter};
use super::session::GameSession;
use super::snooze::SnoozeResponse;
use super::state::{BossState, SessionPhase};
use crate::consts::KNOCK_SECS;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Snooze button went down this tick
    pub snooze: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - autopilot presses snooze
    pub idle_mode: bool,
}

/// Autopilot won't start a nap that could still be running when the boss walks in
const AUTOPILOT_MARGIN_SECS: f32 = 0.1;

/// Advance the session by `dt` seconds of real time
pub fn tick<H: Host>(session: &mut GameSession<H>, input: &TickInput, dt: f32) {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    // Handle pause toggle
    if input.pause {
        toggle_pause(session);
    }

    session.sched.advance(dt);

    if session.phase == SessionPhase::Running && !session.paused {
        let scaled_dt = dt * session.sched.time_scale();
        let pressed = input.snooze || (input.idle_mode && autopilot_wants_snooze(session));
        play_frame(session, scaled_dt, pressed);
    }

    session.run_due_timers();
}

/// Pause or resume gameplay. Only meaningful while running.
fn toggle_pause<H: Host>(session: &mut GameSession<H>) {
    if session.phase != SessionPhase::Running {
        return;
    }
    session.paused = !session.paused;
    session
        .sched
        .set_time_scale(if session.paused { 0.0 } else { 1.0 });
    log::info!("{}", if session.paused { "paused" } else { "resumed" });
}

fn play_frame<H: Host>(session: &mut GameSession<H>, dt: f32, snooze_pressed: bool) {
    let game_over_time = session.tuning.game_over_time;
    session.game_time = (session.game_time + dt).clamp(0.0, game_over_time);
    session
        .host
        .set_meter_progress(Meter::Time, session.game_time / game_over_time);

    if session.check_endings() {
        return;
    }

    // Boss gets suspicious once the employee has slept enough
    if session.patrol_armed && session.snooze.amount() > session.tuning.patrol_threshold() {
        session.patrol_armed = false;
        session.patrol_started = true;
        session.boss.start_cycle(&mut session.sched, &mut session.rng);
        log::info!(
            "boss starts patrolling at {:.2}s (snooze {:.1})",
            session.game_time,
            session.snooze.amount()
        );
    }

    if snooze_pressed {
        let response = session
            .snooze
            .request_snooze(&mut session.sched, &mut session.host);
        if response == SnoozeResponse::Ignored {
            log::trace!("snooze press ignored at {:.2}s", session.game_time);
        }
    }

    // Only drains while working
    session.snooze.tick_working(dt, &mut session.host);
}

/// Nap only while the boss is far enough away to finish it
fn autopilot_wants_snooze<H: Host>(session: &GameSession<H>) -> bool {
    if !(session.snooze.can_snooze() || session.snooze.can_resnooze()) {
        return false;
    }
    if !session.patrol_started {
        return true;
    }
    if session.boss.state() != BossState::Roaming {
        return false;
    }
    let until_knock = session.boss.time_to_next(&session.sched).unwrap_or(0.0);
    until_knock + KNOCK_SECS > session.tuning.wake_up_time + AUTOPILOT_MARGIN_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::host::{Actor, Indicator, RecordingHost, SoundClip};
    use crate::sim::state::{EmployeeState, Outcome};
    use crate::tuning::{DelayRange, Tuning};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn press() -> TickInput {
        TickInput {
            snooze: true,
            ..Default::default()
        }
    }

    fn session(tuning: Tuning) -> GameSession<RecordingHost> {
        GameSession::new(tuning, 12345, RecordingHost::new())
    }

    /// Tick through the countdown until gameplay is live
    fn start(session: &mut GameSession<RecordingHost>) {
        for _ in 0..400 {
            if session.is_running() {
                return;
            }
            tick(session, &idle(), DT);
        }
        panic!("countdown never finished");
    }

    fn run_for(session: &mut GameSession<RecordingHost>, input: &TickInput, secs: f32) {
        let steps = (secs / DT).round() as u32;
        for _ in 0..steps {
            tick(session, input, DT);
        }
    }

    fn run_until_stopped(session: &mut GameSession<RecordingHost>, input: &TickInput) {
        for _ in 0..100_000 {
            if session.is_stopped() {
                return;
            }
            tick(session, input, DT);
        }
        panic!("session never ended");
    }

    /// One nap starts the patrol, then stay awake until the boss walks in
    fn boss_in_room_while_awake(tuning: Tuning) -> GameSession<RecordingHost> {
        let mut session = session(Tuning {
            patrol_percentage: 0.0,
            check_delay: DelayRange::fixed(2.0),
            leave_delay: DelayRange::fixed(5.0),
            ..tuning
        });
        start(&mut session);

        tick(&mut session, &press(), DT);
        for _ in 0..1000 {
            if session.boss_state() == BossState::InRoom {
                break;
            }
            tick(&mut session, &idle(), DT);
        }
        assert_eq!(session.boss_state(), BossState::InRoom);
        assert_eq!(session.employee_state(), EmployeeState::Working);
        session
    }

    #[test]
    fn test_countdown() {
        let mut session = session(Tuning::default());
        assert_eq!(session.phase(), SessionPhase::CountingDown);
        assert_eq!(session.host().indicator(Indicator::Countdown), Some(true));

        // Presses during the countdown do nothing
        run_for(&mut session, &press(), 2.9);
        assert_eq!(session.phase(), SessionPhase::CountingDown);
        assert_eq!(session.employee_state(), EmployeeState::Working);
        assert_eq!(session.game_time(), 0.0);

        run_for(&mut session, &idle(), 0.2);
        assert!(session.is_running());
        assert!(session.snooze().can_snooze());
        assert_eq!(session.host().indicator(Indicator::Countdown), Some(true));

        run_for(&mut session, &idle(), 1.0);
        assert_eq!(session.host().indicator(Indicator::Countdown), Some(false));
        assert!(session.game_time() > 0.0);
    }

    #[test]
    fn test_fatigue_when_never_snoozing() {
        let mut session = session(Tuning::default());
        start(&mut session);
        run_until_stopped(&mut session, &idle());

        assert_eq!(session.outcome(), Some(Outcome::Fatigue));
        assert_eq!(session.game_time(), session.tuning().game_over_time);
        assert_eq!(session.snooze_amount(), 0.0);
        assert_eq!(session.employee_state(), EmployeeState::Dead);
        assert!(!session.patrol_started());
        assert_eq!(session.host().sound_count(SoundClip::Die), 1);
        assert_eq!(session.host().meter(Meter::Time), Some(1.0));

        assert!(!session.host().ever_shown(Indicator::FatiguePanel));
        run_for(&mut session, &idle(), 2.1);
        assert_eq!(session.host().indicator(Indicator::FatiguePanel), Some(true));
        assert_eq!(session.employee_state(), EmployeeState::Dead);
    }

    #[test]
    fn test_win_by_resnoozing() {
        let tuning = Tuning {
            snooze_needed: 20.0,
            patrol_percentage: 0.5,
            ..Default::default()
        };
        let mut session = session(tuning);
        start(&mut session);
        run_until_stopped(&mut session, &press());

        assert_eq!(session.outcome(), Some(Outcome::Win));
        assert_eq!(session.snooze_amount(), 20.0);
        assert!(session.patrol_started());
        assert_ne!(session.boss_state(), BossState::InRoom);
        assert_eq!(session.host().sound_count(SoundClip::Win), 1);

        run_for(&mut session, &idle(), 0.6);
        assert_eq!(session.host().indicator(Indicator::WinPanel), Some(true));
        assert_eq!(session.host().indicator(Indicator::GameOverPanel), Some(false));
        assert_eq!(session.host().indicator(Indicator::FatiguePanel), Some(false));
    }

    #[test]
    fn test_fired_when_snoozing_as_boss_enters() {
        let mut session = boss_in_room_while_awake(Tuning::default());

        tick(&mut session, &press(), DT);
        assert_eq!(session.employee_state(), EmployeeState::Snoozing);
        tick(&mut session, &idle(), DT);
        assert_eq!(session.outcome(), Some(Outcome::Fired));
        assert_eq!(session.boss_state(), BossState::FiredYou);

        // Reveal comes a second later, the panel two after that
        run_for(&mut session, &idle(), 1.1);
        assert_eq!(session.host().animation(Actor::Boss), Some(3));
        assert_eq!(session.host().sound_count(SoundClip::Lose), 1);
        assert!(!session.host().ever_shown(Indicator::GameOverPanel));
        run_for(&mut session, &idle(), 2.0);
        assert_eq!(session.host().indicator(Indicator::GameOverPanel), Some(true));

        // The boss never leaves
        run_for(&mut session, &press(), 20.0);
        assert_eq!(session.boss_state(), BossState::FiredYou);
        assert_eq!(session.outcome(), Some(Outcome::Fired));
    }

    #[test]
    fn test_one_long_tick_still_catches_the_nap() {
        let tuning = Tuning {
            wake_up_time: 10.0,
            patrol_percentage: 0.0,
            check_delay: DelayRange::fixed(2.0),
            leave_delay: DelayRange::fixed(3.0),
            ..Default::default()
        };
        // Knock, entry and leave all fall inside 8s; splitting it up must not matter
        let play = |steps: u32| {
            let mut session = session(tuning.clone());
            start(&mut session);
            tick(&mut session, &press(), DT);
            tick(&mut session, &idle(), DT);
            assert!(session.patrol_started());
            for _ in 0..steps {
                tick(&mut session, &idle(), 8.0 / steps as f32);
            }
            (
                session.outcome(),
                session.boss_state(),
                session.employee_state(),
                session.boss().cycles(),
            )
        };
        let caught = (
            Some(Outcome::Fired),
            BossState::FiredYou,
            EmployeeState::Snoozing,
            1,
        );
        assert_eq!(play(480), caught);
        assert_eq!(play(1), caught);
    }

    #[test]
    fn test_fatigue_beats_fired_on_same_frame() {
        let mut session = boss_in_room_while_awake(Tuning::default());
        tick(&mut session, &press(), DT);
        assert_eq!(session.employee_state(), EmployeeState::Snoozing);

        // Caught napping and out of time on the same frame
        tick(&mut session, &idle(), 1000.0);
        assert_eq!(session.outcome(), Some(Outcome::Fatigue));
        assert_eq!(session.game_time(), session.tuning().game_over_time);
        assert_eq!(session.boss_state(), BossState::InRoom);
        assert_eq!(session.employee_state(), EmployeeState::Dead);

        run_for(&mut session, &idle(), 4.0);
        assert_eq!(session.boss_state(), BossState::InRoom);
        assert_eq!(session.host().sound_count(SoundClip::Lose), 0);
        assert!(!session.host().ever_shown(Indicator::GameOverPanel));
        assert_eq!(session.host().indicator(Indicator::FatiguePanel), Some(true));
    }

    #[test]
    fn test_win_beats_fired_on_same_frame() {
        let mut session = boss_in_room_while_awake(Tuning {
            snooze_needed: 2.0,
            snooze_reduce_speed: 0.0,
            ..Default::default()
        });
        assert_eq!(session.snooze_amount(), 1.0);

        // The nap that reaches the target starts with the boss in the room
        tick(&mut session, &press(), DT);
        assert_eq!(session.employee_state(), EmployeeState::Snoozing);
        assert_eq!(session.snooze_amount(), 2.0);

        tick(&mut session, &idle(), DT);
        assert_eq!(session.outcome(), Some(Outcome::Win));
        assert_eq!(session.boss_state(), BossState::InRoom);

        run_for(&mut session, &idle(), 4.0);
        assert_ne!(session.boss_state(), BossState::FiredYou);
        assert_eq!(session.host().animation(Actor::Boss), Some(2));
        assert_eq!(session.host().sound_count(SoundClip::Win), 1);
        assert_eq!(session.host().sound_count(SoundClip::Lose), 0);
        assert_eq!(session.host().indicator(Indicator::WinPanel), Some(true));
    }

    #[test]
    fn test_patrol_latch_fires_once_above_threshold() {
        let tuning = Tuning {
            snooze_needed: 12.0,
            patrol_percentage: 0.25,
            snooze_reduce_speed: 0.0,
            check_delay: DelayRange::fixed(60.0),
            ..Default::default()
        };
        let mut session = session(tuning);
        start(&mut session);

        // Three naps reach the threshold exactly, which is not enough
        for _ in 0..3 {
            tick(&mut session, &press(), DT);
            run_for(&mut session, &idle(), 3.2);
        }
        assert_eq!(session.snooze_amount(), 3.0);
        tick(&mut session, &idle(), DT);
        assert!(!session.patrol_started());

        tick(&mut session, &press(), DT);
        tick(&mut session, &idle(), DT);
        assert!(session.patrol_started());
        assert_eq!(session.boss().cycles(), 1);

        for _ in 0..5 {
            tick(&mut session, &press(), DT);
            run_for(&mut session, &idle(), 3.2);
        }
        assert_eq!(session.boss().cycles(), 1);
    }

    #[test]
    fn test_greetings_follow_leave_delay() {
        for (leave, greets) in [(7.0, true), (3.0, false)] {
            let tuning = Tuning {
                patrol_percentage: 0.0,
                check_delay: DelayRange::fixed(2.0),
                leave_delay: DelayRange::fixed(leave),
                ..Default::default()
            };
            let mut session = session(tuning);
            start(&mut session);
            tick(&mut session, &press(), DT);
            run_for(&mut session, &idle(), 1.0 + 3.0 + leave + 0.5);

            assert_eq!(session.boss().cycles(), 2);
            assert!(session.host().sound_count(SoundClip::DoorClose) >= 1);
            for indicator in Indicator::GREETINGS {
                assert_eq!(session.host().ever_shown(indicator), greets);
                if greets {
                    assert_eq!(session.host().indicator(indicator), Some(false));
                }
            }
        }
    }

    #[test]
    fn test_win_beats_fatigue_on_same_tick() {
        let tuning = Tuning {
            snooze_needed: 1.0,
            ..Default::default()
        };
        let mut session = session(tuning);
        start(&mut session);
        tick(&mut session, &press(), DT);
        assert_eq!(session.snooze_amount(), 1.0);

        tick(&mut session, &idle(), 1000.0);
        assert_eq!(session.outcome(), Some(Outcome::Win));
        assert_eq!(session.game_time(), session.tuning().game_over_time);
        assert_ne!(session.employee_state(), EmployeeState::Dead);
    }

    #[test]
    fn test_pause_freezes_gameplay() {
        let mut session = session(Tuning::default());
        start(&mut session);
        tick(&mut session, &press(), DT);
        let time = session.game_time();

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut session, &pause, DT);
        assert!(session.is_paused());
        run_for(&mut session, &press(), 10.0);
        assert_eq!(session.game_time(), time);
        assert_eq!(session.employee_state(), EmployeeState::Snoozing);
        assert_eq!(session.snooze_amount(), 1.0);

        tick(&mut session, &pause, DT);
        assert!(!session.is_paused());
        run_for(&mut session, &idle(), 3.5);
        assert_eq!(session.employee_state(), EmployeeState::Working);
    }

    #[test]
    fn test_stopped_session_is_idempotent() {
        let tuning = Tuning {
            game_over_time: 5.0,
            ..Default::default()
        };
        let mut session = session(tuning);
        start(&mut session);
        run_until_stopped(&mut session, &idle());
        run_for(&mut session, &idle(), 3.0);

        let calls = session.host().calls.len();
        let time = session.game_time();
        run_for(&mut session, &press(), 10.0);
        tick(&mut session, &idle(), f32::NAN);
        tick(&mut session, &idle(), -1.0);

        assert_eq!(session.host().calls.len(), calls);
        assert_eq!(session.game_time(), time);
        assert_eq!(session.outcome(), Some(Outcome::Fatigue));
    }

    #[test]
    fn test_restart_resets_everything() {
        let tuning = Tuning {
            game_over_time: 5.0,
            ..Default::default()
        };
        let mut session = session(tuning);
        start(&mut session);
        run_until_stopped(&mut session, &press());

        session.restart(99);
        assert_eq!(session.phase(), SessionPhase::CountingDown);
        assert_eq!(session.seed(), 99);
        assert_eq!(session.game_time(), 0.0);
        assert_eq!(session.snooze_amount(), 0.0);
        assert_eq!(session.employee_state(), EmployeeState::Working);
        assert_eq!(session.boss_state(), BossState::Roaming);
        assert!(!session.patrol_started());
        assert_eq!(session.scheduler().pending_count(), 1);
        assert_eq!(session.host().indicator(Indicator::FatiguePanel), Some(false));
        assert_eq!(session.host().indicator(Indicator::Countdown), Some(true));
    }

    #[test]
    fn test_determinism() {
        // Same seed and inputs give the same host call log
        let play = || {
            let mut session = session(Tuning::default());
            let input = TickInput {
                idle_mode: true,
                ..Default::default()
            };
            run_for(&mut session, &input, 40.0);
            session.into_host().calls
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_autopilot_survives_patrols() {
        let tuning = Tuning {
            snooze_needed: 300.0,
            game_over_time: 90.0,
            ..Default::default()
        };
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for seed in [1, 2, 3] {
            let mut session = GameSession::new(tuning.clone(), seed, RecordingHost::new());
            run_until_stopped(&mut session, &input);
            assert_ne!(session.outcome(), Some(Outcome::Fired), "seed {}", seed);
            assert!(session.boss().cycles() >= 1);
        }
    }

    #[test]
    fn test_try_new_rejects_bad_tuning() {
        let tuning = Tuning {
            game_over_time: -1.0,
            ..Default::default()
        };
        assert!(GameSession::try_new(tuning, 1, RecordingHost::new()).is_err());
    }

    fn small_tuning() -> Tuning {
        Tuning {
            game_over_time: 20.0,
            snooze_needed: 15.0,
            patrol_percentage: 0.1,
            check_delay: DelayRange::new(1.0, 3.0),
            leave_delay: DelayRange::new(2.0, 8.0),
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn prop_state_stays_in_range(
            seed in any::<u64>(),
            steps in prop::collection::vec((0.0f32..0.5, any::<bool>(), prop::bool::weighted(0.02)), 1..600),
        ) {
            let tuning = small_tuning();
            let mut session = GameSession::new(tuning.clone(), seed, RecordingHost::new());
            let mut ended: Option<(Outcome, f32, f32)> = None;

            for (dt, snooze, pause) in steps {
                tick(&mut session, &TickInput { snooze, pause, idle_mode: false }, dt);

                prop_assert!(session.snooze_amount() >= 0.0);
                prop_assert!(session.snooze_amount() <= tuning.snooze_needed);
                prop_assert!(session.game_time() >= 0.0);
                prop_assert!(session.game_time() <= tuning.game_over_time);

                match (ended, session.outcome()) {
                    (None, Some(outcome)) => {
                        ended = Some((outcome, session.game_time(), session.snooze_amount()));
                    }
                    (Some((outcome, time, amount)), now) => {
                        prop_assert_eq!(now, Some(outcome));
                        prop_assert_eq!(session.game_time(), time);
                        prop_assert_eq!(session.snooze_amount(), amount);
                    }
                    (None, None) => {}
                }
            }
        }

        #[test]
        fn prop_outcome_matches_final_state(seed in any::<u64>(), press_every in 1usize..40) {
            let tuning = small_tuning();
            let mut session = GameSession::new(tuning.clone(), seed, RecordingHost::new());
            for i in 0..20_000 {
                if session.is_stopped() {
                    break;
                }
                let input = TickInput { snooze: i % press_every == 0, ..Default::default() };
                tick(&mut session, &input, DT);
            }
            match session.outcome() {
                Some(Outcome::Win) => prop_assert!(session.snooze_amount() >= tuning.snooze_needed),
                Some(Outcome::Fatigue) => {
                    prop_assert_eq!(session.employee_state(), EmployeeState::Dead);
                    prop_assert_eq!(session.game_time(), tuning.game_over_time);
                }
                Some(Outcome::Fired) => {
                    prop_assert_eq!(session.boss_state(), BossState::FiredYou);
                    prop_assert_eq!(session.employee_state(), EmployeeState::Snoozing);
                }
                None => prop_assert!(false, "session never ended"),
            }
        }
    }
}
