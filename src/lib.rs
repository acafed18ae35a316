//! Snooze Patrol - nap at your desk without getting caught
//!
//! Core modules:
//! - `sim`: Deterministic simulation (scheduler, snooze cycle, boss patrol, session)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use sim::{
    BossState, EmployeeState, GameSession, Host, Outcome, RecordingHost, SessionPhase, TickInput,
    tick,
};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Snooze added each time a nap begins
    pub const SNOOZE_QUANTUM: f32 = 1.0;

    /// Real-time countdown before gameplay starts
    pub const COUNTDOWN_SECS: f32 = 3.0;
    /// Countdown indicator lingers this long after gameplay starts
    pub const COUNTDOWN_LINGER_SECS: f32 = 1.0;

    /// Boss knocks this long before entering
    pub const KNOCK_SECS: f32 = 3.0;
    /// Leave delays at or above this get the greeting exchange
    pub const GREETING_LEAVE_THRESHOLD: f32 = 7.0;
    /// Boss greets after being in the room this long
    pub const BOSS_GREETING_SECS: f32 = 1.0;
    /// Employee and coworker answer this long after the boss greeting
    pub const REPLY_GREETING_SECS: f32 = 2.0;

    /// Win panel appears after this much real time
    pub const WIN_PANEL_SECS: f32 = 0.5;
    /// Fatigue panel appears after this much real time
    pub const FATIGUE_PANEL_SECS: f32 = 2.0;
    /// Lose sound + fired animation after this much real time
    pub const FIRED_REVEAL_SECS: f32 = 1.0;
    /// Game over panel appears this long after the fired reveal
    pub const GAME_OVER_PANEL_SECS: f32 = 2.0;
}
