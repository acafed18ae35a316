//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies (those sit behind `host`)

pub mod boss;
pub mod clock;
pub mod host;
pub mod session;
pub mod snooze;
pub mod state;
pub mod tick;

pub use boss::BossPatrolCycle;
pub use clock::{Scheduler, TimerClass, TimerHandle};
pub use host::{
    Actor, AnimationSink, AudioSink, Host, HostCall, Indicator, IndicatorSink, Meter, MeterSink,
    RecordingHost, SoundClip,
};
pub use session::GameSession;
pub use snooze::{SnoozeCycle, SnoozeResponse};
pub use state::{BossState, EmployeeState, Outcome, SessionPhase, SessionTimer};
pub use tick::{TickInput, tick};
