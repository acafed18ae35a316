//! Session state types
//!
//! Actor states, session phase, and the continuations the scheduler carries.

use serde::{Deserialize, Serialize};

/// What the employee is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmployeeState {
    #[default]
    Working,
    Snoozing,
    /// Collapsed from fatigue; absorbing
    Dead,
}

impl EmployeeState {
    /// Integer the employee animator expects
    pub fn animator_value(self) -> i32 {
        match self {
            EmployeeState::Working => 0,
            EmployeeState::Snoozing => 1,
            EmployeeState::Dead => 2,
        }
    }
}

/// Where the boss is in the patrol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BossState {
    #[default]
    Roaming,
    Knocking,
    InRoom,
    /// Caught the employee napping; never left
    FiredYou,
}

impl BossState {
    /// Integer the boss animator expects
    pub fn animator_value(self) -> i32 {
        match self {
            BossState::Roaming => 0,
            BossState::Knocking => 1,
            BossState::InRoom => 2,
            BossState::FiredYou => 3,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Snooze target reached
    Win,
    /// Boss walked in on a nap
    Fired,
    /// Ran out of time
    Fatigue,
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Real-time countdown, gameplay frozen
    CountingDown,
    /// Active gameplay
    Running,
    /// Terminal
    Stopped(Outcome),
}

/// Snooze cycle continuations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeTimer {
    /// Re-snooze becomes legal
    BufferElapsed,
    /// Nap is over
    WakeUp,
}

/// Boss patrol continuations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossTimer {
    Knock,
    EnterRoom,
    BossGreeting,
    ReplyGreeting,
    Leave,
}

/// Countdown and end-of-game presentation steps (all real-time)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    CountdownFinished,
    HideCountdown,
    ShowWinPanel,
    ShowFatiguePanel,
    FiredReveal,
    ShowGameOverPanel,
}

/// Everything the session scheduler can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    Snooze(SnoozeTimer),
    Boss(BossTimer),
    Sequence(SequenceStep),
}
