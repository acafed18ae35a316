//! Output sinks the simulation talks to
//!
//! Rendering, audio playback and UI live outside the crate. The session only
//! sees these narrow traits; a frontend implements all four (or uses
//! [`RecordingHost`]).

use glam::Vec2;

/// Progress bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meter {
    Snooze,
    Time,
}

/// Animated characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Boss,
    Employee,
}

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundClip {
    Knock,
    DoorOpen,
    DoorClose,
    Win,
    Lose,
    Die,
}

/// Toggleable UI elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Countdown,
    Warning,
    BossGreeting,
    EmployeeGreeting,
    CoworkerGreeting,
    WinPanel,
    FatiguePanel,
    GameOverPanel,
}

impl Indicator {
    /// The speech bubbles shown while the boss lingers
    pub const GREETINGS: [Indicator; 3] = [
        Indicator::BossGreeting,
        Indicator::EmployeeGreeting,
        Indicator::CoworkerGreeting,
    ];
}

pub trait MeterSink {
    /// `ratio` is always in [0, 1]
    fn set_meter_progress(&mut self, meter: Meter, ratio: f32);
}

pub trait AnimationSink {
    fn set_animation_state(&mut self, actor: Actor, state: i32);
}

pub trait AudioSink {
    fn play_sound(&mut self, clip: SoundClip, position: Vec2);
    fn stop_ambient_audio(&mut self);
}

pub trait IndicatorSink {
    fn set_indicator_visible(&mut self, indicator: Indicator, visible: bool);
}

/// Everything a session needs from its frontend
pub trait Host: MeterSink + AnimationSink + AudioSink + IndicatorSink {}

impl<T: MeterSink + AnimationSink + AudioSink + IndicatorSink> Host for T {}

/// A single call made on a host
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Meter(Meter, f32),
    Animation(Actor, i32),
    Sound(SoundClip, Vec2),
    StopAmbient,
    Indicator(Indicator, bool),
}

/// Host that records every call, for tests and replays
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Last visibility set for `indicator`, if it was ever touched
    pub fn indicator(&self, indicator: Indicator) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            HostCall::Indicator(i, visible) if *i == indicator => Some(*visible),
            _ => None,
        })
    }

    /// Last value pushed to `meter`
    pub fn meter(&self, meter: Meter) -> Option<f32> {
        self.calls.iter().rev().find_map(|c| match c {
            HostCall::Meter(m, ratio) if *m == meter => Some(*ratio),
            _ => None,
        })
    }

    /// Last animation state pushed for `actor`
    pub fn animation(&self, actor: Actor) -> Option<i32> {
        self.calls.iter().rev().find_map(|c| match c {
            HostCall::Animation(a, state) if *a == actor => Some(*state),
            _ => None,
        })
    }

    /// How many times `clip` was played
    pub fn sound_count(&self, clip: SoundClip) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Sound(s, _) if *s == clip))
            .count()
    }

    /// Whether `indicator` was ever made visible
    pub fn ever_shown(&self, indicator: Indicator) -> bool {
        self.calls
            .iter()
            .any(|c| *c == HostCall::Indicator(indicator, true))
    }
}

impl MeterSink for RecordingHost {
    fn set_meter_progress(&mut self, meter: Meter, ratio: f32) {
        self.calls.push(HostCall::Meter(meter, ratio));
    }
}

impl AnimationSink for RecordingHost {
    fn set_animation_state(&mut self, actor: Actor, state: i32) {
        self.calls.push(HostCall::Animation(actor, state));
    }
}

impl AudioSink for RecordingHost {
    fn play_sound(&mut self, clip: SoundClip, position: Vec2) {
        self.calls.push(HostCall::Sound(clip, position));
    }

    fn stop_ambient_audio(&mut self) {
        self.calls.push(HostCall::StopAmbient);
    }
}

impl IndicatorSink for RecordingHost {
    fn set_indicator_visible(&mut self, indicator: Indicator, visible: bool) {
        self.calls.push(HostCall::Indicator(indicator, visible));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_host_queries() {
        let mut host = RecordingHost::new();
        host.set_indicator_visible(Indicator::Warning, true);
        host.set_indicator_visible(Indicator::Warning, false);
        host.set_meter_progress(Meter::Snooze, 0.25);
        host.play_sound(SoundClip::Knock, Vec2::ZERO);
        host.play_sound(SoundClip::Knock, Vec2::ONE);

        assert_eq!(host.indicator(Indicator::Warning), Some(false));
        assert!(host.ever_shown(Indicator::Warning));
        assert_eq!(host.indicator(Indicator::WinPanel), None);
        assert_eq!(host.meter(Meter::Snooze), Some(0.25));
        assert_eq!(host.sound_count(SoundClip::Knock), 2);
        assert_eq!(host.animation(Actor::Boss), None);
    }
}
