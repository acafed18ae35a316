//! Snooze Patrol entry point
//!
//! Headless runner: plays one session on autopilot and logs every host call.
//!
//! Usage: `snooze-patrol [seed] [tuning.json]`, or `snooze-patrol --dump-tuning`.
//! The tuning path can also come from `SNOOZE_TUNING`. Set `RUST_LOG=debug` to
//! see every state change.

use glam::Vec2;

use snooze_patrol::consts::*;
use snooze_patrol::sim::{
    Actor, AnimationSink, AudioSink, GameSession, Indicator, IndicatorSink, Meter, MeterSink,
    SoundClip, TickInput, tick,
};
use snooze_patrol::{Tuning, TuningError};

/// Host frame length (the sim substeps at `SIM_DT`)
const FRAME_DT: f32 = 1.0 / 30.0;
/// Keep running this long after the ending so the panels show up
const LINGER_SECS: f32 = 4.0;
const DEFAULT_SEED: u64 = 0x5EED;

/// Host that writes everything to the log
struct LogHost {
    /// Last whole percent logged for the time meter (-1 before the first push)
    last_time_percent: i32,
}

impl Default for LogHost {
    fn default() -> Self {
        Self {
            last_time_percent: -1,
        }
    }
}

impl LogHost {
    /// New whole percent for the time meter, or None if it hasn't moved
    fn time_percent(&mut self, ratio: f32) -> Option<i32> {
        let percent = (ratio * 100.0) as i32;
        if percent == self.last_time_percent {
            return None;
        }
        self.last_time_percent = percent;
        Some(percent)
    }
}

impl MeterSink for LogHost {
    fn set_meter_progress(&mut self, meter: Meter, ratio: f32) {
        match meter {
            // Once per percent, not once per frame
            Meter::Time => {
                if let Some(percent) = self.time_percent(ratio) {
                    log::trace!("time {}%", percent);
                }
            }
            Meter::Snooze => log::debug!("snooze meter {:.3}", ratio),
        }
    }
}

impl AnimationSink for LogHost {
    fn set_animation_state(&mut self, actor: Actor, state: i32) {
        log::debug!("{:?} animator -> {}", actor, state);
    }
}

impl AudioSink for LogHost {
    fn play_sound(&mut self, clip: SoundClip, position: Vec2) {
        log::info!("sound {:?} at ({:.1}, {:.1})", clip, position.x, position.y);
    }

    fn stop_ambient_audio(&mut self) {
        log::info!("ambient audio stopped");
    }
}

impl IndicatorSink for LogHost {
    fn set_indicator_visible(&mut self, indicator: Indicator, visible: bool) {
        log::debug!("{:?} {}", indicator, if visible { "shown" } else { "hidden" });
    }
}

fn load_tuning(path: Option<String>) -> Result<Tuning, TuningError> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => {
            let tuning = Tuning::from_json(&json)?;
            log::info!("Loaded tuning from {}", path);
            Ok(tuning)
        }
        Err(e) => {
            log::warn!("Can't read {} ({}), using default tuning", path, e);
            Ok(Tuning::default())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("--dump-tuning") {
        match Tuning::default().to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("{}", e),
        }
        return;
    }

    let seed = match first.as_deref().map(str::parse::<u64>) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::warn!("Bad seed ({}), using {}", e, DEFAULT_SEED);
            DEFAULT_SEED
        }
        None => DEFAULT_SEED,
    };
    let path = args.next().or_else(|| std::env::var("SNOOZE_TUNING").ok());
    let tuning = load_tuning(path).unwrap_or_else(|e| {
        log::error!("{}; falling back to default tuning", e);
        Tuning::default()
    });

    log::info!("Snooze Patrol (headless) starting, seed {}", seed);
    let mut session = match GameSession::try_new(tuning, seed, LogHost::default()) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut accumulator = 0.0;
    let mut linger = 0.0;
    while linger < LINGER_SECS {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut session, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
        if session.is_stopped() {
            linger += FRAME_DT;
        }
    }

    println!(
        "\n{:?} after {:.1}s: snooze {:.0}/{:.0}, {} naps, {} boss patrols",
        session.outcome(),
        session.game_time(),
        session.snooze_amount(),
        session.tuning().snooze_needed,
        session.snooze().naps(),
        session.boss().cycles(),
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser frontend yet; the library is driven by the embedding page
}
