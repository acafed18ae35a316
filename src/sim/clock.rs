//! Scheduler for delayed, cancellable continuations
//!
//! Two clocks advance together on every tick:
//! - the real-time clock always moves by the raw frame delta
//! - the scaled clock moves by `delta * time_scale`, so it freezes while paused
//!
//! Timers are plain data (`A`) handed back to the caller when they come due.
//! Nothing runs on another thread.
//!
//! While a fired timer is being handled, new timers on the same clock are
//! measured from the moment it came due rather than from the end of the frame,
//! so chained waits don't drift with frame size.

use serde::{Deserialize, Serialize};

/// Opaque token for a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// Which clock a timer follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerClass {
    /// Keeps running while time scale is 0 (countdown, end sequences)
    Realtime,
    /// Frozen while time scale is 0 (gameplay)
    Scaled,
}

#[derive(Debug, Clone)]
struct Timer<A> {
    handle: TimerHandle,
    class: TimerClass,
    due: f64,
    action: A,
}

/// Cooperative timer queue
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    real_now: f64,
    scaled_now: f64,
    time_scale: f32,
    next_handle: u64,
    pending: Vec<Timer<A>>,
    /// Due time of the timer most recently handed out by `pop_due`
    anchor: Option<(TimerClass, f64)>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            real_now: 0.0,
            scaled_now: 0.0,
            time_scale: 1.0,
            next_handle: 1,
            pending: Vec::new(),
            anchor: None,
        }
    }

    /// Seconds of real time since creation
    pub fn real_now(&self) -> f32 {
        self.real_now as f32
    }

    /// Seconds of scaled (gameplay) time since creation
    pub fn scaled_now(&self) -> f32 {
        self.scaled_now as f32
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the scaled clock rate; 0 pauses scaled timers
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    fn now(&self, class: TimerClass) -> f64 {
        match class {
            TimerClass::Realtime => self.real_now,
            TimerClass::Scaled => self.scaled_now,
        }
    }

    /// Schedule `action` to come due `delay` seconds from now on `class`'s clock
    pub fn schedule_after(&mut self, class: TimerClass, delay: f32, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let base = match self.anchor {
            Some((anchor_class, due)) if anchor_class == class => due,
            _ => self.now(class),
        };
        let due = base + f64::from(delay.max(0.0));
        self.pending.push(Timer {
            handle,
            class,
            due,
            action,
        });
        handle
    }

    /// Cancel a timer. Returns false (and does nothing) if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|t| t.handle == handle) {
            Some(idx) => {
                self.pending.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Seconds until `handle` comes due on its own clock
    pub fn remaining(&self, handle: TimerHandle) -> Option<f32> {
        self.pending
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| (t.due - self.now(t.class)).max(0.0) as f32)
    }

    /// Move both clocks forward without firing anything
    pub fn advance(&mut self, delta: f32) {
        let delta = f64::from(delta.max(0.0));
        self.anchor = None;
        self.real_now += delta;
        self.scaled_now += delta * f64::from(self.time_scale);
    }

    /// Remove and return the next due timer.
    ///
    /// The timer that came due longest ago fires first; equal due times fire
    /// in the order they were scheduled.
    pub fn pop_due(&mut self) -> Option<(TimerHandle, A)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, timer) in self.pending.iter().enumerate() {
            let overdue = self.now(timer.class) - timer.due;
            if overdue < 0.0 {
                continue;
            }
            // `pending` is in schedule order, so strict `>` keeps FIFO on ties
            match best {
                Some((_, best_overdue)) if overdue <= best_overdue => {}
                _ => best = Some((idx, overdue)),
            }
        }
        match best {
            Some((idx, _)) => {
                let timer = self.pending.remove(idx);
                self.anchor = Some((timer.class, timer.due));
                Some((timer.handle, timer.action))
            }
            None => {
                self.anchor = None;
                None
            }
        }
    }

    /// Advance and drain everything that came due
    pub fn tick(&mut self, delta: f32) -> Vec<A> {
        self.advance(delta);
        let mut fired = Vec::new();
        while let Some((_, action)) = self.pop_due() {
            fired.push(action);
        }
        fired
    }
}
