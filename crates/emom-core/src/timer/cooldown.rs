//! Post-workout cooldown countdown.

use chrono::{DateTime, Utc};

use crate::clock::{elapsed_ms, Clock, SystemClock};
use crate::events::Event;

#[derive(Debug, Clone)]
pub struct Cooldown<C: Clock = SystemClock> {
    clock: C,
    duration_ms: u64,
    speed_multiplier: u32,
    started_at: DateTime<Utc>,
    done: bool,
}

impl<C: Clock> Cooldown<C> {
    /// Returns `None` when no cooldown is configured.
    pub fn start(cooldown_seconds: u32, speed_multiplier: u32, clock: C) -> Option<(Self, Event)> {
        if cooldown_seconds == 0 {
            return None;
        }
        let started_at = clock.now();
        let cooldown = Self {
            clock,
            duration_ms: u64::from(cooldown_seconds) * 1000,
            speed_multiplier: speed_multiplier.max(1),
            started_at,
            done: false,
        };
        Some((
            cooldown,
            Event::CooldownStarted {
                duration_secs: cooldown_seconds,
                at: started_at,
            },
        ))
    }

    pub fn remaining_ms(&self) -> u64 {
        let elapsed = elapsed_ms(self.started_at, self.clock.now())
            .saturating_mul(u64::from(self.speed_multiplier));
        self.duration_ms.saturating_sub(elapsed)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn tick(&mut self) -> Option<Event> {
        if self.done || self.remaining_ms() > 0 {
            return None;
        }
        self.done = true;
        Some(Event::CooldownComplete {
            at: self.clock.now(),
        })
    }
}
