use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use emom_core::storage::Database;
use emom_core::{
    tick_period, Config, Event, EventSink, SessionRunner, SystemClock, TimerSettings,
    WorkRestSplit, WorkoutLedger,
};

/// Wall-clock cadence at normal speed.
const BASE_TICK: Duration = Duration::from_secs(1);

#[derive(Args)]
pub struct RunArgs {
    /// Number of rounds
    #[arg(long, conflicts_with = "infinite")]
    rounds: Option<u32>,
    /// Repeat rounds until stopped
    #[arg(long)]
    infinite: bool,
    /// Work/rest split id (none, 30-30, 40-20, 45-15)
    #[arg(long)]
    split: Option<String>,
    /// Rest seconds, overriding the split's rest
    #[arg(long)]
    rest: Option<u32>,
    /// Preparation countdown seconds
    #[arg(long)]
    prep: Option<u32>,
    /// Cooldown seconds after the last round
    #[arg(long)]
    cooldown: Option<u32>,
    /// Run the clock four times faster
    #[arg(long)]
    speed_up: bool,
    /// Stop the session after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

impl RunArgs {
    /// Overlay the flags onto the saved settings.
    fn apply(&self, settings: &mut TimerSettings) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(rounds) = self.rounds {
            settings.number_of_rounds = rounds;
            settings.is_infinite_mode = false;
        }
        if self.infinite {
            settings.is_infinite_mode = true;
        }
        if let Some(split) = &self.split {
            settings.select_split(split.parse::<WorkRestSplit>()?);
        }
        if let Some(rest) = self.rest {
            settings.rest_interval_seconds = rest;
        }
        if let Some(prep) = self.prep {
            settings.preparation_seconds = prep;
        }
        if let Some(cooldown) = self.cooldown {
            settings.cooldown_seconds = cooldown;
        }
        if self.speed_up {
            settings.speed_up_enabled = true;
        }
        Ok(())
    }
}

/// Prints each event as one JSON line on stdout.
struct JsonLineSink;

impl EventSink for JsonLineSink {
    fn emit(&self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, event = event.name(), "could not encode event"),
        }
    }
}

/// Keyboard control read from stdin, one command per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    TogglePause,
    Stop,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "p" | "pause" | "resume" => Some(Control::TogglePause),
            "q" | "quit" | "stop" => Some(Control::Stop),
            _ => None,
        }
    }
}

/// Forward stdin commands until stdin closes or the receiver is dropped.
fn spawn_control_reader() -> Receiver<Control> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match Control::parse(&line) {
                Some(control) => {
                    if tx.send(control).is_err() {
                        break;
                    }
                }
                None => tracing::warn!(input = %line.trim(), "unknown command, use p or q"),
            }
        }
    });
    rx
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Config::load()?.timer;
    args.apply(&mut settings)?;

    let ledger = WorkoutLedger::open(Database::open()?, SystemClock);
    let mut runner = SessionRunner::new(ledger, JsonLineSink, SystemClock);
    runner.start(&settings)?;

    let mut controls = Some(spawn_control_reader());
    let period = tick_period(BASE_TICK, settings.speed_multiplier());
    let mut ticks = 0u64;
    let mut next_tick = Instant::now() + period;
    while !runner.is_done() {
        if args.max_ticks.is_some_and(|max| ticks >= max) {
            runner.stop();
            break;
        }

        let wait = next_tick.saturating_duration_since(Instant::now());
        let received = match &controls {
            Some(rx) => rx.recv_timeout(wait),
            None => {
                thread::sleep(wait);
                Err(RecvTimeoutError::Timeout)
            }
        };
        match received {
            Ok(Control::TogglePause) => runner.toggle_pause()?,
            Ok(Control::Stop) => runner.stop(),
            Err(RecvTimeoutError::Disconnected) => controls = None,
            Err(RecvTimeoutError::Timeout) => {
                runner.tick();
                ticks += 1;
                next_tick += period;
            }
        }
    }

    tracing::info!(stage = ?runner.stage(), ticks, "session ended");
    Ok(())
}
