//! FRACTAL headless host
//!
//! Runs the simulation with a fixed-step accumulator, lets the autopilot play,
//! and logs status changes. Usage: `fractal [settings.json]`.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use fractal::Settings;
use fractal::consts::{MAX_SUBSTEPS, SIM_DT};
use fractal::sim::{GameEvent, GameState, StatusReporter, StatusUpdate, TickInput, accuracy_phrase, tick};

/// Forwards status changes to the log
struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&mut self, update: &StatusUpdate) {
        let boss = update.boss.map(|b| b.name()).unwrap_or("none");
        match update.death_cause {
            Some(cause) if update.dead => log::info!(
                "[status] {} | level {} | killed by {:?}",
                update.activity.label(),
                update.level,
                cause
            ),
            _ => log::info!(
                "[status] {} | level {} | boss {} | {} enemies{}",
                update.activity.label(),
                update.level,
                boss,
                update.enemy_count,
                if update.paused { " | paused" } else { "" }
            ),
        }
    }
}

/// Session plus the host-side loop bookkeeping
struct Host {
    state: GameState,
    input: TickInput,
    accumulator: f32,
    reporter: Option<Box<dyn StatusReporter>>,
    effects_drained: usize,
}

impl Host {
    fn new(settings: &Settings, seed: u64) -> Self {
        let reporter: Option<Box<dyn StatusReporter>> = if settings.report_status {
            Some(Box::new(LogReporter))
        } else {
            None
        };
        Self {
            state: GameState::new(seed, settings.world_size()),
            input: TickInput {
                idle_mode: settings.autopilot,
                ..Default::default()
            },
            accumulator: 0.0,
            reporter,
            effects_drained: 0,
        }
    }

    /// Run simulation ticks for `dt` seconds of wall time
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.drain();

            // One-shot inputs apply to a single tick
            self.input.reset = false;
            self.input.pause = false;
            self.input.select_slot = None;
        }
    }

    /// Consume this tick's effects and events
    fn drain(&mut self) {
        self.effects_drained += self.state.effects.len();
        self.state.effects.clear();

        for event in self.state.events.drain(..) {
            match event {
                GameEvent::EnemySpawned { .. } | GameEvent::ShotFired { .. } | GameEvent::PickupCollected { .. } => {
                    log::trace!("{:?}", event)
                }
                _ => log::debug!("{:?}", event),
            }
        }

        if let Some(reporter) = self.reporter.as_mut() {
            if let Some(update) = self.state.poll_status() {
                reporter.report(&update);
            }
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(Path::new(&path)),
        None => Settings::default(),
    };
    let seed = settings.seed.unwrap_or_else(clock_seed);
    log::info!(
        "FRACTAL (headless) starting: seed {}, world {}x{}, {} ticks",
        seed,
        settings.world_width,
        settings.world_height,
        settings.max_ticks
    );

    let mut host = Host::new(&settings, seed);
    let frame = Duration::from_secs_f32(SIM_DT);
    let mut last = Instant::now();

    while host.state.time_ticks < settings.max_ticks && !host.state.is_game_over() {
        let dt = if settings.realtime {
            std::thread::sleep(frame);
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;
            dt
        } else {
            SIM_DT
        };
        host.update(dt);
    }

    let state = &host.state;
    let accuracy = state.accuracy();
    log::info!(
        "Finished after {} ticks: level {}, score {}, accuracy {}% ({}), {} effects",
        state.time_ticks,
        state.level,
        state.score,
        accuracy,
        accuracy_phrase(accuracy),
        host.effects_drained
    );

    if settings.dump_snapshot {
        match serde_json::to_string_pretty(&state.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => log::warn!("Could not serialize snapshot: {}", e),
        }
    }
}
