//! Real-time loop thread: runs the engine at its tick rate and publishes snapshots.
//!
//! The engine moves into the thread and is handed back through the join
//! handle on shutdown. Commands arrive via an `mpsc` channel. Snapshots are
//! stored in shared state for polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use responder_core::state::SimSnapshot;
use responder_sim::SimulationEngine;

use crate::operator::AutoDispatcher;
use crate::state::LoopCommand;

/// How the loop paces itself.
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    /// Wall-clock speed-up. 1.0 runs in real time.
    pub time_scale: f64,
    /// Stop on its own after this many ticks.
    pub max_ticks: Option<u64>,
    /// Sleep between ticks. Off runs as fast as possible.
    pub realtime: bool,
    pub auto_dispatch: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_ticks: None,
            realtime: true,
            auto_dispatch: false,
        }
    }
}

/// Spawns the loop in a new thread.
///
/// Returns the command sender and a handle that yields the engine back.
pub fn spawn_game_loop(
    engine: SimulationEngine,
    options: LoopOptions,
    latest_snapshot: Arc<Mutex<Option<SimSnapshot>>>,
) -> std::io::Result<(mpsc::Sender<LoopCommand>, JoinHandle<SimulationEngine>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();

    let handle = std::thread::Builder::new()
        .name("responder-sim-loop".into())
        .spawn(move || run_game_loop(engine, options, cmd_rx, &latest_snapshot))?;

    Ok((cmd_tx, handle))
}

/// Nominal wall-clock duration of one tick.
pub fn tick_duration(tick_interval_ms: u64, time_scale: f64) -> Duration {
    let base = Duration::from_millis(tick_interval_ms);
    if time_scale > 0.001 {
        base.div_f64(time_scale)
    } else {
        base
    }
}

/// The loop. Runs until Shutdown, channel disconnect, or the tick limit.
fn run_game_loop(
    mut engine: SimulationEngine,
    options: LoopOptions,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    latest_snapshot: &Mutex<Option<SimSnapshot>>,
) -> SimulationEngine {
    let operator = options.auto_dispatch.then(AutoDispatcher::new);
    let step = tick_duration(engine.config().tick_interval_ms, options.time_scale);
    let mut next_tick_time = Instant::now();
    let mut ticks: u64 = 0;

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(LoopCommand::Command(cmd)) => engine.queue_command(cmd),
                Ok(LoopCommand::Shutdown) => return engine,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return engine,
            }
        }

        // 2. Advance one tick (engine handles pause internally)
        let snapshot = engine.tick();
        ticks += 1;

        // 3. Let the operator react; its orders run at the next tick boundary
        if let Some(operator) = &operator {
            engine.queue_commands(operator.plan(&snapshot));
        }

        // 4. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        if options.max_ticks.is_some_and(|max| ticks >= max) {
            tracing::info!(ticks, "tick limit reached");
            return engine;
        }

        // 5. Sleep until the next tick
        if options.realtime {
            next_tick_time += step;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > step * 2 {
                // Too far behind; reset to avoid a catch-up spiral
                next_tick_time = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_core::commands::DispatchCommand;
    use responder_core::config::SimConfig;

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();

        tx.send(LoopCommand::Command(DispatchCommand::CreateRandomAlarm))
            .unwrap();
        tx.send(LoopCommand::Command(DispatchCommand::Pause)).unwrap();
        tx.send(LoopCommand::Shutdown).unwrap();

        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }

        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            LoopCommand::Command(DispatchCommand::CreateRandomAlarm)
        ));
        assert!(matches!(
            commands[1],
            LoopCommand::Command(DispatchCommand::Pause)
        ));
        assert!(matches!(commands[2], LoopCommand::Shutdown));
    }

    #[test]
    fn test_tick_duration_scaling() {
        assert_eq!(tick_duration(100, 1.0), Duration::from_millis(100));
        assert_eq!(tick_duration(100, 4.0), Duration::from_millis(25));
        assert_eq!(tick_duration(100, 0.0), Duration::from_millis(100));
    }

    #[test]
    fn test_loop_stops_at_tick_limit() {
        let latest = Arc::new(Mutex::new(None));
        let options = LoopOptions {
            max_ticks: Some(25),
            realtime: false,
            ..Default::default()
        };
        let (_tx, handle) =
            spawn_game_loop(SimulationEngine::new(SimConfig::default()), options, latest.clone())
                .unwrap();
        let engine = handle.join().unwrap();
        assert_eq!(engine.time().tick, 25);
        let snapshot = latest.lock().unwrap().clone().unwrap();
        assert_eq!(snapshot.time.tick, 25);
    }

    #[test]
    fn test_shutdown_returns_engine() {
        let latest = Arc::new(Mutex::new(None));
        let options = LoopOptions {
            realtime: false,
            ..Default::default()
        };
        let (tx, handle) =
            spawn_game_loop(SimulationEngine::new(SimConfig::default()), options, latest).unwrap();
        tx.send(LoopCommand::Shutdown).unwrap();
        let engine = handle.join().expect("loop thread panicked");
        assert_eq!(engine.config().seed, SimConfig::default().seed);
    }
}
