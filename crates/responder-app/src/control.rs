//! Control surface over the loop thread: start, send commands, poll state, stop.

use std::thread::JoinHandle;

use thiserror::Error;

use responder_core::commands::DispatchCommand;
use responder_core::state::SimSnapshot;
use responder_sim::SimulationEngine;

use crate::game_loop::{self, LoopOptions};
use crate::state::{AppState, LoopCommand};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("simulation already running")]
    AlreadyRunning,
    #[error("simulation not started")]
    NotStarted,
    #[error("simulation loop has stopped")]
    Disconnected,
    #[error("shared state lock poisoned")]
    Poisoned,
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Start the loop thread. The returned handle yields the engine once the
/// loop stops.
pub fn start_simulation(
    state: &AppState,
    engine: SimulationEngine,
    options: LoopOptions,
) -> Result<JoinHandle<SimulationEngine>, ControlError> {
    let mut running = state.running.lock().map_err(|_| ControlError::Poisoned)?;
    if *running {
        return Err(ControlError::AlreadyRunning);
    }

    let (cmd_tx, handle) =
        game_loop::spawn_game_loop(engine, options, state.latest_snapshot.clone())?;

    let mut tx_lock = state.command_tx.lock().map_err(|_| ControlError::Poisoned)?;
    *tx_lock = Some(cmd_tx);
    *running = true;
    tracing::info!(time_scale = options.time_scale, realtime = options.realtime, "simulation started");
    Ok(handle)
}

/// Forward an operator command to the running loop.
pub fn send_command(state: &AppState, command: DispatchCommand) -> Result<(), ControlError> {
    let tx_lock = state.command_tx.lock().map_err(|_| ControlError::Poisoned)?;
    match tx_lock.as_ref() {
        Some(tx) => tx
            .send(LoopCommand::Command(command))
            .map_err(|_| ControlError::Disconnected),
        None => Err(ControlError::NotStarted),
    }
}

/// Latest published snapshot, if any tick has run.
pub fn get_snapshot(state: &AppState) -> Result<Option<SimSnapshot>, ControlError> {
    let lock = state
        .latest_snapshot
        .lock()
        .map_err(|_| ControlError::Poisoned)?;
    Ok(lock.clone())
}

/// Ask the loop to stop. A loop that already ended on its own is fine.
pub fn stop_simulation(state: &AppState) -> Result<(), ControlError> {
    let mut tx_lock = state.command_tx.lock().map_err(|_| ControlError::Poisoned)?;
    let Some(tx) = tx_lock.take() else {
        return Err(ControlError::NotStarted);
    };
    let _ = tx.send(LoopCommand::Shutdown);
    *state.running.lock().map_err(|_| ControlError::Poisoned)? = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_core::config::SimConfig;

    fn fast() -> LoopOptions {
        LoopOptions {
            realtime: false,
            max_ticks: Some(50),
            ..Default::default()
        }
    }

    #[test]
    fn test_send_before_start_fails() {
        let state = AppState::new();
        assert!(matches!(
            send_command(&state, DispatchCommand::Pause),
            Err(ControlError::NotStarted)
        ));
        assert!(get_snapshot(&state).unwrap().is_none());
    }

    #[test]
    fn test_start_twice_fails() {
        let state = AppState::new();
        let handle =
            start_simulation(&state, SimulationEngine::new(SimConfig::default()), fast()).unwrap();
        let second = start_simulation(&state, SimulationEngine::new(SimConfig::default()), fast());
        assert!(matches!(second, Err(ControlError::AlreadyRunning)));

        handle.join().unwrap();
        assert!(get_snapshot(&state).unwrap().is_some());
        stop_simulation(&state).unwrap();
        assert!(!*state.running.lock().unwrap());
    }
}
