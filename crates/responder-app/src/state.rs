//! State shared between the control surface and the simulation loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use responder_core::commands::DispatchCommand;
use responder_core::state::SimSnapshot;

/// Messages sent from the control surface to the loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Forward an operator command to the engine.
    Command(DispatchCommand),
    /// Stop the loop and hand the engine back.
    Shutdown,
}

/// Shared application state.
///
/// - `mpsc::Sender` is wrapped in a `Mutex` so the state is `Sync`
/// - `Option` covers the time before the loop is started
/// - the latest snapshot is `Arc`-shared with the loop thread
pub struct AppState {
    /// `None` until the loop is started.
    pub command_tx: Mutex<Option<mpsc::Sender<LoopCommand>>>,
    /// Updated by the loop thread after each tick.
    pub latest_snapshot: Arc<Mutex<Option<SimSnapshot>>>,
    pub running: Mutex<bool>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
            running: Mutex::new(false),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
