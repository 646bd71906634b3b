//! Vehicle status finite state machine.
//!
//! Pure functions that decide the next status for a vehicle given a trigger.
//! No ECS dependency. The engine applies the result and performs the
//! side effects the update asks for.

use responder_core::enums::{StatusTrigger, VehicleStatus};
use thiserror::Error;

/// Input to the FSM for a single vehicle.
pub struct VehicleContext {
    pub status: VehicleStatus,
    pub trigger: StatusTrigger,
    /// Whether the vehicle currently owns a movement or dwell task.
    pub has_task: bool,
}

/// Output from the FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub new_status: VehicleStatus,
    pub status_changed: bool,
    /// The current task must be cancelled before anything new starts.
    pub cancel_task: bool,
    /// Patrol target and flags must be cleared.
    pub clear_patrol: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {trigger:?} while {status}")]
pub struct InvalidTransition {
    pub status: VehicleStatus,
    pub trigger: StatusTrigger,
}

/// Evaluate one trigger. Rejected triggers leave the vehicle untouched.
pub fn evaluate(ctx: &VehicleContext) -> Result<StatusUpdate, InvalidTransition> {
    let new_status = next_status(ctx.status, ctx.trigger).ok_or(InvalidTransition {
        status: ctx.status,
        trigger: ctx.trigger,
    })?;

    Ok(StatusUpdate {
        new_status,
        status_changed: new_status != ctx.status,
        cancel_task: ctx.has_task && supersedes_activity(ctx.trigger),
        clear_patrol: ctx.status == VehicleStatus::Patrolling
            && new_status != VehicleStatus::Patrolling,
    })
}

/// Transition table. `None` means the trigger is illegal in this status.
pub fn next_status(status: VehicleStatus, trigger: StatusTrigger) -> Option<VehicleStatus> {
    use StatusTrigger as T;
    use VehicleStatus as S;

    match (status, trigger) {
        // Forced reset is always allowed.
        (_, T::ForceStandby) => Some(S::Standby),

        (S::Standby | S::ReturningHome | S::Patrolling, T::Dispatch) => Some(S::EnRoute),
        (S::EnRoute, T::Arrive) => Some(S::AtIncident),
        (S::AtIncident, T::DwellElapsed) => Some(S::ReturningHome),
        (S::ReturningHome, T::ReachedHome) => Some(S::Standby),

        (S::Standby | S::ReturningHome, T::StartPatrol) => Some(S::Patrolling),
        (S::Patrolling, T::StopPatrol) => Some(S::Standby),
        (S::Patrolling, T::WaypointReached) => Some(S::Patrolling),

        (S::EnRoute | S::AtIncident | S::ReturningHome | S::Patrolling, T::Recall) => {
            Some(S::ReturningHome)
        }

        _ => None,
    }
}

/// Triggers issued by the operator or coordinator replace whatever the
/// vehicle was doing. Completion triggers come from the task itself.
fn supersedes_activity(trigger: StatusTrigger) -> bool {
    match trigger {
        StatusTrigger::Dispatch
        | StatusTrigger::StartPatrol
        | StatusTrigger::StopPatrol
        | StatusTrigger::Recall
        | StatusTrigger::ForceStandby => true,
        StatusTrigger::Arrive
        | StatusTrigger::DwellElapsed
        | StatusTrigger::ReachedHome
        | StatusTrigger::WaypointReached => false,
    }
}
