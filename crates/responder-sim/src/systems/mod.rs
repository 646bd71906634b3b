pub mod alarms;
pub mod dispatch;
pub mod movement;
pub mod patrol;
pub mod snapshot;
pub mod spawner;
