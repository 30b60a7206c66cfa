pub mod attendance;
pub mod backup_exchange;
pub mod core;
pub mod roster;
pub mod schedule;
pub mod students;
pub mod users;
