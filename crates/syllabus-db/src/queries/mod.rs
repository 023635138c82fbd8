pub mod participants;
pub mod plans;
pub mod schedules;
pub mod settings;
