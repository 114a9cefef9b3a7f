pub mod config;
pub mod meta;
pub mod performance;
pub mod scanning;
pub mod simulation;
