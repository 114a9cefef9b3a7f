pub mod anomaly;
pub mod performance;
pub mod simulation;
