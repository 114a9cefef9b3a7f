pub mod anomaly;
pub mod fanout;
pub mod performance;
pub mod simulator;
pub mod statistics;
