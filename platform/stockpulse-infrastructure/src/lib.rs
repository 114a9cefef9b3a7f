pub mod alerts;
pub mod market_data;
