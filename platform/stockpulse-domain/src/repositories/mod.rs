pub mod alerts;
pub mod price_series;
