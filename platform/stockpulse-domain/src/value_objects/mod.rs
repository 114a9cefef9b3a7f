pub mod instrument;
pub mod price_point;
