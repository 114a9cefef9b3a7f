pub mod csv_store;
pub mod memory;

pub use csv_store::{load_series_csv, CsvPriceStore, SeriesReport};
pub use memory::InMemoryPriceStore;
