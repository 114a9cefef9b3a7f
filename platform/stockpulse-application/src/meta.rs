pub fn engine_name() -> &'static str {
    "stockpulse"
}

pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
