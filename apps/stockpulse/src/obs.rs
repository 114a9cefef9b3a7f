use std::net::SocketAddr;
use stockpulse_application::config::LogFormat;

pub const LOG_ENV: &str = "STOCKPULSE_LOG";

/// `STOCKPULSE_LOG` wins over the configured level. Logs go to stderr so stdout stays JSON.
pub fn init_tracing(default_level: &str, format: LogFormat) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|err| format!("failed to init tracing: {err}"))
}

pub fn parse_metrics_addr(raw: &str) -> Result<SocketAddr, String> {
    raw.trim()
        .parse()
        .map_err(|err| format!("invalid --metrics-addr (expected host:port): {err}"))
}

#[cfg(feature = "prometheus")]
pub fn init_metrics(raw_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = raw_addr.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let addr = parse_metrics_addr(raw)?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(raw_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    if raw_addr.is_some_and(|v| !v.trim().is_empty()) {
        tracing::warn!("--metrics-addr ignored: built without the prometheus feature");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::parse_metrics_addr;

    #[test]
    fn metrics_addr_requires_host_and_port() {
        assert_eq!(
            parse_metrics_addr(" 127.0.0.1:9000 ").expect("addr").port(),
            9000
        );
        let err = parse_metrics_addr("localhost").expect_err("missing port");
        assert!(err.contains("expected host:port"));
    }
}
