use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockpulse::commands::{run_command, Command};
use stockpulse::obs;
use stockpulse_application::config::load_config;

#[derive(Parser, Debug)]
#[command(name = "stockpulse")]
#[command(about = "Stock anomaly scans and buy-and-hold simulations.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env STOCKPULSE_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serve Prometheus metrics on host:port while the command runs.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,

    /// Pretty-print the JSON result.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Run volume and price anomaly detection over the watchlist.
    Scan {
        /// Symbols to scan instead of scan.watchlist (repeatable or comma-separated).
        #[arg(long = "symbol", value_delimiter = ',')]
        symbols: Vec<String>,

        /// Skip the configured alert sink.
        #[arg(long)]
        no_alerts: bool,
    },
    /// Simulate a lump-sum purchase held until --end (or the latest close).
    Simulate {
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        symbol: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
    },
    /// Simulate the same amount across up to five symbols and rank them.
    Compare {
        #[arg(long)]
        amount: f64,
        #[arg(long = "symbol", value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
    },
    /// Daily value of a fixed share count since --start.
    History {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        shares: f64,
    },
    /// Load every watchlist series and report data quality.
    Validate,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Scan { symbols, no_alerts } => Command::Scan { symbols, no_alerts },
            CliCommand::Simulate {
                amount,
                symbol,
                start,
                end,
            } => Command::Simulate {
                amount,
                symbol,
                start,
                end,
            },
            CliCommand::Compare {
                amount,
                symbols,
                start,
                end,
            } => Command::Compare {
                amount,
                symbols,
                start,
                end,
            },
            CliCommand::History {
                symbol,
                start,
                shares,
            } => Command::History {
                symbol,
                start,
                shares,
            },
            CliCommand::Validate => Command::Validate,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| {
            std::env::var("STOCKPULSE_CONFIG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| {
            eprintln!("error: missing --config and env STOCKPULSE_CONFIG is not set");
            std::process::exit(1);
        });

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = obs::init_tracing(config.log_level(), config.log_format()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let command = Command::from(cli.command);
    match run_command(&command, &config, &config_path) {
        Ok(json) => {
            let rendered = if cli.pretty {
                serde_json::to_string_pretty(&json)
            } else {
                serde_json::to_string(&json)
            };
            println!(
                "{}",
                rendered
                    .unwrap_or_else(|_| "{\"status\":\"error\",\"error\":\"json\"}".to_string())
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
