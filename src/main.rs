//! VNC repeater configuration check.
//!
//! Loads the repeater's INI configuration exactly once, applies its logging
//! level, publishes the snapshot and optionally prints the effective settings.
//!
//! ```text
//! repeater-config [--print json|toml] [CONFIG]
//!     → load_config (parse, validate, defaults)
//!     → logging filter from loggingLevel
//!     → config::install (read-only from here on)
//!     → report
//! ```
//!
//! Any configuration error is fatal: it is logged and the process exits with
//! status 1.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use repeater_config::config::{self, RepeaterConfig};
use repeater_config::observability::logging;
use repeater_config::AdmissionPolicy;

#[derive(Parser)]
#[command(name = "repeater-config")]
#[command(about = "Load and validate the VNC repeater configuration", long_about = None)]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(default_value = "/etc/uvncrepeater.ini")]
    config: PathBuf,

    /// Print the effective configuration to stdout.
    #[arg(long, value_enum)]
    print: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Toml,
}

fn render(config: &RepeaterConfig, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Toml => toml::to_string(config)?,
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = match logging::init() {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: {e}");
            None
        }
    };

    tracing::info!("repeater-config v{} starting", env!("CARGO_PKG_VERSION"));

    let loaded = match config::load_config(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Configuration rejected");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log) = &log {
        if let Err(e) = log.apply_level(loaded.logging_level) {
            tracing::warn!(error = %e, "Keeping bootstrap log filter");
        }
    }

    let snapshot = match config::install(loaded) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(error = %e, "Configuration could not be published");
            return ExitCode::FAILURE;
        }
    };

    let policy = AdmissionPolicy::from_config(snapshot);
    tracing::debug!(?policy, "Admission policy ready");

    tracing::info!(
        viewer_port = snapshot.viewer_port,
        server_port = snapshot.server_port,
        own_ip_address = %snapshot.own_ip_address,
        run_as_user = %snapshot.run_as_user,
        event_interface = snapshot.use_event_interface,
        "Configuration valid"
    );

    if let Some(format) = cli.print {
        match render(snapshot, format) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render configuration");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
