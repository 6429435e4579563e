//! Gateway Access Controller
//!
//! Offline companion to the access control engine: validates a rules file and
//! dry-runs decisions against it.

use access_controller::{
    access_control::{AccessController, DecisionEngine, IncomingRequest, parse_query_string},
    config::{LogFormat, load_config},
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Gateway Access Controller - validate rules and dry-run access decisions
#[derive(Parser, Debug)]
#[command(name = "access-controller")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ACCESS_CONTROLLER_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error), overrides logging.level
    #[arg(long, env = "ACCESS_CONTROLLER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the configuration and compile every resource rule
    Validate,

    /// Decide a single request; exits with status 1 when denied
    Check {
        /// Request path, e.g. /users/alice/profile
        path: String,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Raw query string, e.g. "groups[]=mm&debug"
        #[arg(short, long, default_value = "")]
        query: String,

        /// Authenticated principal id
        #[arg(short, long)]
        principal: Option<String>,
    },

    /// Decide every request of a JSON array file
    Batch {
        /// File holding `[{"path": ..., "method": ..., "query": {...}, "principal": ...}]`
        file: PathBuf,
    },
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Logging settings come from the configuration, so load it first and
    // report a failure once logging is up
    let loaded = load_config(args.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    init_logging(
        args.log_level.as_deref().unwrap_or(&logging.level),
        logging.format,
    );

    let config = loaded.inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    // Create decision engine
    let engine = Arc::new(
        DecisionEngine::from_config(&config.access_control)
            .inspect_err(|e| error!(error = %e, "Failed to build rule set"))?,
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rules = engine.rules().len(),
        "Loaded access control rules"
    );

    let controller =
        AccessController::new(engine.clone(), |r: &IncomingRequest| r.principal.clone());

    match args.command {
        Command::Validate => {
            for rule in engine.rules().rules() {
                println!(
                    "{}\tmethods={}\trejections={}\towner={}",
                    rule.template(),
                    rule.methods()
                        .iter()
                        .map(|m| if m.require_owner {
                            format!("{}(owner)", m.method)
                        } else {
                            m.method.clone()
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                    rule.rejections().len(),
                    rule.pattern().has_owner_capture(),
                );
            }
            println!("OK: {} rules", engine.rules().len());
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            path,
            method,
            query,
            principal,
        } => {
            let mut request =
                IncomingRequest::new(path, method).with_query(parse_query_string(&query));
            request.principal = principal;

            let decision = controller.check(&request);
            println!("{}", decision);
            Ok(if decision.is_allowed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Batch { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let requests: Vec<IncomingRequest> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid request list in {}", file.display()))?;

            for request in &requests {
                println!(
                    "{}\t{} {}",
                    controller.check(request),
                    request.method,
                    request.path
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
