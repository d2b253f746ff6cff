use clap::{Parser, Subcommand};
use learnswitch::config;
use learnswitch::controller::{replay, Controller, Trace};
use learnswitch::dataplane::FirewallFilter;
use learnswitch::telemetry::{init_logging, MetricsRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "learnswitch")]
#[command(about = "A learning switch controller for OpenFlow devices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Replay a recorded notification trace through the controller
    Replay {
        /// Path to config.toml
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// Path to the trace file
        #[arg(short, long)]
        trace: PathBuf,

        /// Extra blacklist entries, comma-separated
        #[arg(long)]
        blacklist: Option<String>,

        /// Extra whitelist entries, comma-separated
        #[arg(long)]
        whitelist: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config.toml
    Validate {
        /// Path to config.toml
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config {
            action: ConfigAction::Validate { config },
        } => {
            init_logging(None);
            cmd_config_validate(&config)
        }
        Commands::Replay {
            config,
            trace,
            blacklist,
            whitelist,
        } => cmd_replay(&config, &trace, blacklist.as_deref(), whitelist.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn cmd_config_validate(config_path: &PathBuf) -> Result<(), String> {
    println!("[INFO] Validating {}...", config_path.display());

    let cfg = config::load(config_path).map_err(|e| format!("Failed to parse config: {}", e))?;

    let validation = config::validate(&cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        Err("Validation failed".to_string())
    } else {
        println!("[INFO] Configuration is valid");
        Ok(())
    }
}

fn cmd_replay(
    config_path: &PathBuf,
    trace_path: &PathBuf,
    blacklist: Option<&str>,
    whitelist: Option<&str>,
) -> Result<(), String> {
    use tokio::runtime::Runtime;

    let mut cfg = if config_path.exists() {
        config::load(config_path).map_err(|e| format!("Failed to parse config: {}", e))?
    } else {
        config::Config::default()
    };
    cfg.firewall.extend_from_args(blacklist, whitelist);

    // RUST_LOG env var takes priority
    init_logging(Some(&cfg.logging));

    let validation = config::validate(&cfg);
    validation.print_diagnostics();
    if validation.has_errors() {
        return Err("Validation failed".to_string());
    }

    let firewall = FirewallFilter::new(&cfg.firewall).map_err(|e| e.to_string())?;
    if !firewall.is_permissive() {
        info!(
            "Firewall: {} blacklisted, {} whitelisted",
            cfg.firewall.blacklist.len(),
            cfg.firewall.whitelist.len()
        );
    }

    let trace = Trace::load(trace_path).map_err(|e| format!("Failed to load trace: {}", e))?;
    info!(
        "Replaying {} events from {}",
        trace.events.len(),
        trace_path.display()
    );

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;
    let metrics = Arc::new(MetricsRegistry::new());

    let exported = rt
        .block_on(async {
            let mut controller = Controller::new(firewall, cfg.flow, metrics.clone());
            replay(&mut controller, &trace).await?;
            // Per-device stats disappear with their sessions
            let exported = metrics.export();
            controller.shutdown().await;
            Ok::<_, learnswitch::Error>(exported)
        })
        .map_err(|e| e.to_string())?;

    for (name, value) in exported {
        println!("{} {}", name, value);
    }
    Ok(())
}
