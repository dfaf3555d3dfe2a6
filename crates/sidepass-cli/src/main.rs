mod config;
mod evaluate_cmd;
mod replay_cmd;
mod snapshot;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use sidepass_core::scenario::CurrentScenario;
use sidepass_core::stage::stage_factory;
use sidepass_core::types::{ScenarioStatus, ScenarioType};

use config::ResolvedConfig;

#[derive(Parser)]
#[command(
    name = "sidepass",
    about = "Replay side-pass scenario decisions against recorded planning snapshots"
)]
struct Cli {
    /// Scenario config file (overrides SIDEPASS_CONFIG env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the transfer decision for a single snapshot
    Evaluate {
        /// Snapshot file (JSON frame)
        snapshot: PathBuf,
        /// Scenario the planner is currently running
        #[arg(long, default_value = "lane_follow")]
        current: ScenarioType,
        /// Status of the current scenario
        #[arg(long, default_value = "processing")]
        status: ScenarioStatus,
        /// Obstacle remembered from earlier cycles
        #[arg(long)]
        tracked: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drive snapshots through the planner loop, one line per cycle
    Replay {
        /// Snapshot files (JSON frame, JSON array, or .jsonl), in order
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Print one JSON object per cycle
        #[arg(long)]
        json: bool,
    },
    /// List registered stage types and the configured pipeline
    Stages,
    /// Scenario config management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved scenario config and where it came from
    Show,
    /// Write the default scenario config to ~/.config/sidepass/config.toml
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            snapshot,
            current,
            status,
            tracked,
            json,
        } => {
            let resolved = ResolvedConfig::resolve(cli.config.as_deref())?;
            cmd_evaluate(
                &resolved,
                &snapshot,
                CurrentScenario::new(current, status),
                tracked.as_deref(),
                json,
            )?;
        }
        Commands::Replay { snapshots, json } => {
            let resolved = ResolvedConfig::resolve(cli.config.as_deref())?;
            cmd_replay(&resolved, &snapshots, json)?;
        }
        Commands::Stages => {
            let resolved = ResolvedConfig::resolve(cli.config.as_deref())?;
            cmd_stages(&resolved);
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let resolved = ResolvedConfig::resolve(cli.config.as_deref())?;
                cmd_config_show(&resolved)?;
            }
            ConfigCommands::Init { force } => {
                let path = config::config_path();
                config::write_default_config(&path, force)?;
                println!("Config written to {}", path.display());
            }
        },
    }

    Ok(())
}

fn cmd_evaluate(
    resolved: &ResolvedConfig,
    snapshot: &Path,
    current: CurrentScenario,
    tracked: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let frames = snapshot::load_frames(snapshot)?;
    let [frame] = frames.as_slice() else {
        bail!(
            "{} holds {} frames; evaluate takes exactly one (use `sidepass replay`)",
            snapshot.display(),
            frames.len()
        );
    };

    let report = evaluate_cmd::evaluate(&resolved.scenario, frame, current, tracked);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        evaluate_cmd::print_report(&report);
    }
    Ok(())
}

fn cmd_replay(resolved: &ResolvedConfig, snapshots: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let mut frames = Vec::new();
    for path in snapshots {
        frames.extend(snapshot::load_frames(path)?);
    }
    tracing::info!(
        frames = frames.len(),
        config = %resolved.source,
        "replaying snapshots"
    );

    for report in replay_cmd::run_replay(&resolved.scenario, &frames) {
        if json {
            println!(
                "{}",
                serde_json::to_string(&report).context("failed to serialize cycle report")?
            );
        } else {
            println!("{report}");
            if let Some(message) = &report.message {
                println!("      {message}");
            }
        }
    }
    Ok(())
}

fn cmd_stages(resolved: &ResolvedConfig) {
    let pipeline = &resolved.scenario.stage_type;
    println!("Registered stages:");
    for stage_type in stage_factory().registered_types() {
        let position = pipeline
            .iter()
            .position(|t| *t == stage_type)
            .map(|idx| format!("#{}", idx + 1))
            .unwrap_or_else(|| "-".to_string());
        let enabled = resolved
            .scenario
            .stage_config(stage_type)
            .map(|c| if c.enabled { "enabled" } else { "disabled" })
            .unwrap_or("unconfigured");
        let name = stage_type.to_string();
        println!("  {position:>3}  {name:<30} {enabled}");
    }
}

fn cmd_config_show(resolved: &ResolvedConfig) -> anyhow::Result<()> {
    println!("# source: {}", resolved.source);
    let contents =
        toml::to_string_pretty(&resolved.scenario).context("failed to serialize config")?;
    print!("{contents}");
    Ok(())
}
