//! quest — entry point for replaying governance action scripts.

mod config;
mod script;

use clap::Parser;
use config::CliConfig;
use quest_utils::LogFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quest", about = "Quest governance ledger simulator")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, env = "QUEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive, overriding the config file.
    #[arg(long, env = "QUEST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "QUEST_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON action script and print emitted events as JSON lines.
    Run {
        /// Script file to replay.
        path: PathBuf,

        /// Exit with an error if any step is rejected.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let format = cli.log_format.unwrap_or(config.log.format);
    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    quest_utils::init_logging(format, level)?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Run { path, strict } => {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
            let parsed = script::parse_script(&contents)?;
            tracing::info!(
                script = %path.display(),
                steps = parsed.steps.len(),
                governor = %config.governance.governor,
                "replaying script"
            );

            let mut simulation = script::Simulation::new(&config, &parsed.balances);
            let stdout = std::io::stdout();
            let summary = simulation.run(&parsed.steps, &mut stdout.lock())?;
            tracing::info!(
                steps = summary.steps,
                failed = summary.failed,
                events = summary.events,
                proposals = simulation.orchestrator().proposal_ids().len(),
                "replay finished"
            );

            anyhow::ensure!(
                !strict || summary.failed == 0,
                "{} of {} steps were rejected",
                summary.failed,
                summary.steps
            );
        }
    }
    Ok(())
}
