//! Git Deploy Agent - 轮询式持续部署代理
//!
//! Usage:
//! - Normal mode: `git-deploy-agent` (reads `config.json`)
//! - Custom config: `git-deploy-agent --config /etc/deploy-agent/config.json`
//! - Single cycle: `git-deploy-agent --once`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use git_deploy_agent::config::env::constants::DEFAULT_CONFIG_PATH;
use git_deploy_agent::{logging, AgentConfig, RunOptions};

/// Polling deploy agent: pull, build, install and restart on new commits
#[derive(Debug, Parser)]
#[command(name = "git-deploy-agent", version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the log file from the config
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run a single reconciliation cycle and exit
    #[arg(long)]
    once: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AgentConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }

    if let Err(e) = logging::init(&config.log_file) {
        eprintln!("Log file error ({}): {}", config.log_file.display(), e);
        return ExitCode::FAILURE;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions { once: cli.once };
    match rt.block_on(git_deploy_agent::run_agent(config, options)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start deploy agent");
            ExitCode::FAILURE
        }
    }
}
