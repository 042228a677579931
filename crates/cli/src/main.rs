// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow unwrap/expect in test code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ao: command-line front-end.
//!
//! Each subcommand maps onto one session-manager operation plus output
//! formatting. Long-running polling belongs to the daemon (`aod`); the CLI
//! performs direct, short-lived operations against the same storage root.

use anyhow::{Context, Result};
use ao_adapters::PluginRegistry;
use ao_config::Config;
use ao_core::{ProjectId, SessionId, SystemClock};
use ao_engine::{SessionManager, SpawnRequest};
use ao_storage::MetadataStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ao", about = "Agent Orchestrator", version)]
struct Cli {
    /// Path to the orchestrator configuration file.
    #[arg(long, short, global = true, default_value = "ao.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Spawn a session for one issue.
    Spawn {
        project: String,
        issue: String,
        /// Override the composed prompt.
        #[arg(long)]
        prompt: Option<String>,
        /// Override the branch name.
        #[arg(long)]
        branch: Option<String>,
    },
    /// Spawn sessions for several issues.
    BatchSpawn {
        project: String,
        issues: Vec<String>,
    },
    /// Start the orchestrator daemon (`aod`) for this configuration.
    Start,
    /// List sessions and their statuses.
    Status {
        #[arg(long)]
        project: Option<String>,
    },
    /// Show one session's metadata.
    Session { id: String },
    /// Send a message to a session's agent.
    Send { id: String, message: String },
    /// Kill a session: stop the agent, remove the workspace, archive.
    Kill { id: String },
    /// Recreate workspace and runtime for a dead session.
    Restore { id: String },
    /// Archive terminal sessions older than the given age (e.g. 24h).
    Cleanup {
        #[arg(long, default_value = "24h")]
        older_than: String,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("ao: {:#}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run(cli: Cli) -> Result<()> {
    let config = Arc::new(Config::load(&cli.config)?);
    let state_root = ao_storage::storage_root_for_config(&cli.config)?;
    let registry = Arc::new(PluginRegistry::standard());
    let store = Arc::new(MetadataStore::open(&state_root)?);
    let sm = SessionManager::new(config, registry, store, state_root, SystemClock);

    match cli.command {
        Command::Spawn { project, issue, prompt, branch } => {
            let session = sm
                .spawn(SpawnRequest {
                    project_id: ProjectId::new(project),
                    issue_id: issue,
                    prompt,
                    branch,
                })
                .await?;
            println!("spawned {} on {}", session.id, session.branch.unwrap_or_default());
        }
        Command::BatchSpawn { project, issues } => {
            for issue in issues {
                let request = SpawnRequest {
                    project_id: ProjectId::new(project.clone()),
                    issue_id: issue.clone(),
                    prompt: None,
                    branch: None,
                };
                match sm.spawn(request).await {
                    Ok(session) => println!("spawned {} for {}", session.id, issue),
                    Err(e) => eprintln!("ao: {}: {:#}", issue, anyhow::Error::from(e)),
                }
            }
        }
        Command::Start => {
            // aod is installed alongside ao.
            let daemon = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join("aod")))
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("aod"));
            let child = std::process::Command::new(&daemon)
                .arg("--config")
                .arg(&cli.config)
                .spawn()
                .with_context(|| format!("failed to start {}", daemon.display()))?;
            println!("started aod (pid {})", child.id());
        }
        Command::Status { project } => {
            let filter = project.map(ProjectId::new);
            let sessions = sm.list(filter.as_ref()).await?;
            if sessions.is_empty() {
                println!("no sessions");
            }
            for session in sessions {
                println!(
                    "{:<16} {:<18} {:<10} {}",
                    session.id,
                    session.status,
                    session.project_id,
                    session.issue_id.unwrap_or_default()
                );
            }
        }
        Command::Session { id } => {
            let id = SessionId::new(id);
            let map = sm
                .store()
                .read(&id)?
                .with_context(|| format!("session not found: {}", id))?;
            for (key, value) in map {
                println!("{}={}", key, value);
            }
        }
        Command::Send { id, message } => {
            sm.send(&SessionId::new(id), &message).await?;
        }
        Command::Kill { id } => {
            let report = sm.kill(&SessionId::new(id.clone())).await?;
            for error in &report.errors {
                eprintln!("ao: kill {}: {}", id, error);
            }
            println!("killed {}", id);
        }
        Command::Restore { id } => {
            let session = sm.restore(&SessionId::new(id)).await?;
            println!("restored {} ({})", session.id, session.status);
        }
        Command::Cleanup { older_than } => {
            let age = parse_age(&older_than)?;
            let cleaned = sm.cleanup(age).await?;
            println!("cleaned up {} session(s)", cleaned.len());
            for id in cleaned {
                println!("  {}", id);
            }
        }
    }
    Ok(())
}

fn parse_age(s: &str) -> Result<Duration> {
    ao_config::parse_duration(s).map_err(|e| anyhow::anyhow!("invalid --older-than: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        hours   = { "24h", 86400 },
        minutes = { "30m", 1800 },
        bare    = { "90", 90 },
    )]
    fn parse_age_accepts_duration_expressions(input: &str, secs: u64) {
        assert_eq!(parse_age(input).unwrap(), Duration::from_secs(secs));
    }

    #[test]
    fn parse_age_rejects_garbage() {
        assert!(parse_age("soon").is_err());
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
