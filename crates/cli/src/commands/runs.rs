// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ojc runs` - enqueue and inspect individual runs.

use anyhow::Result;
use clap::{Args, Subcommand};
use oj_core::RunId;

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct RunsArgs {
    #[command(subcommand)]
    pub command: RunsCommand,
}

#[derive(Subcommand)]
pub enum RunsCommand {
    /// Show a single run
    Show {
        /// Run ID
        id: String,
    },
    /// Enqueue a new session-starting run
    Start {
        /// Agent to run
        #[arg(long)]
        agent: String,
        /// Prompt text
        #[arg(long)]
        prompt: String,
        /// Working directory to run the agent in
        #[arg(long)]
        project_dir: Option<String>,
    },
}

pub async fn handle(command: RunsCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        RunsCommand::Show { id } => {
            let id = RunId::from(id);
            let run = client.get_run(&id).await?;
            format_or_json(format, &run, || {
                println!("run_id:     {}", run.run_id);
                println!("session_id: {}", run.session_id);
                println!("type:       {}", run.run_type);
                println!("status:     {}", run.status);
                println!("claimed_by: {}", run.claimed_by.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string()));
            })?;
        }
        RunsCommand::Start { agent, prompt, project_dir } => {
            let response = client.start_run(agent, prompt, project_dir).await?;
            format_or_json(format, &response, || {
                println!("run_id:     {}", response.run_id);
                println!("session_id: {}", response.session_id);
                println!("status:     {}", response.status);
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
