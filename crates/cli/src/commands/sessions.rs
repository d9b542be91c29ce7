// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ojc sessions` - session inspection and control.

use anyhow::Result;
use clap::{Args, Subcommand};
use oj_core::SessionId;

use crate::client::DaemonClient;
use crate::output::{format_or_json, handle_list, OutputFormat};

#[derive(Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List all sessions
    List,
    /// Show a single session
    Show {
        /// Session ID
        id: String,
    },
    /// Stop a running session
    Stop {
        /// Session ID
        id: String,
    },
    /// Show a session's ordered events
    Events {
        /// Session ID
        id: String,
    },
}

pub async fn handle(command: SessionsCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SessionsCommand::List => {
            let sessions = client.list_sessions().await?;
            handle_list(format, &sessions, "No sessions", |sessions| {
                println!("{:<28} {:<10} AGENT", "SESSION", "STATUS");
                for session in sessions {
                    println!(
                        "{:<28} {:<10} {}",
                        session.session_id,
                        session.status,
                        session.agent_name.as_deref().unwrap_or("-")
                    );
                }
            })?;
        }
        SessionsCommand::Show { id } => {
            let id = SessionId::from(id);
            let session = client.get_session(&id).await?;
            format_or_json(format, &session, || {
                println!("session_id:   {}", session.session_id);
                println!("status:       {}", session.status);
                println!("agent_name:   {}", session.agent_name.as_deref().unwrap_or("-"));
                println!("project_dir:  {}", session.project_dir.as_deref().unwrap_or("-"));
                println!("hostname:     {}", session.hostname.as_deref().unwrap_or("-"));
                if let Some(parent) = &session.parent_session_id {
                    println!("parent:       {parent}");
                }
            })?;
        }
        SessionsCommand::Stop { id } => {
            let id = SessionId::from(id);
            let result = client.stop_session(&id).await?;
            format_or_json(format, &result, || {
                println!("session {id} stop requested, run status: {}", result.status);
            })?;
        }
        SessionsCommand::Events { id } => {
            let id = SessionId::from(id);
            let events = client.get_events(&id).await?;
            format_or_json(format, &events.events, || {
                for event in &events.events {
                    println!("{event}");
                }
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
