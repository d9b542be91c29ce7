// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ojc` - operator CLI for the Coordinator.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::{runs, sessions};
use output::OutputFormat;

const DEFAULT_SERVER: &str = "http://127.0.0.1:4287";

#[derive(Parser)]
#[command(name = "ojc", version, about = "Operator CLI for the Coordinator")]
struct Cli {
    /// Coordinator base URL
    #[arg(long, env = "OJ_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Bearer token, if the Coordinator has auth enabled
    #[arg(long, env = "OJ_TOKEN")]
    token: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and control sessions
    Sessions(sessions::SessionsArgs),
    /// Enqueue and inspect runs
    Runs(runs::RunsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DaemonClient::new(cli.server, cli.token);

    match cli.command {
        Command::Sessions(args) => sessions::handle(args.command, &client, cli.output).await,
        Command::Runs(args) => runs::handle(args.command, &client, cli.output).await,
    }
}
