// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::{CommandFactory, FromArgMatches};

#[test]
fn sessions_args_is_a_valid_clap_command() {
    SessionsArgs::command().debug_assert();
}

#[test]
fn show_parses_a_bare_session_id() {
    let args = SessionsArgs::command().no_binary_name(true).try_get_matches_from(["show", "sess_abc123"]).expect("parse");
    let command = SessionsCommand::from_arg_matches(&args).expect("from_arg_matches");
    match command {
        SessionsCommand::Show { id } => assert_eq!(id, "sess_abc123"),
        _ => panic!("expected Show"),
    }
}

#[test]
fn list_takes_no_arguments() {
    let args = SessionsArgs::command().no_binary_name(true).try_get_matches_from(["list"]).expect("parse");
    let command = SessionsCommand::from_arg_matches(&args).expect("from_arg_matches");
    assert!(matches!(command, SessionsCommand::List));
}
