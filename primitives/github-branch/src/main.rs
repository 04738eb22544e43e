//! GitHub Branch - Create a Branch via the GitHub REST API
//!
//! Looks up the head commit of a base branch and creates a new branch that
//! points at it. Runs once and exits: 0 when the branch was created, 1 on any
//! failure (missing token, failed lookup, failed creation).
//!
//! # Usage
//!
//! ```bash
//! # Create feature/test-branch from main
//! GITHUB_TOKEN=ghp_... github-branch
//!
//! # Create a named branch from another base
//! github-branch feature/login --base develop
//!
//! # Target a different repository
//! github-branch fix/typo --owner octo --repo demo
//! ```
//!
//! Set `RUST_LOG=debug` to trace the requests.

mod branch;
mod client;
mod config;
mod error;
#[cfg(test)]
mod testing;
mod types;

use branch::run;
use clap::{Parser, error::ErrorKind};
use client::{GitHubClient, RefClient};
use config::{Args, Config};
use error::Failure;
use std::{ffi::OsString, process::ExitCode};
use tracing_subscriber::EnvFilter;

/// Parses `argv`; usage errors are printed and become a failed run.
///
/// `--help` and `--version` print and exit with status 0 as usual.
fn parse_args<I, T>(argv: I) -> Result<Args, Failure>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(argv) {
        Ok(args) => Ok(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            Err(Failure::Usage(e))
        }
    }
}

/// Builds the configuration and client, then runs the branch creation.
///
/// Configuration errors return before `connect` is called, so no request is
/// ever made without a token.
async fn execute<C, F>(args: Args, connect: F) -> Result<String, Failure>
where
    C: RefClient,
    F: FnOnce(&Config) -> Result<C, reqwest::Error>,
{
    let config = args.into_config().map_err(|e| {
        eprintln!("Error: {e}");
        Failure::from(e)
    })?;

    let client = connect(&config).map_err(|e| {
        eprintln!("Error: failed to build HTTP client: {e}");
        Failure::Client(e)
    })?;

    run(&client, &config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Ok(args) = parse_args(std::env::args_os()) else {
        return ExitCode::FAILURE;
    };

    match execute(args, GitHubClient::new).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
