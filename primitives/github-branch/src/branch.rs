//! Resolving the base commit and creating the new branch.

use crate::client::RefClient;
use crate::config::Config;
use crate::error::{CreateError, Failure, RequestError};
use crate::types::{BranchReference, CreateRefRequest};
use tracing::{info, warn};

/// Returns the head commit SHA of `config.base_branch`.
///
/// Failures are reported on stderr and collapse to `None`.
pub(crate) async fn resolve_base_sha<C: RefClient>(
    client: &C,
    config: &Config,
) -> Option<String> {
    let result = client
        .get_ref(&config.owner, &config.repo, &config.base_branch)
        .await
        .and_then(|reference| {
            if reference.sha().is_empty() {
                Err(RequestError::EmptySha)
            } else {
                Ok(reference)
            }
        });

    match result {
        Ok(reference) => {
            info!(
                base = %config.base_branch,
                sha = reference.sha(),
                kind = ?reference.object.kind,
                "resolved base branch"
            );
            Some(reference.object.sha)
        }
        Err(e) => {
            warn!(base = %config.base_branch, error = %e, "base branch lookup failed");
            eprintln!("Error fetching base branch SHA: {e}");
            None
        }
    }
}

/// Creates `config.new_branch` at `base_sha`.
pub(crate) async fn try_create_branch<C: RefClient>(
    client: &C,
    config: &Config,
    base_sha: &str,
) -> Result<BranchReference, CreateError> {
    let request = CreateRefRequest::branch(&config.new_branch, base_sha);

    client
        .create_ref(&config.owner, &config.repo, &request)
        .await
        .map_err(|e| CreateError::from_request(&config.new_branch, e))
}

/// Creates `config.new_branch` at `base_sha`, reporting the outcome.
///
/// Returns `true` once the reference exists on the remote.
pub(crate) async fn create_branch<C: RefClient>(
    client: &C,
    config: &Config,
    base_sha: &str,
) -> bool {
    match try_create_branch(client, config, base_sha).await {
        Ok(reference) => {
            info!(reference = %reference.name, url = %reference.url, "branch created");
            println!("✓ Feature branch created successfully!");
            println!("  Branch: {}", reference.name);
            println!("  URL: {}", reference.url);
            true
        }
        Err(e) => {
            warn!(branch = %config.new_branch, error = %e, "branch creation failed");
            eprintln!("{}", failure_line(&e));
            false
        }
    }
}

/// User-facing line for a failed creation.
fn failure_line(err: &CreateError) -> String {
    match err {
        CreateError::AlreadyExists { .. } => format!("✗ Error: {err}"),
        _ => format!("✗ {err}"),
    }
}

/// Resolves the base branch and creates the new branch from it.
///
/// The create request is only sent once the base SHA is known.
pub(crate) async fn run<C: RefClient>(client: &C, config: &Config) -> Result<String, Failure> {
    println!(
        "Creating feature branch '{}' from '{}'...",
        config.new_branch, config.base_branch
    );
    println!();

    println!("Fetching SHA of base branch '{}'...", config.base_branch);
    let Some(base_sha) = resolve_base_sha(client, config).await else {
        eprintln!("{}", Failure::BaseSha);
        return Err(Failure::BaseSha);
    };
    println!("Base branch SHA: {base_sha}");
    println!();

    println!("Creating feature branch from base SHA...");
    if !create_branch(client, config, &base_sha).await {
        return Err(Failure::Create);
    }

    println!();
    println!("Next steps:");
    println!("  git fetch origin");
    println!("  git checkout {}", config.new_branch);

    Ok(base_sha)
}
