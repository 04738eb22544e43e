//! Error types for each tier of a run.

use thiserror::Error;

/// Configuration problems, detected before any request is made.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("GITHUB_TOKEN environment variable not set")]
    MissingToken,

    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: &'static str },

    #[error("timeout must be greater than zero")]
    InvalidTimeout,

    #[error("repository owner and name must not be empty")]
    MissingRepository,

    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

/// A failed call to the GitHub API.
#[derive(Debug, Error)]
pub(crate) enum RequestError {
    /// DNS, connect, TLS or timeout failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("reference has no commit SHA")]
    EmptySha,

    #[error("API URL cannot carry a path")]
    InvalidBaseUrl,
}

/// Why a branch could not be created.
#[derive(Debug, Error)]
pub(crate) enum CreateError {
    #[error("Branch '{branch}' already exists")]
    AlreadyExists { branch: String },

    #[error("HTTP Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Error creating feature branch: {0}")]
    Transport(RequestError),
}

impl CreateError {
    pub(crate) fn from_request(branch: &str, err: RequestError) -> Self {
        match err {
            RequestError::Status { status: 422, .. } => Self::AlreadyExists {
                branch: branch.to_string(),
            },
            RequestError::Status { status, body } => Self::Status { status, body },
            other => Self::Transport(other),
        }
    }
}

/// Overall outcome of a failed run; every variant exits with status 1.
#[derive(Debug, Error)]
pub(crate) enum Failure {
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch base branch SHA")]
    BaseSha,

    #[error("Failed to create feature branch")]
    Create,
}
