//! Command-line arguments and the validated run configuration.

use crate::error::ConfigError;
use clap::Parser;
use reqwest::Url;
use std::{fmt, time::Duration};

/// Creates a branch on GitHub pointing at the head of a base branch.
#[derive(Parser, Debug, Clone)]
#[command(name = "github-branch")]
#[command(about = "Creates a GitHub branch from the head of a base branch")]
pub(crate) struct Args {
    /// Name of the branch to create.
    #[arg(env = "GITHUB_BRANCH_NAME", default_value = "feature/test-branch")]
    pub(crate) branch: String,

    /// GitHub token with permission to write refs.
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,

    /// Repository owner.
    #[arg(short, long, env = "GITHUB_BRANCH_OWNER", default_value = "digihood")]
    pub(crate) owner: String,

    /// Repository name.
    #[arg(short, long, env = "GITHUB_BRANCH_REPO", default_value = "freelo-agent-test")]
    pub(crate) repo: String,

    /// Branch whose head commit the new branch starts from.
    #[arg(short, long, env = "GITHUB_BRANCH_BASE", default_value = "main")]
    pub(crate) base: String,

    /// GitHub API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub(crate) api_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "GITHUB_BRANCH_TIMEOUT", default_value = "30")]
    pub(crate) timeout: u64,
}

impl Args {
    /// Validates the arguments into a [`Config`].
    pub(crate) fn into_config(self) -> Result<Config, ConfigError> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .map(Token::new)
            .ok_or(ConfigError::MissingToken)?;

        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(ConfigError::MissingRepository);
        }

        validate_branch_name(&self.branch)?;
        validate_branch_name(&self.base)?;

        let api_url = Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl {
                url: self.api_url,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        if self.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Config {
            token,
            owner: self.owner,
            repo: self.repo,
            base_branch: self.base,
            new_branch: self.branch,
            api_url,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

/// Secret API token. Never printed.
#[derive(Clone)]
pub(crate) struct Token(String);

impl Token {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Everything a run needs, fixed at startup.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) token: Token,
    pub(crate) owner: String,
    pub(crate) repo: String,
    pub(crate) base_branch: String,
    pub(crate) new_branch: String,
    pub(crate) api_url: Url,
    pub(crate) timeout: Duration,
}

/// Checks `name` against git's rules for a branch ref component.
pub(crate) fn validate_branch_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidBranchName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace or control characters"));
    }
    if name.chars().any(|c| matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')) {
        return Err(invalid("contains a forbidden character"));
    }
    if name.contains("..") || name.contains("@{") {
        return Err(invalid("contains '..' or '@{'"));
    }
    if name.starts_with('-') || name.starts_with('/') {
        return Err(invalid("starts with '-' or '/'"));
    }
    if name.ends_with('/') || name.ends_with('.') || name.ends_with(".lock") {
        return Err(invalid("ends with '/', '.' or '.lock'"));
    }
    if name.split('/').any(|part| part.is_empty() || part.starts_with('.')) {
        return Err(invalid("has an empty component or one starting with '.'"));
    }

    Ok(())
}
