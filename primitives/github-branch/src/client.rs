//! GitHub git-references API client.

use crate::config::{Config, Token};
use crate::error::RequestError;
use crate::types::{BranchReference, CreateRefRequest};
use reqwest::{Client, ClientBuilder, RequestBuilder, Url, header::ACCEPT};
use tracing::debug;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Reads and writes git references in a repository.
pub(crate) trait RefClient {
    /// Fetches `refs/heads/<branch>`.
    async fn get_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchReference, RequestError>;

    /// Creates the reference described by `request`.
    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        request: &CreateRefRequest,
    ) -> Result<BranchReference, RequestError>;
}

/// [`RefClient`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub(crate) struct GitHubClient {
    http: Client,
    api_url: Url,
    token: Token,
}

impl GitHubClient {
    /// Builds a client for `config.api_url` with the configured timeout.
    pub(crate) fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_builder(Client::builder(), config)
    }

    /// Like [`GitHubClient::new`], starting from a preconfigured `builder`.
    pub(crate) fn with_builder(
        builder: ClientBuilder,
        config: &Config,
    ) -> Result<Self, reqwest::Error> {
        let http = builder
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Appends `segments` to the API URL, percent-encoding each one.
    pub(crate) fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, RequestError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| RequestError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.token.expose())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    /// Sends `request` and decodes a 2xx JSON body into a reference.
    async fn send(&self, request: RequestBuilder) -> Result<BranchReference, RequestError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "GitHub responded");

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, "failed to read error response body");
                    String::new()
                }
            };
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl RefClient for GitHubClient {
    async fn get_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchReference, RequestError> {
        // Branch names keep `/` as a path separator; every other byte is encoded.
        let base = ["repos", owner, repo, "git", "refs", "heads"];
        let url = self.endpoint(base.into_iter().chain(branch.split('/')))?;
        debug!(%url, "GET reference");

        self.send(self.http.get(url)).await
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        request: &CreateRefRequest,
    ) -> Result<BranchReference, RequestError> {
        let url = self.endpoint(["repos", owner, repo, "git", "refs"])?;
        debug!(%url, reference = %request.name, "POST reference");

        self.send(self.http.post(url).json(request)).await
    }
}
