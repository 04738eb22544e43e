//! Test doubles: an in-memory [`RefClient`] and a mock GitHub API server.

use crate::client::{GitHubClient, RefClient};
use crate::config::{Config, Token};
use crate::error::RequestError;
use crate::types::{BranchReference, CreateRefRequest, GitObject};
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::{StreamExt, stream};
use reqwest::Url;
use serde_json::{Value, json};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{net::TcpListener, sync::Mutex};

#[allow(clippy::expect_used)]
pub(crate) fn test_config(branch: &str) -> Config {
    Config {
        token: Token::new("test-token"),
        owner: "octo".to_string(),
        repo: "demo".to_string(),
        base_branch: "main".to_string(),
        new_branch: branch.to_string(),
        api_url: Url::parse("http://127.0.0.1:9").expect("static URL parses"),
        timeout: Duration::from_secs(5),
    }
}

/// Client that ignores proxy settings so loopback servers are reached directly.
pub(crate) fn local_client(config: &Config) -> Result<GitHubClient, reqwest::Error> {
    GitHubClient::with_builder(reqwest::Client::builder().no_proxy(), config)
}

pub(crate) fn reference(name: &str, sha: &str) -> BranchReference {
    BranchReference {
        name: name.to_string(),
        url: format!("https://api.github.com/repos/octo/demo/git/{name}"),
        object: GitObject {
            sha: sha.to_string(),
            kind: Some("commit".to_string()),
        },
    }
}

/// In-memory [`RefClient`] that records every call.
pub(crate) struct FakeClient {
    lookup: Result<BranchReference, (u16, String)>,
    create_status: Option<(u16, String)>,
    get_calls: Mutex<Vec<String>>,
    created: Mutex<Vec<CreateRefRequest>>,
}

impl FakeClient {
    pub(crate) fn resolving(sha: &str) -> Self {
        Self::with_lookup(Ok(reference("refs/heads/main", sha)))
    }

    pub(crate) fn failing_lookup(status: u16, body: &str) -> Self {
        Self::with_lookup(Err((status, body.to_string())))
    }

    fn with_lookup(lookup: Result<BranchReference, (u16, String)>) -> Self {
        Self {
            lookup,
            create_status: None,
            get_calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Makes every create request fail with `status`.
    pub(crate) fn with_create_status(mut self, status: u16, body: &str) -> Self {
        self.create_status = Some((status, body.to_string()));
        self
    }

    pub(crate) async fn get_calls(&self) -> Vec<String> {
        self.get_calls.lock().await.clone()
    }

    pub(crate) async fn created(&self) -> Vec<CreateRefRequest> {
        self.created.lock().await.clone()
    }
}

impl RefClient for FakeClient {
    async fn get_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchReference, RequestError> {
        self.get_calls
            .lock()
            .await
            .push(format!("{owner}/{repo}:{branch}"));

        self.lookup
            .clone()
            .map_err(|(status, body)| RequestError::Status { status, body })
    }

    async fn create_ref(
        &self,
        _owner: &str,
        _repo: &str,
        request: &CreateRefRequest,
    ) -> Result<BranchReference, RequestError> {
        self.created.lock().await.push(request.clone());

        match &self.create_status {
            Some((status, body)) => Err(RequestError::Status {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(reference(&request.name, &request.sha)),
        }
    }
}

/// Behaviour of a [`MockGitHub`] server.
pub(crate) struct MockOptions {
    pub(crate) base_sha: String,
    pub(crate) create_status: StatusCode,
    /// Pause before answering a reference lookup.
    pub(crate) lookup_delay: Duration,
    /// Pause before answering a create request.
    pub(crate) create_delay: Duration,
    /// Cut the connection partway through a non-2xx create response body.
    pub(crate) broken_error_body: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            base_sha: "deadbeef".to_string(),
            create_status: StatusCode::CREATED,
            lookup_delay: Duration::ZERO,
            create_delay: Duration::ZERO,
            broken_error_body: false,
        }
    }
}

/// Request as seen by the mock server.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub(crate) method: &'static str,
    pub(crate) path: String,
    pub(crate) authorization: Option<String>,
    pub(crate) accept: Option<String>,
    pub(crate) body: String,
}

struct MockState {
    options: MockOptions,
    hits: AtomicUsize,
    requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    async fn record(
        &self,
        method: &'static str,
        uri: &Uri,
        headers: &HeaderMap,
        body: String,
        delay: Duration,
    ) {
        self.hits.fetch_add(1, Ordering::SeqCst);

        let value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        self.requests.lock().await.push(Recorded {
            method,
            path: uri.path().to_string(),
            authorization: value(header::AUTHORIZATION),
            accept: value(header::ACCEPT),
            body,
        });

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// GitHub git-refs API served from a local socket.
pub(crate) struct MockGitHub {
    pub(crate) url: String,
    state: Arc<MockState>,
}

impl MockGitHub {
    pub(crate) async fn start(options: MockOptions) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            options,
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/repos/{owner}/{repo}/git/refs/heads/{*branch}", get(get_ref))
            .route("/repos/{owner}/{repo}/git/refs", post(create_ref))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url: format!("http://{addr}"),
            state,
        })
    }

    pub(crate) fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub(crate) async fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().await.clone()
    }
}

/// Address with nothing listening on it.
pub(crate) async fn unreachable_url() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

async fn get_ref(
    State(state): State<Arc<MockState>>,
    Path((owner, repo, branch)): Path<(String, String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let delay = state.options.lookup_delay;
    state.record("GET", &uri, &headers, String::new(), delay).await;

    Json(json!({
        "ref": format!("refs/heads/{branch}"),
        "url": format!("https://api.github.com/repos/{owner}/{repo}/git/refs/heads/{branch}"),
        "object": { "type": "commit", "sha": state.options.base_sha },
    }))
    .into_response()
}

async fn create_ref(
    State(state): State<Arc<MockState>>,
    Path((owner, repo)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let delay = state.options.create_delay;
    state.record("POST", &uri, &headers, body.clone(), delay).await;

    let status = state.options.create_status;
    if !status.is_success() && state.options.broken_error_body {
        let chunks = stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(b"{\"message\":")) }).chain(
            stream::once(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(std::io::Error::other("connection reset"))
            }),
        );
        return (status, Body::from_stream(chunks)).into_response();
    }
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return (status, Json(json!({ "message": "Reference already exists" }))).into_response();
    }
    if !status.is_success() {
        return (status, "upstream unavailable").into_response();
    }

    let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let name = request["ref"].as_str().unwrap_or_default().to_string();
    let sha = request["sha"].as_str().unwrap_or_default().to_string();

    (
        status,
        Json(json!({
            "ref": name,
            "url": format!("https://api.github.com/repos/{owner}/{repo}/git/{name}"),
            "object": { "type": "commit", "sha": sha },
        })),
    )
        .into_response()
}
