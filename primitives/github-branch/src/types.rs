//! Wire types for the git references API.

use serde::{Deserialize, Serialize};

/// A git reference as returned by `GET`/`POST .../git/refs`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BranchReference {
    #[serde(rename = "ref")]
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) object: GitObject,
}

impl BranchReference {
    /// Commit SHA the reference points at.
    pub(crate) fn sha(&self) -> &str {
        &self.object.sha
    }
}

/// The object a reference points at.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitObject {
    pub(crate) sha: String,
    #[serde(rename = "type", default)]
    pub(crate) kind: Option<String>,
}

/// Body of a create-reference request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub(crate) name: String,
    pub(crate) sha: String,
}

impl CreateRefRequest {
    /// Request for `refs/heads/<branch>` at `sha`.
    pub(crate) fn branch(branch: &str, sha: impl Into<String>) -> Self {
        Self {
            name: format!("refs/heads/{branch}"),
            sha: sha.into(),
        }
    }
}
