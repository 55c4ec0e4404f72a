//! API models for request and response payloads

use common::models::{FileKind, FileNode, Parent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for uploading a folder, file or image
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// `0`, `"0"`, absent or a folder id
    pub parent_id: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    /// Base64 encoded content, required unless uploading a folder
    pub data: Option<String>,
}

/// Query of the listing endpoint
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub parent_id: Option<String>,
    pub page: Option<String>,
}

/// Query of the content endpoint
#[derive(Deserialize)]
pub struct DataQuery {
    pub size: Option<String>,
}

/// A node as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub is_public: bool,
    pub parent_id: Parent,
}

impl From<FileNode> for NodeResponse {
    fn from(node: FileNode) -> Self {
        Self {
            id: node.id,
            user_id: node.owner_id,
            name: node.name,
            kind: node.kind,
            is_public: node.is_public,
            parent_id: node.parent,
        }
    }
}

/// Liveness of the backing services
#[derive(Serialize)]
pub struct StatusResponse {
    pub redis: bool,
    pub db: bool,
}

/// Object counts
#[derive(Serialize)]
pub struct StatsResponse {
    pub users: i64,
    pub files: i64,
}
