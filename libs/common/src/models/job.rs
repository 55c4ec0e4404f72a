//! Background job payloads

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Widths produced for every uploaded image unless configured otherwise
pub const DEFAULT_THUMBNAIL_SIZES: [u32; 3] = [500, 250, 100];

/// A payload that travels through a named job queue
pub trait Job: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the logical queue carrying this job type
    const QUEUE: &'static str;
}

/// Derive resized variants of an uploaded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailJob {
    pub file_id: Uuid,
    pub owner_id: Uuid,
    pub requested_sizes: Vec<u32>,
}

impl Job for ThumbnailJob {
    const QUEUE: &'static str = "fileQueue";
}

/// Greet a freshly registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeJob {
    pub user_id: Uuid,
}

impl Job for WelcomeJob {
    const QUEUE: &'static str = "userQueue";
}
