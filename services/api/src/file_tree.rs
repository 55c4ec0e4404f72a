//! File tree of every user
//!
//! [`FileTree`] owns node metadata and content. It enforces the hierarchy
//! invariants (a parent is the root or a folder of the same owner), keeps
//! content out of the metadata store, and hands image uploads to the
//! thumbnail queue.
//!
//! Queries never tell "does not exist" apart from "exists but is not yours":
//! both are [`TreeError::NotFound`].

use common::{
    models::{ContentRef, FileKind, FileNode, NewFileNode, Parent, ThumbnailJob, Variant},
    queue::JobQueue,
    repositories::FileRepository,
    storage::BlobStore,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Number of nodes per listing page
pub const PAGE_SIZE: u64 = 20;

/// Errors returned by file tree operations
#[derive(Error, Debug)]
pub enum TreeError {
    /// Absent, or not visible to the requester
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    /// The parent is not one of the owner's folders
    #[error("{0}")]
    InvalidParent(&'static str),

    /// Metadata store, blob store or queue failure
    #[error("Infrastructure failure: {0}")]
    Infrastructure(#[from] anyhow::Error),
}

pub type TreeResult<T> = Result<T, TreeError>;

/// File and folder metadata plus content of all users
#[derive(Clone)]
pub struct FileTree {
    files: Arc<dyn FileRepository>,
    blobs: Arc<dyn BlobStore>,
    thumbnails: Arc<dyn JobQueue<ThumbnailJob>>,
    thumbnail_sizes: Vec<u32>,
}

impl FileTree {
    pub fn new(
        files: Arc<dyn FileRepository>,
        blobs: Arc<dyn BlobStore>,
        thumbnails: Arc<dyn JobQueue<ThumbnailJob>>,
        thumbnail_sizes: Vec<u32>,
    ) -> Self {
        Self {
            files,
            blobs,
            thumbnails,
            thumbnail_sizes,
        }
    }

    /// Widths requested for every uploaded image
    pub fn thumbnail_sizes(&self) -> &[u32] {
        &self.thumbnail_sizes
    }

    /// Map a requested size onto a readable variant
    ///
    /// Only configured thumbnail widths select a thumbnail; anything else
    /// reads the original content.
    pub fn variant_for(&self, size: Option<&str>) -> Variant {
        size.and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|n| self.thumbnail_sizes.contains(n))
            .map_or(Variant::Original, Variant::Size)
    }

    async fn validate_parent(&self, owner_id: Uuid, parent: Parent) -> TreeResult<()> {
        let Parent::Folder(parent_id) = parent else {
            return Ok(());
        };

        match self.files.find_owned(parent_id, owner_id).await? {
            None => Err(TreeError::InvalidParent("Parent not found")),
            Some(node) if !node.is_folder() => {
                Err(TreeError::InvalidParent("Parent is not a folder"))
            }
            Some(_) => Ok(()),
        }
    }

    fn validate_name(name: &str) -> TreeResult<()> {
        if name.trim().is_empty() {
            return Err(TreeError::BadRequest("Missing name".to_string()));
        }
        Ok(())
    }

    /// Create a folder
    pub async fn create_folder(
        &self,
        owner_id: Uuid,
        name: &str,
        parent: Parent,
        is_public: bool,
    ) -> TreeResult<FileNode> {
        Self::validate_name(name)?;
        self.validate_parent(owner_id, parent).await?;

        let node = self
            .files
            .insert(&NewFileNode {
                owner_id,
                name: name.to_string(),
                kind: FileKind::Folder,
                is_public,
                parent,
                content: None,
            })
            .await?;

        info!("Created folder {} for user {}", node.id, owner_id);
        Ok(node)
    }

    /// Create a file or an image holding `bytes`
    ///
    /// The content is stored before the metadata, and an image's thumbnail
    /// job is queued only once its metadata exists.
    pub async fn create_file(
        &self,
        owner_id: Uuid,
        name: &str,
        kind: FileKind,
        parent: Parent,
        is_public: bool,
        bytes: &[u8],
    ) -> TreeResult<FileNode> {
        if !kind.has_content() {
            return Err(TreeError::BadRequest(
                "A folder doesn't have content".to_string(),
            ));
        }
        Self::validate_name(name)?;
        self.validate_parent(owner_id, parent).await?;

        let content = ContentRef::generate();
        self.blobs.write(content.as_str(), bytes).await?;
        debug!("Stored {} bytes as {}", bytes.len(), content);

        let node = self
            .files
            .insert(&NewFileNode {
                owner_id,
                name: name.to_string(),
                kind,
                is_public,
                parent,
                content: Some(content),
            })
            .await?;

        info!("Created {} {} for user {}", kind, node.id, owner_id);

        if kind == FileKind::Image {
            self.thumbnails
                .enqueue(&ThumbnailJob {
                    file_id: node.id,
                    owner_id,
                    requested_sizes: self.thumbnail_sizes.clone(),
                })
                .await?;
            debug!("Queued thumbnails for image {}", node.id);
        }

        Ok(node)
    }

    /// Fetch a node the requester owns or that is public
    pub async fn get(&self, id: Uuid, requester_id: Uuid) -> TreeResult<FileNode> {
        self.files
            .find_by_id(id)
            .await?
            .filter(|node| node.is_visible_to(Some(requester_id)))
            .ok_or(TreeError::NotFound)
    }

    /// One page of the owner's nodes directly under `parent`
    pub async fn list(
        &self,
        owner_id: Uuid,
        parent: Parent,
        page: u64,
    ) -> TreeResult<Vec<FileNode>> {
        let skip = page.saturating_mul(PAGE_SIZE);
        Ok(self
            .files
            .list_children(owner_id, parent, skip, PAGE_SIZE)
            .await?)
    }

    /// Publish or unpublish a node; only its owner may do so
    pub async fn set_visibility(
        &self,
        id: Uuid,
        requester_id: Uuid,
        public: bool,
    ) -> TreeResult<FileNode> {
        let node = self
            .files
            .set_public(id, requester_id, public)
            .await?
            .ok_or(TreeError::NotFound)?;

        info!("Set visibility of {} to public={}", id, public);
        Ok(node)
    }

    /// Read the content of a node, or of one of its thumbnails
    ///
    /// `requester_id` is `None` for anonymous readers. A thumbnail that was
    /// not generated yet reads as [`TreeError::NotFound`].
    pub async fn read_content(
        &self,
        id: Uuid,
        requester_id: Option<Uuid>,
        variant: Variant,
    ) -> TreeResult<(FileNode, Vec<u8>)> {
        let node = self
            .files
            .find_by_id(id)
            .await?
            .filter(|node| node.is_visible_to(requester_id))
            .ok_or(TreeError::NotFound)?;

        let Some(content) = node.content.as_ref() else {
            return Err(TreeError::BadRequest(
                "A folder doesn't have content".to_string(),
            ));
        };

        let bytes = self
            .blobs
            .read(&content.variant(variant))
            .await?
            .ok_or(TreeError::NotFound)?;

        Ok((node, bytes))
    }

    /// Number of stored nodes
    pub async fn node_count(&self) -> TreeResult<i64> {
        Ok(self.files.count().await?)
    }
}
