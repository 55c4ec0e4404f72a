//! File repository for the `files` collection

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{ContentRef, FileNode, NewFileNode, Parent};

/// Access to file tree nodes
///
/// Listing order is insertion order, which stays stable across pages.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a node and return it with its generated id
    async fn insert(&self, node: &NewFileNode) -> Result<FileNode>;

    /// Find a node by ID regardless of owner
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileNode>>;

    /// Find a node by ID only if it belongs to `owner_id`
    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<FileNode>>;

    /// Children of `parent` owned by `owner_id`, in creation order
    async fn list_children(
        &self,
        owner_id: Uuid,
        parent: Parent,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<FileNode>>;

    /// Update the visibility of a node owned by `owner_id`
    ///
    /// Returns the updated node, or `None` when no such owned node exists.
    async fn set_public(&self, id: Uuid, owner_id: Uuid, public: bool)
    -> Result<Option<FileNode>>;

    /// Number of stored nodes
    async fn count(&self) -> Result<i64>;
}

/// PostgreSQL file repository
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

const NODE_COLUMNS: &str =
    "id, owner_id, name, type, is_public, parent_id, content_ref, created_at";

impl PgFileRepository {
    /// Create a new file repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn node_from_row(row: &PgRow) -> Result<FileNode> {
        let kind: String = row.try_get("type")?;
        let parent_id: Option<Uuid> = row.try_get("parent_id")?;
        let content_ref: Option<String> = row.try_get("content_ref")?;

        Ok(FileNode {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            kind: kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Corrupt file row: {}", e))?,
            is_public: row.try_get("is_public")?,
            parent: Parent::from(parent_id),
            content: content_ref.map(ContentRef::from),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, node: &NewFileNode) -> Result<FileNode> {
        info!("Inserting {} {} for owner {}", node.kind, node.name, node.owner_id);

        let query = format!(
            r#"
            INSERT INTO files (id, owner_id, name, type, is_public, parent_id, content_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            NODE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(node.owner_id)
            .bind(&node.name)
            .bind(node.kind.as_str())
            .bind(node.is_public)
            .bind(node.parent.folder_id())
            .bind(node.content.as_ref().map(ContentRef::as_str))
            .fetch_one(&self.pool)
            .await?;

        Self::node_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileNode>> {
        let query = format!("SELECT {} FROM files WHERE id = $1", NODE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::node_from_row).transpose()
    }

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<FileNode>> {
        let query = format!(
            "SELECT {} FROM files WHERE id = $1 AND owner_id = $2",
            NODE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::node_from_row).transpose()
    }

    async fn list_children(
        &self,
        owner_id: Uuid,
        parent: Parent,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<FileNode>> {
        let query = format!(
            r#"
            SELECT {}
            FROM files
            WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2
            ORDER BY seq ASC
            LIMIT $3 OFFSET $4
            "#,
            NODE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(owner_id)
            .bind(parent.folder_id())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(skip).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::node_from_row).collect()
    }

    async fn set_public(
        &self,
        id: Uuid,
        owner_id: Uuid,
        public: bool,
    ) -> Result<Option<FileNode>> {
        let query = format!(
            r#"
            UPDATE files SET is_public = $3
            WHERE id = $1 AND owner_id = $2
            RETURNING {}
            "#,
            NODE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner_id)
            .bind(public)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::node_from_row).transpose()
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(any(test, feature = "memory"))]
pub use self::memory::MemoryFileRepository;

#[cfg(any(test, feature = "memory"))]
mod memory {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-process file repository; the vector order is the creation order
    #[derive(Clone, Default)]
    pub struct MemoryFileRepository {
        nodes: Arc<RwLock<Vec<FileNode>>>,
    }

    impl MemoryFileRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl FileRepository for MemoryFileRepository {
        async fn insert(&self, node: &NewFileNode) -> Result<FileNode> {
            let stored = FileNode {
                id: Uuid::new_v4(),
                owner_id: node.owner_id,
                name: node.name.clone(),
                kind: node.kind,
                is_public: node.is_public,
                parent: node.parent,
                content: node.content.clone(),
                created_at: Utc::now(),
            };
            self.nodes.write().await.push(stored.clone());
            Ok(stored)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<FileNode>> {
            let nodes = self.nodes.read().await;
            Ok(nodes.iter().find(|n| n.id == id).cloned())
        }

        async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<FileNode>> {
            let nodes = self.nodes.read().await;
            Ok(nodes
                .iter()
                .find(|n| n.id == id && n.owner_id == owner_id)
                .cloned())
        }

        async fn list_children(
            &self,
            owner_id: Uuid,
            parent: Parent,
            skip: u64,
            limit: u64,
        ) -> Result<Vec<FileNode>> {
            let nodes = self.nodes.read().await;
            Ok(nodes
                .iter()
                .filter(|n| n.owner_id == owner_id && n.parent == parent)
                .skip(skip as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn set_public(
            &self,
            id: Uuid,
            owner_id: Uuid,
            public: bool,
        ) -> Result<Option<FileNode>> {
            let mut nodes = self.nodes.write().await;
            Ok(nodes
                .iter_mut()
                .find(|n| n.id == id && n.owner_id == owner_id)
                .map(|n| {
                    n.is_public = public;
                    n.clone()
                }))
        }

        async fn count(&self) -> Result<i64> {
            Ok(self.nodes.read().await.len() as i64)
        }
    }
}
