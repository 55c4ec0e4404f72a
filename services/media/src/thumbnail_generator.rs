use async_trait::async_trait;
use common::{
    models::{ThumbnailJob, Variant},
    repositories::FileRepository,
    storage::BlobStore,
};
use image::{DynamicImage, GenericImageView, ImageFormat, imageops::FilterType};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::worker::JobProcessor;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// The node is gone, belongs to someone else or has no content
    #[error("File not found: {0}")]
    FileNotFound(Uuid),

    #[error("Original content of {0} is missing")]
    ContentMissing(Uuid),

    #[error("Invalid thumbnail width: {0}")]
    InvalidSize(u32),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Image task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Writes resized copies of uploaded images next to the original
#[derive(Clone)]
pub struct ThumbnailGenerator {
    files: Arc<dyn FileRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl ThumbnailGenerator {
    pub fn new(files: Arc<dyn FileRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { files, blobs }
    }

    pub async fn generate_thumbnails(&self, job: &ThumbnailJob) -> Result<(), ThumbnailError> {
        info!("Generating thumbnails for image: {}", job.file_id);

        if let Some(&size) = job.requested_sizes.iter().find(|&&size| size == 0) {
            return Err(ThumbnailError::InvalidSize(size));
        }

        let content = self
            .files
            .find_owned(job.file_id, job.owner_id)
            .await?
            .and_then(|node| node.content)
            .ok_or(ThumbnailError::FileNotFound(job.file_id))?;

        let original = self
            .blobs
            .read(content.as_str())
            .await?
            .ok_or(ThumbnailError::ContentMissing(job.file_id))?;

        let (image, format) = tokio::task::spawn_blocking(move || decode(&original)).await??;
        let image = Arc::new(image);

        for &size in &job.requested_sizes {
            let source = image.clone();
            let bytes =
                tokio::task::spawn_blocking(move || encode(&resize_to_width(&source, size), format))
                    .await??;

            self.blobs
                .write(&content.variant(Variant::Size(size)), &bytes)
                .await?;
            debug!("Wrote {}px thumbnail of {}", size, job.file_id);
        }

        info!(
            "Generated {} thumbnails for image: {}",
            job.requested_sizes.len(),
            job.file_id
        );
        Ok(())
    }
}

#[async_trait]
impl JobProcessor<ThumbnailJob> for ThumbnailGenerator {
    type Error = ThumbnailError;

    async fn process(&self, job: &ThumbnailJob) -> Result<(), ThumbnailError> {
        self.generate_thumbnails(job).await
    }
}

fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), image::ImageError> {
    let format = image::guess_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format)?;
    Ok((image, format))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format)?;
    Ok(bytes.into_inner())
}

/// Scale to `width`, keeping the aspect ratio
pub fn resize_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
    let (original_width, original_height) = image.dimensions();
    let height = (f64::from(original_height) * f64::from(width) / f64::from(original_width.max(1)))
        .round()
        .max(1.0) as u32;
    image.resize_exact(width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        models::{ContentRef, FileKind, FileNode, NewFileNode, Parent},
        repositories::MemoryFileRepository,
        storage::LocalBlobStore,
    };
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 90])));
        encode(&image, ImageFormat::Png).unwrap()
    }

    struct Fixture {
        generator: ThumbnailGenerator,
        files: MemoryFileRepository,
        blobs: LocalBlobStore,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let files = MemoryFileRepository::new();
        let blobs = LocalBlobStore::new(dir.path()).unwrap();
        let generator = ThumbnailGenerator::new(Arc::new(files.clone()), Arc::new(blobs.clone()));
        Fixture {
            generator,
            files,
            blobs,
            _dir: dir,
        }
    }

    async fn store_image(f: &Fixture, owner_id: Uuid, bytes: &[u8]) -> FileNode {
        let content = ContentRef::generate();
        f.blobs.write(content.as_str(), bytes).await.unwrap();
        f.files
            .insert(&NewFileNode {
                owner_id,
                name: "cat.png".to_string(),
                kind: FileKind::Image,
                is_public: false,
                parent: Parent::Root,
                content: Some(content),
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1000, 500));
        assert_eq!(resize_to_width(&image, 250).dimensions(), (250, 125));

        let tall = DynamicImage::ImageRgb8(RgbImage::new(3, 7));
        assert_eq!(resize_to_width(&tall, 2).dimensions(), (2, 5));

        let flat = DynamicImage::ImageRgb8(RgbImage::new(1000, 1));
        assert_eq!(resize_to_width(&flat, 100).dimensions(), (100, 1));
    }

    #[tokio::test]
    async fn test_generates_every_requested_size() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let node = store_image(&f, owner, &png(1000, 600)).await;

        let job = ThumbnailJob {
            file_id: node.id,
            owner_id: owner,
            requested_sizes: vec![500, 250, 100],
        };
        f.generator.generate_thumbnails(&job).await.unwrap();

        let content = node.content.unwrap();
        for (size, height) in [(500, 300), (250, 150), (100, 60)] {
            let bytes = f
                .blobs
                .read(&content.variant(Variant::Size(size)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
            let thumbnail = image::load_from_memory(&bytes).unwrap();
            assert_eq!(thumbnail.dimensions(), (size, height));
        }

        // The original is untouched
        let original = f.blobs.read(content.as_str()).await.unwrap().unwrap();
        assert_eq!(image::load_from_memory(&original).unwrap().dimensions(), (1000, 600));
    }

    #[tokio::test]
    async fn test_job_for_foreign_or_missing_file_fails() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let node = store_image(&f, owner, &png(10, 10)).await;

        let foreign = ThumbnailJob {
            file_id: node.id,
            owner_id: Uuid::new_v4(),
            requested_sizes: vec![5],
        };
        assert!(matches!(
            f.generator.generate_thumbnails(&foreign).await,
            Err(ThumbnailError::FileNotFound(_))
        ));

        let missing = ThumbnailJob {
            file_id: Uuid::new_v4(),
            owner_id: owner,
            requested_sizes: vec![5],
        };
        assert!(matches!(
            f.generator.generate_thumbnails(&missing).await,
            Err(ThumbnailError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_undecodable_content_writes_nothing() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let node = store_image(&f, owner, b"definitely not an image").await;

        let job = ThumbnailJob {
            file_id: node.id,
            owner_id: owner,
            requested_sizes: vec![500, 250, 100],
        };
        assert!(matches!(
            f.generator.generate_thumbnails(&job).await,
            Err(ThumbnailError::Image(_))
        ));

        let content = node.content.unwrap();
        for size in [500, 250, 100] {
            assert!(!f.blobs.exists(&content.variant(Variant::Size(size))).await.unwrap());
        }
    }

    /// Blob store that refuses every write after the first `allowed`
    struct FailingWrites {
        inner: LocalBlobStore,
        allowed: usize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for FailingWrites {
        async fn exists(&self, handle: &str) -> anyhow::Result<bool> {
            self.inner.exists(handle).await
        }

        async fn write(&self, handle: &str, bytes: &[u8]) -> anyhow::Result<()> {
            if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                anyhow::bail!("disk full");
            }
            self.inner.write(handle, bytes).await
        }

        async fn read(&self, handle: &str) -> anyhow::Result<Option<Vec<u8>>> {
            self.inner.read(handle).await
        }
    }

    #[tokio::test]
    async fn test_sizes_written_before_a_failure_are_kept() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let node = store_image(&f, owner, &png(1000, 600)).await;
        let generator = ThumbnailGenerator::new(
            Arc::new(f.files.clone()),
            Arc::new(FailingWrites {
                inner: f.blobs.clone(),
                allowed: 1,
                writes: AtomicUsize::new(0),
            }),
        );

        let job = ThumbnailJob {
            file_id: node.id,
            owner_id: owner,
            requested_sizes: vec![500, 250, 100],
        };
        assert!(matches!(
            generator.generate_thumbnails(&job).await,
            Err(ThumbnailError::Storage(_))
        ));

        let content = node.content.unwrap();
        assert!(f.blobs.exists(&content.variant(Variant::Size(500))).await.unwrap());
        for size in [250, 100] {
            assert!(!f.blobs.exists(&content.variant(Variant::Size(size))).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_zero_width_is_rejected() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let node = store_image(&f, owner, &png(10, 10)).await;

        let job = ThumbnailJob {
            file_id: node.id,
            owner_id: owner,
            requested_sizes: vec![5, 0],
        };
        assert!(matches!(
            f.generator.generate_thumbnails(&job).await,
            Err(ThumbnailError::InvalidSize(0))
        ));
    }
}
