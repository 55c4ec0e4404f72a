//! Domain models shared by the services

pub mod file;
pub mod job;
pub mod user;

// Re-export for convenience
pub use file::{ContentRef, FileKind, FileNode, NewFileNode, Parent, Variant};
pub use job::{DEFAULT_THUMBNAIL_SIZES, Job, ThumbnailJob, WelcomeJob};
pub use user::{NewUser, User};
