//! Repositories over the `users` and `files` collections
//!
//! Each repository is a trait with a PostgreSQL implementation; the `memory`
//! feature adds in-process implementations with the same semantics.

pub mod file;
pub mod user;

pub use file::{FileRepository, PgFileRepository};
pub use user::{PgUserRepository, UserRepository};

#[cfg(any(test, feature = "memory"))]
pub use file::MemoryFileRepository;
#[cfg(any(test, feature = "memory"))]
pub use user::MemoryUserRepository;
