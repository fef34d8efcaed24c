//! Reading file revisions from a local Git repository.
//!
//! All `git2` work runs on `tokio::task::spawn_blocking`; each call opens
//! the repository afresh, so [`GitRepository`] is a cheap handle holding
//! only the working-tree root.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use verguard::git::GitRepository;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repo = GitRepository::discover(Path::new(".")).await?;
//!     for path in repo.changed_files("HEAD~1").await? {
//!         let before = repo.read_at_ref("HEAD~1", &path).await?;
//!         println!("{}: existed before = {}", path.display(), before.is_some());
//!     }
//!     Ok(())
//! }
//! ```

mod repository;

pub use repository::GitRepository;
pub(crate) use repository::read_optional;
