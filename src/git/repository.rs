//! Git repository handle.

use crate::error::{Result, VerguardError};
use std::path::{Component, Path, PathBuf};

/// A discovered, non-bare Git repository.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Find the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns `Git` if no repository is found or it has no working tree.
    pub async fn discover(path: &Path) -> Result<Self> {
        let start = path.to_path_buf();

        let root = blocking(move || {
            let repo = git2::Repository::discover(&start).map_err(|e| {
                VerguardError::git(
                    format!("no git repository at '{}': {}", start.display(), e.message()),
                    file!(),
                    line!(),
                )
            })?;
            let workdir = repo.workdir().ok_or_else(|| {
                VerguardError::git("repository has no working tree".to_string(), file!(), line!())
            })?;
            Ok(canonical(workdir))
        })
        .await?;

        tracing::debug!(root = %root.display(), "Discovered git repository");
        Ok(Self { root })
    }

    /// Working-tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths that differ between `base_ref` and the working tree, index
    /// and untracked files included. Relative to the root, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Git` if `base_ref` does not resolve to a tree.
    pub async fn changed_files(&self, base_ref: &str) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let reference = base_ref.to_string();

        let files = blocking(move || {
            let repo = git2::Repository::open(&root)?;
            let tree = resolve_tree(&repo, &reference)?;

            let mut options = git2::DiffOptions::new();
            options.include_untracked(true).recurse_untracked_dirs(true);
            let diff = repo.diff_tree_to_workdir_with_index(Some(&tree), Some(&mut options))?;

            let mut files: Vec<PathBuf> = diff
                .deltas()
                .filter_map(|delta| {
                    delta
                        .new_file()
                        .path()
                        .or_else(|| delta.old_file().path())
                        .map(Path::to_path_buf)
                })
                .collect();
            files.sort();
            files.dedup();
            Ok(files)
        })
        .await?;

        tracing::debug!(base_ref, changed = files.len(), "Listed changed files");
        Ok(files)
    }

    /// Content of `path` (relative to the root) at `reference`.
    ///
    /// Returns `None` when the file does not exist at that revision.
    ///
    /// # Errors
    ///
    /// Returns `Git` if the reference does not resolve, the path is not a
    /// file, or its content is not UTF-8.
    pub async fn read_at_ref(&self, reference: &str, path: &Path) -> Result<Option<String>> {
        let root = self.root.clone();
        let reference = reference.to_string();
        let path = path.to_path_buf();

        blocking(move || {
            let repo = git2::Repository::open(&root)?;
            let tree = resolve_tree(&repo, &reference)?;

            let entry = match tree.get_path(&path) {
                Ok(entry) => entry,
                Err(e) if e.code() == git2::ErrorCode::NotFound => {
                    tracing::debug!(
                        path = %path.display(),
                        reference = %reference,
                        "File absent at revision"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let blob = entry.to_object(&repo)?.peel_to_blob().map_err(|e| {
                VerguardError::git(
                    format!("'{}' at {reference} is not a file: {}", path.display(), e.message()),
                    file!(),
                    line!(),
                )
            })?;

            let text = std::str::from_utf8(blob.content()).map_err(|e| {
                VerguardError::git(
                    format!("'{}' at {reference} is not UTF-8: {e}", path.display()),
                    file!(),
                    line!(),
                )
            })?;
            Ok(Some(text.to_string()))
        })
        .await
    }

    /// Working-tree content of `path` (relative to the root).
    ///
    /// Returns `None` when the file was deleted.
    ///
    /// # Errors
    ///
    /// Returns `Io` for any read failure other than a missing file.
    pub async fn read_working(&self, path: &Path) -> Result<Option<String>> {
        read_optional(&self.root.join(path)).await
    }

    /// Express `path` relative to the working-tree root.
    ///
    /// Relative inputs are taken from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `Git` if the path lies outside the repository.
    pub fn relative(&self, path: &Path) -> Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| VerguardError::io(".", e, file!(), line!()))?
                .join(path)
        };
        let absolute = canonical(&normalize(&absolute));

        absolute
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| {
                VerguardError::git(
                    format!(
                        "'{}' is outside the repository at '{}'",
                        path.display(),
                        self.root.display()
                    ),
                    file!(),
                    line!(),
                )
            })
    }
}

/// Read a file, mapping "not found" to `None`.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VerguardError::io(path, e, file!(), line!())),
    }
}

fn resolve_tree<'r>(repo: &'r git2::Repository, reference: &str) -> Result<git2::Tree<'r>> {
    repo.revparse_single(reference)
        .and_then(|object| object.peel_to_tree())
        .map_err(|e| {
            VerguardError::git(
                format!("cannot resolve '{reference}': {}", e.message()),
                file!(),
                line!(),
            )
        })
}

/// Canonicalize the deepest existing ancestor, keeping the missing tail.
fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => canonical(parent).join(name),
        _ => path.to_path_buf(),
    }
}

/// Drop `.` and resolve `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VerguardError::internal(format!("git task failed: {e}"), file!(), line!()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    }

    #[test]
    fn test_canonical_keeps_missing_tail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone").join("main.tf");
        let resolved = canonical(&missing);
        assert!(resolved.ends_with("gone/main.tf"));
        assert!(resolved.starts_with(std::fs::canonicalize(dir.path()).unwrap()));
    }

    #[tokio::test]
    async fn test_read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_optional(&dir.path().join("nope.tf")).await.unwrap();
        assert!(result.is_none());
    }
}
