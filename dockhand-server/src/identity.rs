//! Deployment identity allocation
//!
//! Each pipeline run gets a [`DeploymentId`] that namespaces both the
//! directory the repository is cloned into and the image tag the build
//! produces. Concurrent deployments share the host filesystem and image
//! store, so identifiers must never repeat.

use dockhand_core::domain::DeploymentId;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use uuid::Uuid;

/// Source of deployment identifiers
///
/// Implementations must be safe to call from many request tasks at once and
/// must never hand out the same identifier twice.
pub trait IdentifierSource: Send + Sync {
    fn next_id(&self) -> DeploymentId;
}

/// Random 122-bit identifiers (UUID v4)
#[derive(Debug, Clone, Default)]
pub struct RandomIdentifiers;

impl RandomIdentifiers {
    pub fn new() -> Self {
        Self
    }
}

impl IdentifierSource for RandomIdentifiers {
    fn next_id(&self) -> DeploymentId {
        DeploymentId::from_uuid(Uuid::new_v4())
    }
}

/// Monotonic counter identifiers: `1`, `2`, `3`, ...
#[derive(Debug)]
pub struct SequentialIdentifiers {
    next: AtomicU64,
}

impl SequentialIdentifiers {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Starts past the highest numeric directory already under `root`
    ///
    /// Repositories from earlier server runs stay on disk, so a restarted
    /// counter must not reuse their names. A missing root starts at 1.
    pub fn resume_after(root: &Path) -> std::io::Result<Self> {
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::starting_at(1));
            }
            Err(e) => return Err(e),
        };

        let mut highest = 0;
        for entry in entries {
            let entry = entry?;
            if let Some(n) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
            {
                highest = highest.max(n);
            }
        }

        debug!(
            "Resuming sequential identifiers after {} in {}",
            highest,
            root.display()
        );

        let next = highest.checked_add(1).ok_or_else(|| {
            std::io::Error::other(format!(
                "no sequential identifier left after {} in {}",
                highest,
                root.display()
            ))
        })?;

        Ok(Self::starting_at(next))
    }
}

impl IdentifierSource for SequentialIdentifiers {
    fn next_id(&self) -> DeploymentId {
        DeploymentId::from_sequence(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a deployment's artifacts live
///
/// Derives the clone directory and the image name from an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentLayout {
    pub repositories_root: PathBuf,
    pub image_prefix: String,
}

impl DeploymentLayout {
    pub fn new(repositories_root: impl Into<PathBuf>, image_prefix: impl Into<String>) -> Self {
        Self {
            repositories_root: repositories_root.into(),
            image_prefix: image_prefix.into(),
        }
    }

    pub fn repository_path(&self, id: &DeploymentId) -> PathBuf {
        self.repositories_root.join(id.as_str())
    }

    pub fn image_name(&self, id: &DeploymentId) -> String {
        format!("{}{}", self.image_prefix, id)
    }
}

impl Default for DeploymentLayout {
    fn default() -> Self {
        Self::new("repositories", "repo_image_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn collect_concurrently(source: Arc<dyn IdentifierSource>, n: usize) -> Vec<DeploymentId> {
        const THREADS: usize = 8;

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let source = source.clone();
                let count = n / THREADS + usize::from(t < n % THREADS);
                std::thread::spawn(move || (0..count).map(|_| source.next_id()).collect::<Vec<_>>())
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    }

    #[test]
    fn test_random_identifiers_unique_under_concurrency() {
        let ids = collect_concurrently(Arc::new(RandomIdentifiers::new()), 1000);
        assert_eq!(ids.len(), 1000);

        let distinct: HashSet<_> = ids.iter().collect();
        assert_eq!(distinct.len(), 1000);
    }

    #[test]
    fn test_sequential_identifiers_unique_under_concurrency() {
        let ids = collect_concurrently(Arc::new(SequentialIdentifiers::starting_at(1)), 1000);

        let mut numbers: Vec<u64> = ids.iter().map(|id| id.as_str().parse().unwrap()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_resume_after_skips_existing_directories() {
        let root = tempfile::tempdir().unwrap();
        for name in ["3", "17", "not-a-number", "5"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }

        let source = SequentialIdentifiers::resume_after(root.path()).unwrap();
        assert_eq!(source.next_id().as_str(), "18");
        assert_eq!(source.next_id().as_str(), "19");
    }

    #[test]
    fn test_resume_after_exhausted_counter_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(u64::MAX.to_string())).unwrap();

        let err = SequentialIdentifiers::resume_after(root.path()).unwrap_err();
        assert!(err.to_string().contains("no sequential identifier left"));
    }

    #[test]
    fn test_resume_after_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let source = SequentialIdentifiers::resume_after(&root.path().join("absent")).unwrap();
        assert_eq!(source.next_id().as_str(), "1");
    }

    #[test]
    fn test_layout_derives_path_and_image_from_same_id() {
        let layout = DeploymentLayout::new("/srv/repos", "repo_image_");
        let id = DeploymentId::new("abc123").unwrap();

        assert_eq!(
            layout.repository_path(&id),
            PathBuf::from("/srv/repos/abc123")
        );
        assert_eq!(layout.image_name(&id), "repo_image_abc123");
    }

    #[test]
    fn test_distinct_ids_never_share_artifacts() {
        let layout = DeploymentLayout::default();
        let source = RandomIdentifiers::new();
        let a = source.next_id();
        let b = source.next_id();

        assert_ne!(layout.repository_path(&a), layout.repository_path(&b));
        assert_ne!(layout.image_name(&a), layout.image_name(&b));
    }
}
