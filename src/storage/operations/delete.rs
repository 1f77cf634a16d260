// Delete operation trait and implementation
use crate::error::{PartialDeletionSnafu, PathNotFoundSnafu, Result};
use crate::storage::utils::error::map_not_found;
use crate::storage::utils::path::is_dir_path;
use futures::stream::TryStreamExt;
use opendal::Operator;
use snafu::ensure;

/// Trait for deleting objects and virtual directories from storage.
pub trait Deleter {
    /// Delete a single object, or every object under a directory prefix.
    ///
    /// # Arguments
    /// * `path` - Object key, or directory prefix ending with '/'
    ///
    /// # Returns
    /// * `Result<usize>` - Number of objects deleted
    async fn delete(&self, path: &str) -> Result<usize>;
}

/// Implementation of Deleter for OpenDAL Operator.
pub struct OpenDalDeleter {
    operator: Operator,
}

impl OpenDalDeleter {
    /// Create a new deleter with the given OpenDAL operator.
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    async fn delete_file(&self, path: &str) -> Result<usize> {
        self.operator
            .stat(path)
            .await
            .map_err(|e| map_not_found(path, e))?;
        self.operator.delete(path).await?;
        log::debug!("deleted object path={path}");
        Ok(1)
    }

    /// Delete every key under `prefix`, then the prefix marker itself.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let listed: Vec<(String, bool)> = self
            .operator
            .lister_with(prefix)
            .recursive(true)
            .await?
            .map_ok(|entry| (entry.path().to_string(), entry.metadata().mode().is_dir()))
            .try_collect()
            .await?;
        let marker_listed = listed.iter().any(|(key, _)| key == prefix);
        let mut keys: Vec<(String, bool)> =
            listed.into_iter().filter(|(key, _)| key != prefix).collect();

        ensure!(
            marker_listed || !keys.is_empty(),
            PathNotFoundSnafu {
                path: prefix.to_string()
            }
        );

        // Files first, then directory markers from the deepest up.
        keys.sort_by(|(a, a_dir), (b, b_dir)| {
            a_dir
                .cmp(b_dir)
                .then_with(|| b.matches('/').count().cmp(&a.matches('/').count()))
                .then_with(|| a.cmp(b))
        });

        let operator = self.operator.clone();
        let deleted = remove_each(&keys, |key| {
            let operator = operator.clone();
            async move { operator.delete(&key).await }
        })
        .await?;

        self.operator.delete(prefix).await?;
        log::debug!("deleted prefix={prefix} objects={deleted}");
        Ok(deleted)
    }
}

/// Delete `keys` one at a time through `remove` and count the objects (not
/// directory markers) removed. Not atomic: keys that fail are collected and
/// reported once the rest have been attempted.
async fn remove_each<F, Fut>(keys: &[(String, bool)], mut remove: F) -> Result<usize>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = opendal::Result<()>>,
{
    let mut deleted = 0;
    let mut failed_paths = Vec::new();
    for (key, is_dir) in keys {
        match remove(key.clone()).await {
            Ok(()) => {
                if !is_dir {
                    deleted += 1;
                }
            }
            Err(e) => {
                log::warn!("failed to delete object path={key}: {e}");
                failed_paths.push(key.clone());
            }
        }
    }

    if !failed_paths.is_empty() {
        return PartialDeletionSnafu {
            deleted,
            failed_paths,
        }
        .fail();
    }
    Ok(deleted)
}

impl Deleter for OpenDalDeleter {
    async fn delete(&self, path: &str) -> Result<usize> {
        if is_dir_path(path) {
            self.delete_prefix(path).await
        } else {
            self.delete_file(path).await
        }
    }
}
