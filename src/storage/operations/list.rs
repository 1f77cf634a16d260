use crate::error::Result;
use crate::storage::operations::stat::timestamp_of;
use crate::storage::utils::path::{basename, to_operator_path};
use futures::future;
use futures::stream::TryStreamExt;
use jiff::Timestamp;
use opendal::{Metadata, Operator};
use serde::Serialize;

/// One child of a listed prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Last path segment, without the trailing '/' of directories.
    pub name: String,
    /// Full key inside the container. Directory keys end with '/'.
    pub path: String,
    pub is_directory: bool,
    /// Content length in bytes; `None` for directories.
    pub size: Option<u64>,
    pub last_modified: Option<Timestamp>,
    pub content_type: Option<String>,
}

impl DirectoryEntry {
    fn from_parts(path: String, meta: &Metadata) -> Self {
        let is_directory = meta.mode().is_dir();
        Self {
            name: basename(&path),
            path,
            is_directory,
            size: (!is_directory).then(|| meta.content_length()),
            last_modified: timestamp_of(meta),
            content_type: meta.content_type().map(str::to_string),
        }
    }
}

/// Trait for listing directory contents in object storage.
pub trait Lister {
    /// List the immediate children of a prefix.
    ///
    /// # Arguments
    /// * `prefix` - Directory prefix to list; empty for the container root
    ///
    /// # Returns
    /// * `Result<Vec<DirectoryEntry>>` - Children in backend order
    async fn list(&self, prefix: &str) -> Result<Vec<DirectoryEntry>>;
}

/// Implementation of Lister for OpenDAL Operator.
pub struct OpenDalLister {
    operator: Operator,
}

impl OpenDalLister {
    /// Create a new lister with the given OpenDAL operator.
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Some backends report the listed directory among its own children.
    fn is_self(prefix: &str, entry: &opendal::Entry) -> bool {
        let path = entry.path();
        path.is_empty() || path == "/" || path == prefix
    }
}

impl Lister for OpenDalLister {
    async fn list(&self, prefix: &str) -> Result<Vec<DirectoryEntry>> {
        let entries: Vec<opendal::Entry> = self
            .operator
            .lister(to_operator_path(prefix))
            .await?
            .try_filter(|entry| future::ready(!Self::is_self(prefix, entry)))
            .try_collect()
            .await?;

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let (path, meta) = entry.into_parts();
            // Name-only listings carry neither size nor times.
            let meta = if !meta.mode().is_dir() && meta.last_modified().is_none() {
                self.operator.stat(&path).await?
            } else {
                meta
            };
            children.push(DirectoryEntry::from_parts(path, &meta));
        }
        Ok(children)
    }
}
