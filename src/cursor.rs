//! Virtual directory cursor over a flat key space.
//!
//! Prefixes are "/"-delimited and always normalized: no empty or `.`
//! segments, a single trailing slash, and no `..` that would climb above the
//! cursor's root prefix.

use crate::error::{Result, ValidationSnafu};
use serde::Serialize;
use snafu::ensure;

/// One clickable step of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: String,
}

/// Split a path into normalized segments, resolving `.` and `..`.
fn split_segments(path: &str) -> Result<Vec<String>> {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                ensure!(
                    segments.pop().is_some(),
                    ValidationSnafu {
                        message: format!("'{path}' climbs above the container root")
                    }
                );
            }
            s => segments.push(s.to_string()),
        }
    }
    Ok(segments)
}

fn join_prefix(segments: &[String]) -> String {
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

/// Normalize a directory prefix. The container root is the empty string.
pub fn normalize_prefix(path: &str) -> Result<String> {
    let unified = path.replace('\\', "/");
    Ok(join_prefix(&split_segments(&unified)?))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCursor {
    root: Vec<String>,
    segments: Vec<String>,
}

impl PathCursor {
    /// Create a cursor positioned at `root`, which it can never leave.
    pub fn new(root: &str) -> Result<Self> {
        let root = split_segments(&root.replace('\\', "/"))?;
        Ok(Self {
            root,
            segments: Vec::new(),
        })
    }

    pub fn root(&self) -> String {
        join_prefix(&self.root)
    }

    /// Current prefix, relative to the container root.
    pub fn prefix(&self) -> String {
        let mut all = self.root.clone();
        all.extend(self.segments.iter().cloned());
        join_prefix(&all)
    }

    pub fn is_at_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Descend into a child directory.
    pub fn push(&mut self, segment: &str) -> Result<()> {
        let segment = segment.trim_end_matches('/');
        ensure!(
            !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('/'),
            ValidationSnafu {
                message: format!("'{segment}' is not a directory name")
            }
        );
        self.segments.push(segment.to_string());
        Ok(())
    }

    /// Go up one level. Returns false when already at the root.
    pub fn pop(&mut self) -> bool {
        self.segments.pop().is_some()
    }

    pub fn reset(&mut self) {
        self.segments.clear();
    }

    /// Jump to an arbitrary directory inside the root.
    pub fn set(&mut self, path: &str) -> Result<()> {
        let segments = split_segments(path)?;
        ensure!(
            segments.starts_with(&self.root),
            ValidationSnafu {
                message: format!("'{path}' is outside of '{}'", self.root())
            }
        );
        self.segments = segments[self.root.len()..].to_vec();
        Ok(())
    }

    /// Normalize a key taken from user input and check it lies within the
    /// root. A trailing slash (directory key) is preserved.
    pub fn resolve(&self, path: &str) -> Result<String> {
        let segments = split_segments(path)?;
        ensure!(
            !segments.is_empty(),
            ValidationSnafu {
                message: "an object path is required".to_string()
            }
        );
        ensure!(
            segments.starts_with(&self.root),
            ValidationSnafu {
                message: format!("'{path}' is outside of '{}'", self.root())
            }
        );

        let key = segments.join("/");
        if path.ends_with('/') {
            Ok(format!("{key}/"))
        } else {
            Ok(key)
        }
    }

    /// Trail from the root down to the current directory.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = vec![Breadcrumb {
            label: self.root.last().cloned().unwrap_or_else(|| "Home".to_string()),
            path: self.root(),
        }];
        let mut walked = self.root.clone();
        for segment in &self.segments {
            walked.push(segment.clone());
            crumbs.push(Breadcrumb {
                label: segment.clone(),
                path: join_prefix(&walked),
            });
        }
        crumbs
    }
}
