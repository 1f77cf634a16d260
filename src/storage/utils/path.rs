// Key helper utilities shared across storage operations

/// Build a remote key by joining a directory prefix and a file name.
pub fn build_remote_path(prefix: &str, file_name: &str) -> String {
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}{file_name}", ensure_trailing_slash(prefix))
    }
}

/// Extract the last segment of a key, without a trailing '/'.
pub fn basename(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Return a new String that guarantees a trailing '/'.
pub fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Keys ending in '/' name a virtual directory.
pub fn is_dir_path(path: &str) -> bool {
    path.ends_with('/')
}

/// Prefix of the directory holding `path`; empty at the container root.
pub fn parent_prefix(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => String::new(),
    }
}

/// OpenDAL addresses the container root as "/".
pub fn to_operator_path(prefix: &str) -> &str {
    if prefix.is_empty() { "/" } else { prefix }
}
