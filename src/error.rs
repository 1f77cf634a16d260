use serde::Serialize;
use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid, expired or insufficient access token.
    Auth,
    /// Object or container missing at call time.
    NotFound,
    /// Transport failure talking to the storage endpoint.
    Network,
    /// Empty or malformed input.
    Validation,
    Internal,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid input: {message}"))]
    Validation { message: String },

    #[snafu(display("No credentials held by this session, connect again"))]
    MissingCredentials,

    #[snafu(display("Not connected to a storage container"))]
    NotConnected,

    #[snafu(display("Deleting '{path}' requires confirmation"))]
    ConfirmationRequired { path: String },

    /// An error whose text has been scrubbed of secrets; keeps the original kind.
    #[snafu(display("{message}"))]
    Scrubbed { kind: ErrorKind, message: String },

    #[snafu(display("Path does not exist: {path}"))]
    PathNotFound { path: String },

    #[snafu(display("'{path}' is a directory"))]
    IsDirectory { path: String },

    #[snafu(display("File type of '{name}' is not allowed"))]
    ExtensionNotAllowed { name: String },

    #[snafu(display("Unsupported storage provider: {provider}"))]
    UnsupportedProvider { provider: String },

    #[snafu(display("Unknown timezone '{name}'"))]
    InvalidTimezone { name: String },

    #[snafu(display("Partial deletion failure: {deleted} object(s) deleted, {} failed: {}", failed_paths.len(), failed_paths.join(", ")))]
    PartialDeletion {
        deleted: usize,
        failed_paths: Vec<String>,
    },

    #[snafu(display("Failed to connect to container '{container}': {source}"))]
    ConnectFailed {
        container: String,
        source: Box<Error>,
    },

    #[snafu(display("Failed to list directory '{path}': {source}"))]
    ListDirectoryFailed { path: String, source: Box<Error> },

    #[snafu(display("Failed to upload '{name}' to '{remote_path}': {source}"))]
    UploadFailed {
        name: String,
        remote_path: String,
        source: Box<Error>,
    },

    #[snafu(display("Failed to download '{remote_path}': {source}"))]
    DownloadFailed {
        remote_path: String,
        source: Box<Error>,
    },

    #[snafu(display("Failed to delete '{path}': {source}"))]
    DeleteFailed { path: String, source: Box<Error> },

    #[snafu(display("Failed to read metadata of '{path}': {source}"))]
    MetadataFailed { path: String, source: Box<Error> },

    #[snafu(display("Failed to bind to {address}: {source}"))]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[snafu(display("OpenDAL error: {source}"))]
    OpenDal { source: opendal::Error },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },
}

impl Error {
    /// Classify this error, looking through context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. }
            | Error::MissingCredentials
            | Error::NotConnected
            | Error::ConfirmationRequired { .. }
            | Error::IsDirectory { .. }
            | Error::ExtensionNotAllowed { .. }
            | Error::UnsupportedProvider { .. }
            | Error::InvalidTimezone { .. } => ErrorKind::Validation,
            Error::Scrubbed { kind, .. } => *kind,
            Error::PathNotFound { .. } => ErrorKind::NotFound,
            Error::ConnectFailed { source, .. }
            | Error::ListDirectoryFailed { source, .. }
            | Error::UploadFailed { source, .. }
            | Error::DownloadFailed { source, .. }
            | Error::DeleteFailed { source, .. }
            | Error::MetadataFailed { source, .. } => source.kind(),
            Error::OpenDal { source } => classify_opendal(source),
            Error::Io { source } | Error::Bind { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::PermissionDenied => ErrorKind::Auth,
                _ => ErrorKind::Internal,
            },
            Error::PartialDeletion { .. } => ErrorKind::Internal,
        }
    }
}

fn classify_opendal(error: &opendal::Error) -> ErrorKind {
    match error.kind() {
        opendal::ErrorKind::PermissionDenied => ErrorKind::Auth,
        opendal::ErrorKind::NotFound => ErrorKind::NotFound,
        opendal::ErrorKind::ConfigInvalid => ErrorKind::Validation,
        opendal::ErrorKind::RateLimited => ErrorKind::Network,
        opendal::ErrorKind::Unexpected if error.is_temporary() => ErrorKind::Network,
        _ => ErrorKind::Internal,
    }
}

impl From<opendal::Error> for Error {
    fn from(error: opendal::Error) -> Self {
        Error::OpenDal { source: error }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io { source: error }
    }
}
