// Error conversion helpers and wrapping macro for Snafu-based errors
use crate::error::Error;

/// Convert different error types into our unified Error type.
pub trait IntoBlobnavError {
    fn into_error(self) -> Error;
}

impl IntoBlobnavError for Error {
    fn into_error(self) -> Error {
        self
    }
}

impl IntoBlobnavError for opendal::Error {
    fn into_error(self) -> Error {
        self.into()
    }
}

/// Macro to wrap a Result-producing expression into a Snafu variant with `source: Box<Error>`.
/// Example:
/// wrap_err!(op.await, DownloadFailed { remote_path: rp })?
#[macro_export]
macro_rules! wrap_err {
    ($expr:expr, $variant:ident { $($field:ident : $value:expr),* $(,)? }) => {{
        $expr.map_err(|e| {
            let src: $crate::error::Error = $crate::storage::utils::error::IntoBlobnavError::into_error(e);
            $crate::error::Error::$variant { $($field: $value),*, source: Box::new(src) }
        })
    }};
}

/// Turn an OpenDAL `NotFound` into a `PathNotFound` naming the requested key.
pub fn map_not_found(path: &str, error: opendal::Error) -> Error {
    if error.kind() == opendal::ErrorKind::NotFound {
        Error::PathNotFound {
            path: path.to_string(),
        }
    } else {
        error.into()
    }
}
