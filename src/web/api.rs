//! JSON endpoints.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use snafu::OptionExt;

use super::AppState;
use super::handlers::PathQuery;
use crate::browser::Listing;
use crate::error::{Error, ErrorKind, NotConnectedSnafu};
use crate::session::{Session, redact_signatures};
use crate::storage::ObjectMeta;

/// Error body of the JSON endpoints. The message is already scrubbed.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(rename = "error")]
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    /// Scrub with everything the session knows about its secrets.
    fn redacted(error: &Error, session: &Session) -> Self {
        Self {
            kind: error.kind(),
            message: session.redact(&error.to_string()),
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self {
            kind: error.kind(),
            message: redact_signatures(&error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            log::error!("request failed: {}", self.message);
        }
        (self.status(), Json(self)).into_response()
    }
}

pub async fn entries(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Result<Json<Listing>, ApiError> {
    let browser = state
        .existing_browser(&jar)
        .await
        .context(NotConnectedSnafu)?;
    let mut browser = browser.lock().await;

    if let Some(path) = query.path.as_deref() {
        browser
            .change_directory(path)
            .map_err(|e| ApiError::redacted(&e, browser.session()))?;
    }
    let listing = browser
        .listing(query.q.as_deref())
        .await
        .map_err(|e| ApiError::redacted(&e, browser.session()))?;
    Ok(Json(listing))
}

pub async fn metadata(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Result<Json<ObjectMeta>, ApiError> {
    let browser = state
        .existing_browser(&jar)
        .await
        .context(NotConnectedSnafu)?;
    let browser = browser.lock().await;

    let result = match query.required_path() {
        Ok(path) => browser.metadata(path).await,
        Err(e) => Err(e),
    };
    let meta = result.map_err(|e| ApiError::redacted(&e, browser.session()))?;
    Ok(Json(meta))
}
