//! HTML handlers. Every action runs against the caller's own [`Browser`],
//! turns failures into notices and redirects back to a page (post/redirect/get).

use axum::extract::{Form, Multipart, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::response::Attachment;
use serde::Deserialize;
use snafu::OptionExt;

use super::AppState;
use super::api::ApiError;
use super::render;
use crate::browser::{Browser, NoticeLevel, UploadFile};
use crate::error::{Result, ValidationSnafu};
use crate::session::Credentials;
use crate::storage::utils::size::format_size;

type HandlerResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
    pub q: Option<String>,
}

impl PathQuery {
    /// The `path` parameter of actions that need a target object.
    pub fn required_path(&self) -> Result<&str> {
        self.path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .context(ValidationSnafu {
                message: "a 'path' parameter is required".to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectForm {
    pub account: String,
    pub container: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub path: String,
    pub confirm: Option<String>,
}

/// Back to the listing the browser currently shows.
fn back_to_listing(browser: &Browser) -> Redirect {
    Redirect::to(&render::listing_href(&browser.cursor().prefix()))
}

pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> HandlerResult<(CookieJar, Html<String>)> {
    let (jar, browser) = state.browser(jar).await?;
    let mut browser = browser.lock().await;

    if !browser.is_connected() {
        let notices = browser.take_notices();
        return Ok((jar, Html(render::connect_page(browser.config(), &notices))));
    }

    if let Some(path) = query.path.as_deref()
        && let Err(e) = browser.change_directory(path)
    {
        browser.notify_error(&e);
    }

    let listing = match browser.listing(query.q.as_deref()).await {
        Ok(listing) => Some(listing),
        Err(e) => {
            browser.notify_error(&e);
            None
        }
    };
    let notices = browser.take_notices();
    let page = render::browser_page(&browser, listing.as_ref(), &notices);
    Ok((jar, Html(page)))
}

pub async fn connect(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ConnectForm>,
) -> HandlerResult<(CookieJar, Redirect)> {
    let (jar, browser) = state.browser(jar).await?;
    let mut browser = browser.lock().await;

    let result = match Credentials::new(&form.account, &form.container, &form.token) {
        Ok(credentials) => {
            let container = credentials.container().to_string();
            browser
                .connect(state.connector(), credentials)
                .await
                .map(|()| container)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(container) => browser.notify(
            NoticeLevel::Success,
            format!("Connected to container '{container}'"),
        ),
        Err(e) => browser.notify_error(&e),
    }
    Ok((jar, Redirect::to("/")))
}

pub async fn disconnect(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(browser) = state.existing_browser(&jar).await {
        browser.lock().await.disconnect();
    }
    (state.end_session(jar).await, Redirect::to("/"))
}

pub async fn upload(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> Redirect {
    let Some(browser) = state.existing_browser(&jar).await else {
        return Redirect::to("/");
    };
    let mut browser = browser.lock().await;

    if let Some(path) = query.path.as_deref()
        && let Err(e) = browser.change_directory(path)
    {
        browser.notify_error(&e);
        return back_to_listing(&browser);
    }

    let mut files = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("files") {
                    continue;
                }
                let Some(name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(data) => files.push(UploadFile {
                        name,
                        content_type,
                        data,
                    }),
                    Err(e) => {
                        browser.notify(
                            NoticeLevel::Error,
                            format!("Could not receive '{name}': {e}"),
                        );
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                browser.notify(
                    NoticeLevel::Error,
                    format!("Upload request could not be read: {e}"),
                );
                break;
            }
        }
    }

    if files.is_empty() {
        browser.notify(NoticeLevel::Info, "No files were selected");
        return back_to_listing(&browser);
    }

    match browser.upload_action(files).await {
        Ok(outcomes) => {
            for outcome in outcomes {
                match outcome.result {
                    Ok((path, size)) => browser.notify(
                        NoticeLevel::Success,
                        format!("Uploaded '{path}' ({})", format_size(size)),
                    ),
                    Err(e) => browser.notify_error(&e),
                }
            }
        }
        Err(e) => browser.notify_error(&e),
    }
    back_to_listing(&browser)
}

pub async fn download(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Response {
    let Some(browser) = state.existing_browser(&jar).await else {
        return Redirect::to("/").into_response();
    };
    let mut browser = browser.lock().await;

    let result = match query.required_path() {
        Ok(path) => browser.download_action(path).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(download) => {
            log::info!(
                "download path={} size={}",
                query.path.as_deref().unwrap_or_default(),
                download.data.len()
            );
            Attachment::new(download.data)
                .filename(download.file_name)
                .content_type(download.content_type)
                .into_response()
        }
        Err(e) => {
            browser.notify_error(&e);
            back_to_listing(&browser).into_response()
        }
    }
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Response {
    let Some(browser) = state.existing_browser(&jar).await else {
        return Redirect::to("/").into_response();
    };
    let mut browser = browser.lock().await;

    let target = browser.session().client().and_then(|_| {
        let path = query.required_path()?;
        browser.cursor().resolve(path)
    });
    match target {
        Ok(key) => {
            let notices = browser.take_notices();
            Html(render::confirm_delete_page(&browser, &key, &notices)).into_response()
        }
        Err(e) => {
            browser.notify_error(&e);
            back_to_listing(&browser).into_response()
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let Some(browser) = state.existing_browser(&jar).await else {
        return Redirect::to("/");
    };
    let mut browser = browser.lock().await;

    let confirmed = form.confirm.as_deref() == Some("yes");
    match browser.delete_action(&form.path, confirmed).await {
        Ok(removal) => browser.notify(
            NoticeLevel::Success,
            format!(
                "Deleted '{}' ({} object(s))",
                removal.path, removal.deleted
            ),
        ),
        Err(e) => browser.notify_error(&e),
    }
    back_to_listing(&browser)
}

pub async fn view(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PathQuery>,
) -> Response {
    let Some(browser) = state.existing_browser(&jar).await else {
        return Redirect::to("/").into_response();
    };
    let mut browser = browser.lock().await;

    let result = match query.required_path() {
        Ok(path) => browser.details(path).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(details) => {
            let notices = browser.take_notices();
            Html(render::details_page(&browser, &details, &notices)).into_response()
        }
        Err(e) => {
            browser.notify_error(&e);
            back_to_listing(&browser).into_response()
        }
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}
