//! HTTP surface: session cookies, routing and page rendering.

mod api;
mod handlers;
mod render;
mod server;

pub use server::serve;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::browser::Browser;
use crate::config::BrowserConfig;
use crate::error::Result;
use crate::storage::Connector;

pub const SESSION_COOKIE: &str = "blobnav_session";

/// One live browser session and when it was last used.
struct SessionSlot {
    browser: Arc<Mutex<Browser>>,
    last_seen: Instant,
}

type SessionMap = HashMap<Uuid, SessionSlot>;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<BrowserConfig>,
    connector: Arc<dyn Connector>,
    sessions: Arc<RwLock<SessionMap>>,
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

impl AppState {
    pub fn new(config: BrowserConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Browser of the cookie's session, if that session is still alive.
    pub async fn existing_browser(&self, jar: &CookieJar) -> Option<Arc<Mutex<Browser>>> {
        let id = session_id(jar)?;
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&id)?;
        if slot.last_seen.elapsed() >= self.config.session_idle_timeout {
            sessions.remove(&id);
            log::debug!("expired session {id}");
            return None;
        }
        slot.last_seen = Instant::now();
        Some(slot.browser.clone())
    }

    /// Browser of the cookie's session, creating a new session (and cookie)
    /// when the cookie is missing, unknown or expired.
    pub async fn browser(&self, jar: CookieJar) -> Result<(CookieJar, Arc<Mutex<Browser>>)> {
        if let Some(browser) = self.existing_browser(&jar).await {
            return Ok((jar, browser));
        }

        let id = Uuid::new_v4();
        let browser = Arc::new(Mutex::new(Browser::new(self.config.clone())?));
        {
            let mut sessions = self.sessions.write().await;
            self.evict(&mut sessions);
            sessions.insert(
                id,
                SessionSlot {
                    browser: browser.clone(),
                    last_seen: Instant::now(),
                },
            );
        }
        log::debug!("opened session {id}");

        let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .build();
        Ok((jar.add(cookie), browser))
    }

    /// Forget the cookie's session and clear the cookie.
    pub async fn end_session(&self, jar: CookieJar) -> CookieJar {
        if let Some(id) = session_id(&jar)
            && self.sessions.write().await.remove(&id).is_some()
        {
            log::debug!("closed session {id}");
        }
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    /// Drop idle sessions, then the least recently used ones until a new
    /// session fits under the cap.
    fn evict(&self, sessions: &mut SessionMap) {
        let idle_timeout = self.config.session_idle_timeout;
        sessions.retain(|_, slot| slot.last_seen.elapsed() < idle_timeout);

        while sessions.len() >= self.config.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    log::debug!("evicted session {id}");
                }
                None => break,
            }
        }
    }
}

/// All routes of the application.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/connect", post(handlers::connect))
        .route("/disconnect", post(handlers::disconnect))
        .route("/upload", post(handlers::upload))
        .route("/download", get(handlers::download))
        .route("/delete", get(handlers::confirm_delete).post(handlers::delete))
        .route("/view", get(handlers::view))
        .route("/api/entries", get(api::entries))
        .route("/api/metadata", get(api::metadata))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
