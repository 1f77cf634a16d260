use crate::*;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use blobnav::config::BrowserConfig;
use blobnav::error::Result;
use blobnav::storage::Connector;
use blobnav::web::{AppState, SESSION_COOKIE, router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub fn tests(ctx: &TestContext, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        ctx,
        test_web_healthz,
        test_web_index_shows_connect_form,
        test_web_connect_then_list,
        test_web_connect_failure_is_a_notice,
        test_web_upload_download_roundtrip,
        test_web_delete_needs_confirmation,
        test_web_view_page,
        test_web_api_status_codes,
        test_web_sessions_are_isolated,
        test_web_cookieless_requests_open_no_session,
        test_web_disconnect_ends_session,
        test_web_sessions_are_capped,
        test_web_idle_sessions_expire
    ));
}

const BOUNDARY: &str = "blobnav-test-boundary";

/// Drives the router the way a browser would, carrying the session cookie.
struct WebClient {
    app: Router,
    cookie: Option<String>,
}

impl WebClient {
    fn new(ctx: &TestContext, root: &str) -> Self {
        let connector: Arc<dyn Connector> = ctx.connector.clone();
        let config = BrowserConfig {
            root_prefix: root.to_string(),
            ..BrowserConfig::default()
        };
        Self::with_state(AppState::new(config, connector))
    }

    fn with_state(state: AppState) -> Self {
        Self {
            app: router(state),
            cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Response {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn upload(&mut self, uri: &str, files: &[(&str, &str)]) -> Response {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                 Content-Type: text/plain\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        let request = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn connect(&mut self) -> Response {
        let form = format!(
            "account={TEST_ACCOUNT}&container={TEST_CONTAINER}&token={}",
            urlencoding::encode(TEST_TOKEN)
        );
        self.post_form("/connect", &form).await
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn test_web_healthz(ctx: TestContext) -> Result<()> {
    let mut web = WebClient::new(&ctx, "");
    let response = web.get("/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    Ok(())
}

async fn test_web_index_shows_connect_form(ctx: TestContext) -> Result<()> {
    let mut web = WebClient::new(&ctx, "");
    let response = web.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(SESSION_COOKIE));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let html = body_text(response).await;
    assert!(html.contains("action=\"/connect\""));
    assert!(html.contains("type=\"password\""));

    Ok(())
}

async fn test_web_connect_then_list(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    ctx.write(&format!("{root}herd/pig.txt"), "oink").await?;
    ctx.write(&format!("{root}weights.csv"), "1,2").await?;

    let mut web = WebClient::new(&ctx, &root);
    let response = web.connect().await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let html = body_text(web.get("/").await).await;
    assert!(html.contains("Connected to container"));
    assert!(html.contains("herd/"));
    assert!(html.contains("weights.csv"));
    assert!(!html.contains("TOPSECRETSIGNATURE"), "token leaked into page");

    let uri = format!("/?path={}", urlencoding::encode(&format!("{root}herd/")));
    let html = body_text(web.get(&uri).await).await;
    assert!(html.contains("pig.txt"));
    assert!(!html.contains("weights.csv"));

    let response = web.post_form("/disconnect", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(web.get("/").await).await;
    assert!(html.contains("action=\"/connect\""));

    Ok(())
}

async fn test_web_connect_failure_is_a_notice(_ctx: TestContext) -> Result<()> {
    let state = AppState::new(BrowserConfig::default(), Arc::new(RejectingConnector));
    let mut web = WebClient::with_state(state);

    let response = web.connect().await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(web.get("/").await).await;
    assert!(html.contains("notice error"));
    assert!(html.contains("action=\"/connect\""));
    assert!(!html.contains("TOPSECRETSIGNATURE"), "token leaked into page");

    let response = web.post_form("/connect", "account=&container=data&token=x").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(web.get("/").await).await;
    assert!(html.contains("account name is required"));

    Ok(())
}

async fn test_web_upload_download_roundtrip(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let mut web = WebClient::new(&ctx, &root);
    web.connect().await;

    let uri = format!("/upload?path={}", urlencoding::encode(&root));
    let response = web
        .upload(&uri, &[("one.txt", "first"), ("two.txt", "second")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let stored = ctx.operator().read(&format!("{root}two.txt")).await?.to_vec();
    assert_eq!(stored, b"second");

    let html = body_text(web.get("/").await).await;
    assert!(html.contains("Uploaded"));
    assert!(html.contains("one.txt"));

    let uri = format!(
        "/download?path={}",
        urlencoding::encode(&format!("{root}one.txt"))
    );
    let response = web.get(&uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("one.txt"));
    assert_eq!(body_text(response).await, "first");

    let uri = format!(
        "/download?path={}",
        urlencoding::encode(&format!("{root}missing.txt"))
    );
    let response = web.get(&uri).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    Ok(())
}

async fn test_web_delete_needs_confirmation(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let path = format!("{root}doomed.txt");
    ctx.write(&path, "x").await?;

    let mut web = WebClient::new(&ctx, &root);
    web.connect().await;

    let response = web
        .get(&format!("/delete?path={}", urlencoding::encode(&path)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("confirm"));
    assert!(ctx.operator().exists(&path).await?);

    let form = format!("path={}", urlencoding::encode(&path));
    let response = web.post_form("/delete", &form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(ctx.operator().exists(&path).await?, "unconfirmed delete ran");

    let form = format!(
        "path={}&confirm=yes",
        urlencoding::encode(&format!("{root}.//doomed.txt"))
    );
    web.post_form("/delete", &form).await;
    assert!(!ctx.operator().exists(&path).await?);

    let html = body_text(web.get("/").await).await;
    assert!(html.contains("requires confirmation"));
    assert!(
        html.contains(&format!("Deleted &#39;{path}&#39; (1 object(s))")),
        "notice should name the deleted key"
    );

    Ok(())
}

async fn test_web_view_page(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let path = format!("{root}config.json");
    ctx.write(&path, "{\"pigs\":3}").await?;

    let mut web = WebClient::new(&ctx, &root);
    web.connect().await;

    let response = web
        .get(&format!("/view?path={}", urlencoding::encode(&path)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("&quot;pigs&quot;: 3"));
    assert!(html.contains("Download"));

    Ok(())
}

async fn test_web_api_status_codes(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    ctx.write(&format!("{root}a.txt"), "abc").await?;

    let mut web = WebClient::new(&ctx, &root);
    let response = web.get("/api/entries").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "validation");

    web.connect().await;
    let response = web.get("/api/entries").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["prefix"], root.as_str());
    assert_eq!(body["entries"][0]["name"], "a.txt");
    assert_eq!(body["entries"][0]["size"], 3);

    let uri = format!(
        "/api/metadata?path={}",
        urlencoding::encode(&format!("{root}nope.txt"))
    );
    let response = web.get(&uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "not_found");

    let response = web.get("/api/metadata?path=elsewhere.txt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

async fn test_web_sessions_are_isolated(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let connector: Arc<dyn Connector> = ctx.connector.clone();
    let state = AppState::new(
        BrowserConfig {
            root_prefix: root.clone(),
            ..BrowserConfig::default()
        },
        connector,
    );

    let mut alice = WebClient::with_state(state.clone());
    let mut bob = WebClient::with_state(state.clone());

    alice.connect().await;
    bob.get("/").await;
    assert_eq!(state.session_count().await, 2);

    let response = alice.get("/api/entries").await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = bob.get("/api/entries").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

fn state_with(ctx: &TestContext, config: BrowserConfig) -> AppState {
    let connector: Arc<dyn Connector> = ctx.connector.clone();
    AppState::new(config, connector)
}

async fn test_web_cookieless_requests_open_no_session(ctx: TestContext) -> Result<()> {
    let state = state_with(&ctx, BrowserConfig::default());

    for _ in 0..50 {
        let mut web = WebClient::with_state(state.clone());
        let response = web.get("/api/entries").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let response = web.get("/download?path=a.txt").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
    assert_eq!(state.session_count().await, 0);

    let mut web = WebClient::with_state(state.clone());
    web.get("/api/metadata?path=a.txt").await;
    web.post_form("/delete", "path=a.txt&confirm=yes").await;
    assert_eq!(state.session_count().await, 0);

    Ok(())
}

async fn test_web_disconnect_ends_session(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let state = state_with(
        &ctx,
        BrowserConfig {
            root_prefix: root.clone(),
            ..BrowserConfig::default()
        },
    );
    let mut web = WebClient::with_state(state.clone());
    let stale_cookie = {
        web.connect().await;
        web.cookie.clone().unwrap()
    };
    assert_eq!(state.session_count().await, 1);

    let response = web.post_form("/disconnect", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(state.session_count().await, 0);

    // The old cookie no longer reaches the connected browser.
    web.cookie = Some(stale_cookie);
    let response = web.get("/api/entries").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

async fn test_web_sessions_are_capped(ctx: TestContext) -> Result<()> {
    let state = state_with(
        &ctx,
        BrowserConfig {
            max_sessions: 3,
            ..BrowserConfig::default()
        },
    );

    let mut first = WebClient::with_state(state.clone());
    first.get("/").await;
    for _ in 0..5 {
        WebClient::with_state(state.clone()).get("/").await;
    }
    assert_eq!(state.session_count().await, 3);

    // The least recently used session was dropped, so the first client
    // gets a fresh session.
    let response = first.get("/").await;
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    assert_eq!(state.session_count().await, 3);

    Ok(())
}

async fn test_web_idle_sessions_expire(ctx: TestContext) -> Result<()> {
    let state = state_with(
        &ctx,
        BrowserConfig {
            session_idle_timeout: Duration::ZERO,
            ..BrowserConfig::default()
        },
    );

    let mut web = WebClient::with_state(state.clone());
    web.connect().await;
    let response = web.get("/api/entries").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST, "expired session");

    WebClient::with_state(state.clone()).get("/").await;
    WebClient::with_state(state.clone()).get("/").await;
    assert_eq!(state.session_count().await, 1);

    Ok(())
}
