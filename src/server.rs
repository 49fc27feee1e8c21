use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use eyre::{Result, WrapErr};
use log::{error, info};
use serde::Deserialize;

use crate::handler::handle_submission;
use crate::render::{Page, Render};
use crate::resolve::Resolver;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub renderer: Arc<dyn Render>,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub video_url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/summarize", post(summarize_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index_handler(State(state): State<AppState>) -> Response {
    render_page(state.renderer.as_ref(), &Page::default())
}

async fn summarize_handler(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> Response {
    let outcome = handle_submission(&state.resolver, &form.video_url, state.timeout).await;
    render_page(state.renderer.as_ref(), &outcome.into_page())
}

async fn health_handler() -> &'static str {
    "ok"
}

fn render_page(renderer: &dyn Render, page: &Page) -> Response {
    match renderer.render(page) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::provider::TrackKind;
    use crate::render::HtmlTemplate;
    use crate::testutil::{FakeProvider, record, track};

    fn state(provider: FakeProvider) -> AppState {
        AppState {
            resolver: Arc::new(Resolver::new(Arc::new(provider), vec!["en".to_string()])),
            renderer: Arc::new(HtmlTemplate::embedded().unwrap()),
            timeout: Duration::from_secs(5),
        }
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn submit(video_url: &str) -> Request<Body> {
        let body = format!("video_url={}", video_url);
        Request::post("/summarize")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let resp = router(state(FakeProvider::default()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains(r#"name="video_url""#));
    }

    #[tokio::test]
    async fn test_health() {
        let resp = router(state(FakeProvider::default()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }

    #[tokio::test]
    async fn test_submit_renders_transcript() {
        let en = track("en", TrackKind::Manual);
        let mut provider = FakeProvider::with_tracks(vec![en.clone()]);
        provider
            .segments
            .insert(en.base_url.clone(), vec![record("Hello"), record("<world>")]);

        let resp = router(state(provider))
            .oneshot(submit("https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Hello &lt;world&gt;"));
        assert!(html.contains("Full transcript"));
        assert!(!html.contains(r#"class="error""#));
    }

    #[tokio::test]
    async fn test_submit_bare_video_id() {
        let provider = FakeProvider::with_tracks(vec![track("en", TrackKind::Manual)]);
        let resp = router(state(provider)).oneshot(submit("dQw4w9WgXcQ")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("en manual"));
        assert!(html.contains(r#"value="dQw4w9WgXcQ""#));
        assert!(!html.contains(r#"class="error""#));
    }

    #[tokio::test]
    async fn test_submit_invalid_url_shows_error() {
        let resp = router(state(FakeProvider::default()))
            .oneshot(submit("not+a+url"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Invalid YouTube URL"));
        assert!(html.contains(r#"value="not a url""#));
    }

    #[tokio::test]
    async fn test_submit_disabled_transcripts_shows_error() {
        let resp = router(state(FakeProvider::disabled()))
            .oneshot(submit("dQw4w9WgXcQ"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("Transcripts are disabled for this video."));
        assert!(!html.contains("Full transcript"));
    }

    #[tokio::test]
    async fn test_missing_field_is_treated_as_empty() {
        let req = Request::post("/summarize")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::empty())
            .unwrap();
        let resp = router(state(FakeProvider::default())).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Please enter a YouTube video URL."));
    }

    #[tokio::test]
    async fn test_get_summarize_not_allowed() {
        let resp = router(state(FakeProvider::default()))
            .oneshot(Request::get("/summarize").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    struct BrokenRenderer;

    impl Render for BrokenRenderer {
        fn render(&self, _page: &Page) -> Result<String> {
            eyre::bail!("template exploded")
        }
    }

    #[tokio::test]
    async fn test_render_failure_is_500() {
        let mut app = state(FakeProvider::default());
        app.renderer = Arc::new(BrokenRenderer);
        let resp = router(app)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
