// src/api.rs
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use metrics::histogram;
use tower_http::trace::TraceLayer;

use crate::cache::Snapshot;
use crate::render::{HtmlRenderer, IndexPage, PageRenderer};

/// Shared state for the HTTP handlers. The served snapshot is owned by the
/// caller and shared with the refresh loop.
#[derive(Clone)]
pub struct AppState {
    pub served: Arc<Snapshot>,
    pub renderer: Arc<dyn PageRenderer>,
}

impl AppState {
    pub fn new(served: Arc<Snapshot>) -> Self {
        Self {
            served,
            renderer: Arc::new(HtmlRenderer::default()),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let (stories, published_at) = state.served.read();
    let page = IndexPage {
        stories,
        elapsed: start.elapsed(),
        published_at,
    };

    let rendered = state.renderer.render(&page);
    histogram!("http_render_ms").record(start.elapsed().as_secs_f64() * 1_000.0);

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "rendering index failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process the template",
            )
                .into_response()
        }
    }
}
