use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use docsearch_core::persist::open_index;
use docsearch_core::{Engine, Error, SearchConfig, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f32,
    pub name: String,
    pub title: String,
    pub filename: Option<String>,
    pub objects: Vec<ObjectHit>,
}

#[derive(Serialize)]
pub struct ObjectHit {
    pub name: String,
    pub category: String,
    pub anchor: String,
}

impl From<SearchResult> for SearchHit {
    fn from(r: SearchResult) -> Self {
        let objects = r
            .objects
            .into_iter()
            .map(|o| ObjectHit { name: o.name, category: o.category, anchor: o.anchor })
            .collect();
        Self {
            doc_id: r.document.id,
            score: r.score,
            name: r.document.name,
            title: r.document.title,
            filename: r.document.filename,
            objects,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// File or snapshot directory re-read by `/index/reload`.
    pub index_source: PathBuf,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

fn api_error(err: Error) -> ApiError {
    let status = match err {
        Error::IndexNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        Error::MalformedIndex(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Load the index at `index_dir` and build the router around it.
pub fn build_app(index_dir: impl Into<PathBuf>, config: SearchConfig) -> Result<Router> {
    let index_source = index_dir.into();
    let engine = Engine::new(config)?;
    engine.load_index(open_index(&index_source)?)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState { engine: Arc::new(engine), index_source, admin_token }))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let results = state.engine.search(&params.q).map_err(api_error)?;
    let total_hits = results.len();
    let k = params.k.clamp(1, MAX_K);
    let results = results.into_iter().take(k).map(SearchHit::from).collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.engine.snapshot().ok_or_else(|| api_error(Error::IndexNotLoaded))?;
    let doc = snapshot
        .document(doc_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("document {doc_id} not found")))?;
    Ok(Json(serde_json::json!({
        "doc_id": doc.id,
        "name": doc.name,
        "title": doc.title,
        "filename": doc.filename,
    })))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let snapshot = open_index(&state.index_source).map_err(api_error)?;
    let (num_docs, num_terms) = (snapshot.num_docs(), snapshot.num_terms());
    state.engine.load_index(snapshot).map_err(api_error)?;
    tracing::info!(num_docs, num_terms, source = %state.index_source.display(), "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs, "num_terms": num_terms })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
