//! Marquee - HTTP API
//!
//! JSON endpoints over the lookup service, plus optional serving of a built
//! frontend for everything outside `/api`.
//!
//! | Route                  | Purpose                            |
//! |------------------------|------------------------------------|
//! | `GET /api/ping`        | Liveness probe                     |
//! | `GET /api/movies`      | Paginated movie summaries          |
//! | `GET /api/movies/{id}` | Full record by id (or exact title) |
//!
//! Unknown `/api` routes always answer with a JSON 404 and never fall
//! through to the frontend. Outside `/api`, unknown paths serve
//! `index.html` when a frontend directory is configured (client-side
//! routing), or the same JSON 404 when not.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::service::{MovieList, MovieService, Page};

// ─── Router ─────────────────────────────────────────────────────────────────

/// Build the full application router.
///
/// Layer order matters: CORS outermost so even error responses carry the
/// headers, tracing next so the access log sees final status codes, and
/// panic-catching innermost so a crashing handler becomes a JSON 500
/// instead of a dropped connection.
pub fn router(service: Arc<MovieService>, static_dir: Option<&std::path::Path>) -> Router {
    let api = Router::new()
        .route("/ping", get(ping))
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
        .fallback(unknown_route)
        .with_state(service);

    let app = Router::new().nest("/api", api);
    let app = match static_dir {
        Some(dir) => {
            // Unmatched paths get index.html with a 200 so the browser app
            // can do its own routing.
            let index = ServeFile::new(dir.join("index.html"));
            app.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => app.fallback(unknown_route),
    };

    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ─── Handlers ───────────────────────────────────────────────────────────────

/// Liveness probe.
async fn ping() -> &'static str {
    "pong"
}

/// `GET /api/movies` — one page of movie summaries.
///
/// Paging parameters come from the raw query map, so a repeated key keeps
/// its last value instead of failing deserialization. Coercion lives in
/// [`Page::from_raw`]; malformed values must never produce a 400.
async fn list_movies(
    State(service): State<Arc<MovieService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<MovieList> {
    let page = Page::from_raw(
        params.get("limit").map(String::as_str),
        params.get("offset").map(String::as_str),
    );
    Json(service.list(page).await)
}

/// `GET /api/movies/{id}` — full record by id, or by exact title.
async fn get_movie(
    State(service): State<Arc<MovieService>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match service.get_by_id(&id).await {
        Some(movie) => Ok(Json(movie)),
        None => Err(ApiError::not_found("Movie not found")),
    }
}

/// JSON 404 for any route the API does not know.
async fn unknown_route() -> ApiError {
    ApiError::not_found("Not Found")
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Error response carrying the `{"error": "..."}` body the frontend expects.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn not_found(message: &'static str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Panic-to-500 mapping. The request gets a generic body; the panic detail
/// goes to the log only.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "non-string panic payload"
    };
    error!("Handler panicked: {}", detail);

    ApiError::internal().into_response()
}

// ─── Server bootstrap ──────────────────────────────────────────────────────

/// Bind and serve until ctrl-c or SIGTERM.
pub async fn start_server(
    service: MovieService,
    host: &str,
    port: u16,
    static_dir: Option<&std::path::Path>,
) -> Result<()> {
    let app = router(Arc::new(service), static_dir);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Marquee API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Resolves when the process receives ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installs");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installs")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::catalog::CatalogLoader;

    fn sample_movies() -> Vec<Value> {
        vec![
            json!({
                "id": 862,
                "title": "Toy Story",
                "tagline": "The adventure takes off!",
                "vote_average": 7.7,
                "overview": "A cowboy doll is profoundly threatened."
            }),
            json!({"id": 27205, "title": "Inception", "vote": 83}),
        ]
    }

    fn test_app(records: Vec<Value>) -> Router {
        let service = MovieService::new(CatalogLoader::preloaded(records));
        router(Arc::new(service), None)
    }

    async fn get_response(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get_response(app, uri).await;
        let json = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_ping() {
        let (status, body) = get_response(test_app(Vec::new()), "/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"pong");
    }

    #[tokio::test]
    async fn test_list_wire_shape() {
        let (status, body) = get_json(test_app(sample_movies()), "/api/movies").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(2));
        assert_eq!(body["count"], json!(2));
        assert_eq!(
            body["data"][0],
            json!({
                "id": 862,
                "title": "Toy Story",
                "tagline": "The adventure takes off!",
                "vote_average": 7.7
            })
        );
        assert_eq!(body["data"][1]["vote_average"], json!(8.3));
    }

    #[tokio::test]
    async fn test_list_empty_catalog_shape() {
        let (status, body) = get_json(test_app(Vec::new()), "/api/movies").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"total": 0, "count": 0, "data": []}));
    }

    #[tokio::test]
    async fn test_list_pagination_params() {
        let (status, body) =
            get_json(test_app(sample_movies()), "/api/movies?limit=1&offset=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(2));
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["data"][0]["title"], json!("Inception"));
    }

    #[tokio::test]
    async fn test_list_malformed_params_still_ok() {
        let (status, body) =
            get_json(test_app(sample_movies()), "/api/movies?limit=abc&offset=-5").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], json!(2));
    }

    #[tokio::test]
    async fn test_list_repeated_params_last_wins() {
        let (status, body) = get_json(
            test_app(sample_movies()),
            "/api/movies?limit=1&limit=2&offset=0&offset=1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(2));
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["data"][0]["title"], json!("Inception"));
    }

    #[tokio::test]
    async fn test_get_found() {
        let (status, body) = get_json(test_app(sample_movies()), "/api/movies/862").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], json!("Toy Story"));
        assert_eq!(body["vote_average"], json!(7.7));
        assert_eq!(
            body["overview"],
            json!("A cowboy doll is profoundly threatened.")
        );
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (status, body) = get_json(test_app(sample_movies()), "/api/movies/999999").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Movie not found"}));
    }

    #[tokio::test]
    async fn test_get_url_encoded_title() {
        let (status, body) = get_json(test_app(sample_movies()), "/api/movies/toy%20story").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(862));
    }

    #[tokio::test]
    async fn test_unknown_api_route_json_404() {
        let (status, body) = get_json(test_app(Vec::new()), "/api/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_unknown_route_without_frontend() {
        let (status, body) = get_json(test_app(Vec::new()), "/anywhere/else").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_static_frontend_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>marquee</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();

        let service = MovieService::new(CatalogLoader::preloaded(sample_movies()));
        let app = router(Arc::new(service), Some(dir.path()));

        // Real asset served as-is
        let (status, body) = get_response(app.clone(), "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"console.log('hi')");

        // Client-side route falls back to index.html with a 200
        let (status, body) = get_response(app.clone(), "/movies/862").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>marquee</html>");

        // API misses never fall through to the frontend
        let (status, body) = get_json(app, "/api/movies/999999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Movie not found"}));
    }

    async fn boom() -> Json<Value> {
        panic!("catalog exploded")
    }

    #[tokio::test]
    async fn test_panic_maps_to_json_500() {
        let app = Router::new()
            .route("/api/movies", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let (status, body) = get_json(app, "/api/movies").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }
}
