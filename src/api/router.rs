//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router with all routes under `/api/`.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/contracts",
            post(endpoints::contracts::upload).get(endpoints::contracts::list),
        )
        .route(
            "/contracts/:id",
            get(endpoints::contracts::detail).delete(endpoints::contracts::delete),
        )
        .route("/contracts/:id/files", post(endpoints::contracts::add_file))
        .route(
            "/contracts/:id/files/:file_id",
            delete(endpoints::contracts::remove_file),
        )
        .route("/contracts/:id/ocr", post(endpoints::contracts::trigger_ocr))
        .route(
            "/contracts/:id/reviews",
            post(endpoints::reviews::submit).get(endpoints::reviews::history),
        )
        .route("/reviews/pending", get(endpoints::reviews::pending))
        .route("/reviews/summary", get(endpoints::reviews::summary))
        .route("/queue", get(endpoints::contracts::queue_status))
        .with_state(ctx);

    Router::new().nest("/api", routes)
}
