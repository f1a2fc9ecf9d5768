use crate::{AppState, access::matcher::PUBLIC_EXACT, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Every exact public path is served by the shared page handler; the catalog
/// lives under the `/services` and `/categories` wildcard prefixes.
pub fn public_routes() -> Router<AppState> {
    let pages = PUBLIC_EXACT
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, get(handlers::page))
        });

    pages
        // GET /health
        // Load balancer check.
        .route("/health", get(|| async { "ok" }))
        // GET /services?category=...&search=...&sort=...
        .route("/services", get(handlers::list_services))
        .route("/services/{id}", get(handlers::get_service))
        .route("/categories", get(handlers::list_categories))
}
