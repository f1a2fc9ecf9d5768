use crate::{AppState, access::scoped_root, handlers, models::Role};
use axum::{Router, routing::get};

/// Dashboard Router Module
///
/// One subtree per role, rooted at the role's scoped root. The bare
/// `/dashboard` has no route: the edge interceptor always redirects it.
pub fn dashboard_routes() -> Router<AppState> {
    Role::ALL.iter().fold(Router::new(), |router, role| {
        let root = scoped_root(*role);
        router
            .route(root, get(handlers::page))
            .route(&format!("{}/{{*rest}}", root), get(handlers::page))
    })
}
