use crate::{AppState, access::matcher::GENERIC_PROTECTED_PREFIXES, handlers};
use axum::{Router, routing::get};

/// Account Router Module
///
/// Profile, orders, bookings, checkout and notifications. Any role may open
/// these once signed in.
pub fn account_routes() -> Router<AppState> {
    GENERIC_PROTECTED_PREFIXES
        .iter()
        .fold(Router::new(), |router, prefix| {
            router
                .route(prefix, get(handlers::page))
                .route(&format!("{}/{{*rest}}", prefix), get(handlers::page))
        })
}
