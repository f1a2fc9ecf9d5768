use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
};

use crate::{
    AppState,
    access::matcher::normalize,
    auth::Viewer,
    catalog::{self, ServiceQuery},
    error::GuardError,
    models::{Category, PageView, Service},
};

/// page
///
/// Shared handler for every page route. By the time it runs the edge
/// interceptor has already allowed the request, so it only reports which page
/// was reached and for whom.
pub async fn page(Viewer(viewer): Viewer, uri: Uri) -> Json<PageView> {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    Json(PageView {
        page: page_name(uri.path()),
        path,
        viewer,
    })
}

/// `/` is "home", dashboard pages are named after their scope
/// ("dashboard/vendor"), everything else after its first segment.
fn page_name(path: &str) -> String {
    let mut segments = normalize(path).split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (None, _) => "home".to_string(),
        (Some("dashboard"), Some(scope)) => format!("dashboard/{}", scope),
        (Some(first), _) => first.to_string(),
    }
}

/// list_services
///
/// [Public Route] Backend service listing with the catalog filters applied.
#[utoipa::path(
    get,
    path = "/services",
    params(ServiceQuery),
    responses(
        (status = 200, description = "Filtered services", body = [Service]),
        (status = 502, description = "Backend unavailable")
    )
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<Vec<Service>>, GuardError> {
    let services = state.api.list_services().await.inspect_err(|e| {
        tracing::warn!(error = %e, "service listing failed");
    })?;
    Ok(Json(catalog::apply(services, &query)))
}

/// get_service
///
/// [Public Route] A single listing, looked up in the backend catalog.
#[utoipa::path(
    get,
    path = "/services/{id}",
    params(("id" = String, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Found", body = Service),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Backend unavailable")
    )
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Service>, StatusCode> {
    let services = state.api.list_services().await.map_err(|e| {
        tracing::warn!(error = %e, "service lookup failed");
        StatusCode::BAD_GATEWAY
    })?;

    services
        .into_iter()
        .find(|service| service.id == id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Categories", body = [Category]),
        (status = 502, description = "Backend unavailable")
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, GuardError> {
    Ok(Json(state.api.list_categories().await?))
}

/// Reached only for public-looking paths with no page behind them; every
/// other unknown path is redirected by the edge interceptor first.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::page_name;

    #[test]
    fn page_names() {
        assert_eq!(page_name("/"), "home");
        assert_eq!(page_name("/login"), "login");
        assert_eq!(page_name("/dashboard/vendor/services"), "dashboard/vendor");
        assert_eq!(page_name("/orders/17"), "orders");
    }
}
