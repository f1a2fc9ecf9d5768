use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access guard: shared decision, token verification, session, orchestration.
pub mod access;
pub mod auth;
pub mod guard;
pub mod session;

// Backend access and page-level features.
pub mod api;
pub mod attendance;
pub mod catalog;
pub mod handlers;
pub mod models;

pub mod config;
pub mod error;

// Page routers, grouped by access class.
pub mod routes;
use routes::{account, dashboard, public};

use access::AccessDecision;
use auth::{Viewer, credential_from_headers, verify_token};

// --- Public Re-exports ---

pub use api::{ApiState, HttpMarketplaceApi, MockMarketplaceApi};
pub use config::AppConfig;
pub use error::GuardError;

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_services, handlers::get_service, handlers::list_categories),
    components(schemas(
        models::Service, models::Category, models::Identity, models::PageView,
        models::Role, catalog::SortOrder,
        attendance::AttendanceSheet, attendance::DayCell,
    )),
    tags((name = "marketplace-portal", description = "Services marketplace web tier"))
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Backend REST API client.
    pub api: ApiState,
    pub config: AppConfig,
}

impl FromRef<AppState> for ApiState {
    fn from_ref(app_state: &AppState) -> ApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// edge_guard
///
/// The edge interceptor. Runs before any page handler: verifies the request's
/// credential, asks `access::decide` about the requested path, and either
/// redirects or lets the request through with the resolved `Viewer` attached.
///
/// A path with trailing slashes is first sent to its canonical form with a
/// 308, so the router only ever sees paths the decision classified.
///
/// A missing, forged or expired credential is treated exactly like no
/// credential. Protected handlers are never reached on a redirect, so no
/// protected content is produced for a denied request.
async fn edge_guard(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let canonical = access::matcher::normalize(path);
    if canonical != path {
        let target = match request.uri().query() {
            Some(query) => format!("{}?{}", canonical, query),
            None => canonical.to_string(),
        };
        tracing::debug!(path, target = %target, "canonicalizing path");
        return Redirect::permanent(&target).into_response();
    }

    let requested = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let identity = credential_from_headers(request.headers()).and_then(|token| {
        verify_token(&token, &config.jwt_secret)
            .inspect_err(|e| tracing::debug!(error = %e, "credential rejected at edge"))
            .ok()
    });

    match access::decide(&requested, identity.as_ref()) {
        AccessDecision::Allow => {
            request.extensions_mut().insert(Viewer(identity));
            next.run(request).await
        }
        AccessDecision::Redirect(target) => {
            tracing::info!(
                requested = %requested,
                target = %target,
                signed_in = identity.is_some(),
                "access redirect"
            );
            Redirect::temporary(&target).into_response()
        }
    }
}

/// create_router
///
/// Assembles the page routers, puts the edge interceptor in front of all of
/// them (fallback included, so unlisted paths are denied by default), and
/// adds the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(dashboard::dashboard_routes())
        .merge(account::account_routes())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), edge_guard))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, URI and the `x-request-id` so every log line
/// of one request correlates.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
