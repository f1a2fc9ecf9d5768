use crate::models::Role;

/// Paths anyone may open, matched exactly.
pub const PUBLIC_EXACT: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/forgot-password",
    "/about",
    "/contact",
    "/unauthorized",
];

/// Public wildcard prefixes: the prefix itself and everything below it.
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/services",
    "/categories",
    "/vendors",
    "/health",
    "/api-docs",
    "/swagger-ui",
];

/// The unscoped dashboard root. Never rendered; always resolved to the
/// caller's own scoped root.
pub const PROTECTED_ROOT: &str = "/dashboard";

/// Protected pages that any signed-in role may open.
pub const GENERIC_PROTECTED_PREFIXES: &[&str] = &[
    "/profile",
    "/orders",
    "/bookings",
    "/checkout",
    "/notifications",
];

/// Route prefixes owned by a single role.
pub fn role_prefixes(role: Role) -> &'static [&'static str] {
    match role {
        Role::Student => &["/dashboard/student"],
        Role::Vendor => &["/dashboard/vendor"],
        Role::Admin => &["/dashboard/admin"],
    }
}

/// RouteClass
///
/// The Route Classification of a path. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    RoleScoped(Role),
    ProtectedRoot,
    GenericProtected,
    /// Matches no table: denied by default.
    Unlisted,
}

/// classify
///
/// Matches `path` against the route tables in fixed precedence:
/// public, then the caller's own role table, then the bare dashboard root,
/// then role-agnostic protected prefixes. Other roles' tables are never
/// consulted, so a foreign dashboard path falls through to `Unlisted`.
pub fn classify(path: &str, role: Option<Role>) -> RouteClass {
    let path = normalize(path);

    if PUBLIC_EXACT.contains(&path) || matches_any(path, PUBLIC_PREFIXES) {
        return RouteClass::Public;
    }

    if let Some(role) = role {
        if matches_any(path, role_prefixes(role)) {
            return RouteClass::RoleScoped(role);
        }
    }

    if path == PROTECTED_ROOT {
        return RouteClass::ProtectedRoot;
    }

    if matches_any(path, GENERIC_PROTECTED_PREFIXES) {
        return RouteClass::GenericProtected;
    }

    RouteClass::Unlisted
}

/// Strips the query string and fragment and collapses trailing slashes.
/// An empty result becomes `/`.
pub fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| matches_prefix(path, prefix))
}

/// Segment-aware prefix match: `/services` covers `/services/x` but not
/// `/servicesx`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
