/// Router Module Index
///
/// Page routes split by the access class the edge interceptor assigns them.
/// The interceptor is layered over all three in `create_router`; the split
/// only keeps each table next to the routes it protects.

/// Pages and catalog endpoints anyone may open.
pub mod public;

/// Role-scoped dashboard pages.
pub mod dashboard;

/// Pages open to any signed-in role.
pub mod account;
