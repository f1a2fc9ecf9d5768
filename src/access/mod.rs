/// Access Control Module
///
/// The single decision function shared by the edge interceptor
/// (`crate::edge_guard`) and the client-side Guard Orchestrator
/// (`crate::guard`). Both callers resolve an identity their own way and then
/// ask `decide` what to do with the path.
pub mod matcher;
pub mod redirect;

pub use matcher::{RouteClass, classify};
pub use redirect::{home_for, login_redirect, post_login_destination, scoped_root};

use crate::models::Identity;

/// AccessDecision
///
/// Outcome of evaluating one path for one identity. Computed fresh for every
/// navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(String),
}

/// decide
///
/// Pure and idempotent. `path` may carry a query string; it is preserved in
/// the login redirect and ignored for classification.
///
/// An identity with an unrecognized role is still signed in: it may open
/// public and role-agnostic pages, and anything else sends it to the default
/// landing page.
pub fn decide(path: &str, identity: Option<&Identity>) -> AccessDecision {
    let role = identity.and_then(|identity| identity.role().ok());

    match (classify(path, role), identity) {
        (RouteClass::Public, _) => AccessDecision::Allow,
        (RouteClass::RoleScoped(_), Some(_)) => AccessDecision::Allow,
        (RouteClass::GenericProtected, Some(_)) => AccessDecision::Allow,
        (RouteClass::ProtectedRoot | RouteClass::Unlisted, Some(identity)) => {
            AccessDecision::Redirect(home_for(identity).to_string())
        }
        (_, None) => AccessDecision::Redirect(login_redirect(path)),
    }
}
