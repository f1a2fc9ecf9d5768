use crate::{
    access::{AccessDecision, decide},
    models::{Identity, Role},
};

/// Where the login page lives.
pub const LOGIN_PATH: &str = "/login";

/// Query parameter carrying the originally requested path through login.
pub const REDIRECT_PARAM: &str = "redirect";

/// Landing page for identities whose role has no dashboard.
pub const DEFAULT_LANDING: &str = "/";

/// Canonical dashboard root of a role.
pub fn scoped_root(role: Role) -> &'static str {
    match role {
        Role::Student => "/dashboard/student",
        Role::Vendor => "/dashboard/vendor",
        Role::Admin => "/dashboard/admin",
    }
}

/// home_for
///
/// The identity's own scoped root. An unrecognized role lands on the public
/// default instead of a denied page.
pub fn home_for(identity: &Identity) -> &'static str {
    match identity.role() {
        Ok(role) => scoped_root(role),
        Err(e) => {
            tracing::warn!(subject = %identity.subject_id, error = %e, "falling back to default landing");
            DEFAULT_LANDING
        }
    }
}

/// login_redirect
///
/// Login entry point with the requested path preserved, percent-encoded, in
/// the `redirect` parameter.
pub fn login_redirect(requested: &str) -> String {
    format!(
        "{}?{}={}",
        LOGIN_PATH,
        REDIRECT_PARAM,
        urlencoding::encode(requested)
    )
}

/// post_login_destination
///
/// Where to send a freshly authenticated identity. The preserved `redirect`
/// value is honoured only when it is a local path the identity may actually
/// open; anything else (off-site URLs, protocol-relative paths, paths the
/// guard would bounce) resolves to the identity's home.
pub fn post_login_destination(redirect_param: Option<&str>, identity: &Identity) -> String {
    let home = home_for(identity);

    let Some(raw) = redirect_param else {
        return home.to_string();
    };

    let target = match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => return home.to_string(),
    };

    if !is_local_path(&target) {
        tracing::warn!(target = %target, "ignoring non-local redirect target");
        return home.to_string();
    }

    match decide(&target, Some(identity)) {
        AccessDecision::Allow => target,
        AccessDecision::Redirect(_) => home.to_string(),
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}
