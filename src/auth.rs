use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{error::GuardError, models::Identity};

/// Name of the cookie the login flow stores the access credential under.
pub const SESSION_COOKIE: &str = "token";

/// Claims
///
/// Payload of the access credential issued by the backend. Older tokens carry
/// the subject as `id` and the display name as `displayName`; both spellings
/// are accepted.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "id")]
    pub sub: String,
    pub email: String,
    pub role: String,
    #[serde(default, alias = "displayName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration Time (exp). Always validated.
    pub exp: usize,
    pub iat: usize,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity::new(claims.sub, claims.email, &claims.role, claims.name)
    }
}

/// verify_token
///
/// The Token Verifier. Decodes an HS256 credential with the shared secret and
/// returns the identity it carries.
///
/// Expiry maps to `ExpiredCredential`; every other decoding failure (bad
/// signature, malformed token, missing claims) maps to `InvalidCredential`.
pub fn verify_token(token: &str, secret: &str) -> Result<Identity, GuardError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims.into()),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(GuardError::ExpiredCredential),
            _ => Err(GuardError::InvalidCredential),
        },
    }
}

/// credential_from_headers
///
/// Finds the access credential on an incoming request: a `Bearer` token in
/// the Authorization header wins, otherwise the `token` cookie is used.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Viewer
///
/// The identity the edge interceptor resolved for the current request, or
/// `None` for an anonymous visitor on a public page. Handlers take it as an
/// argument instead of decoding the credential again.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Identity>);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Viewer>().cloned().unwrap_or_default())
    }
}
