use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

use crate::{
    error::GuardError,
    models::{Category, Identity, Service},
};

// 1. MarketplaceApi Contract
/// MarketplaceApi
///
/// The slice of the backend REST API this tier consumes. The guard only needs
/// `fetch_profile`; the catalog pages use the listings.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Asks the backend who owns `credential`. This is the revalidation the
    /// Guard Orchestrator performs when no local session exists.
    async fn fetch_profile(&self, credential: &str) -> Result<Identity, GuardError>;

    async fn list_services(&self) -> Result<Vec<Service>, GuardError>;

    async fn list_categories(&self) -> Result<Vec<Category>, GuardError>;
}

pub type ApiState = Arc<dyn MarketplaceApi>;

// 2. The Real Implementation (reqwest)
/// HttpMarketplaceApi
///
/// Talks to the backend over HTTP. `base_url` is the API root, for example
/// `http://localhost:5000/api`.
#[derive(Clone)]
pub struct HttpMarketplaceApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMarketplaceApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GuardError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| GuardError::NetworkFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GuardError::NetworkFailure(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }

        let body = response
            .json::<ListEnvelope<T>>()
            .await
            .map_err(|e| GuardError::NetworkFailure(e.to_string()))?;

        Ok(body.into_items())
    }
}

/// Profile payload: either the user object itself or `{ "user": { … } }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileEnvelope {
    Wrapped { user: ProfileBody },
    Bare(ProfileBody),
}

#[derive(Deserialize)]
struct ProfileBody {
    #[serde(alias = "_id")]
    id: String,
    email: String,
    role: String,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
}

impl From<ProfileEnvelope> for Identity {
    fn from(envelope: ProfileEnvelope) -> Self {
        let body = match envelope {
            ProfileEnvelope::Wrapped { user } => user,
            ProfileEnvelope::Bare(body) => body,
        };
        Identity::new(body.id, body.email, &body.role, body.name)
    }
}

/// Listing payload: a bare array or `{ "data": [ … ] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Wrapped { data } => data,
            ListEnvelope::Bare(items) => items,
        }
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    async fn fetch_profile(&self, credential: &str) -> Result<Identity, GuardError> {
        let response = self
            .client
            .get(self.url("/auth/profile"))
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| GuardError::NetworkFailure(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GuardError::InvalidCredential);
            }
            status if !status.is_success() => {
                return Err(GuardError::NetworkFailure(format!(
                    "GET /auth/profile returned {}",
                    status
                )));
            }
            _ => {}
        }

        let envelope = response
            .json::<ProfileEnvelope>()
            .await
            .map_err(|e| GuardError::NetworkFailure(e.to_string()))?;

        Ok(envelope.into())
    }

    async fn list_services(&self) -> Result<Vec<Service>, GuardError> {
        self.get_list("/services").await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, GuardError> {
        self.get_list("/categories").await
    }
}

// 3. The Mock Implementation (For Tests)
/// MockMarketplaceApi
///
/// Canned backend used by the guard and handler tests. `profile_gate`, when
/// set, holds every profile request until the test releases it, which is how
/// the navigation race is reproduced deterministically.
pub struct MockMarketplaceApi {
    pub profile: Result<Identity, GuardError>,
    pub services: Result<Vec<Service>, GuardError>,
    pub categories: Vec<Category>,
    pub profile_gate: Option<Arc<Notify>>,
    profile_calls: AtomicUsize,
}

impl Default for MockMarketplaceApi {
    fn default() -> Self {
        Self {
            profile: Err(GuardError::InvalidCredential),
            services: Ok(vec![]),
            categories: vec![],
            profile_gate: None,
            profile_calls: AtomicUsize::new(0),
        }
    }
}

impl MockMarketplaceApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(identity: Identity) -> Self {
        Self::with_profile_result(Ok(identity))
    }

    pub fn with_profile_result(profile: Result<Identity, GuardError>) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    pub fn with_services(services: Vec<Service>) -> Self {
        Self::with_services_result(Ok(services))
    }

    pub fn with_services_result(services: Result<Vec<Service>, GuardError>) -> Self {
        Self {
            services,
            ..Self::default()
        }
    }

    /// Holds profile requests until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.profile_gate = Some(gate);
        self
    }

    /// Number of profile requests received so far.
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketplaceApi for MockMarketplaceApi {
    async fn fetch_profile(&self, _credential: &str) -> Result<Identity, GuardError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.profile_gate {
            gate.notified().await;
        }
        self.profile.clone()
    }

    async fn list_services(&self) -> Result<Vec<Service>, GuardError> {
        self.services.clone()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, GuardError> {
        Ok(self.categories.clone())
    }
}
