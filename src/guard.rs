use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    access::{self, AccessDecision, redirect::LOGIN_PATH},
    api::ApiState,
    error::GuardError,
    models::Identity,
    session::SessionStore,
};

/// GuardState
///
/// What the page shell shows for the current navigation. Protected content
/// is rendered only in `Allowed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Store hydration has not finished; show a loading indicator.
    Initializing,
    /// No local session; the one-per-mount backend revalidation is in flight.
    Validating,
    Allowed,
    /// Navigation to the contained path has been issued.
    Redirecting(String),
}

struct GuardInner {
    state: GuardState,
    hydrated: bool,
    revalidation_spent: bool,
    /// Bumped on every navigation; tags in-flight revalidations.
    epoch: u64,
}

/// GuardOrchestrator
///
/// Client-side half of the access guard. Sequences hydration, the single
/// backend revalidation and the access decision on every navigation. The
/// decision itself is `access::decide`, the same function the edge
/// interceptor uses.
///
/// The session store and the backend are injected so the state machine can
/// run in isolation.
pub struct GuardOrchestrator {
    store: Arc<SessionStore>,
    api: ApiState,
    /// Transport credential the client holds, if any.
    credential: Option<String>,
    inner: Mutex<GuardInner>,
}

impl GuardOrchestrator {
    pub fn new(store: Arc<SessionStore>, api: ApiState, credential: Option<String>) -> Self {
        Self {
            store,
            api,
            credential,
            inner: Mutex::new(GuardInner {
                state: GuardState::Initializing,
                hydrated: false,
                revalidation_spent: false,
                epoch: 0,
            }),
        }
    }

    pub fn state(&self) -> GuardState {
        self.inner.lock().state.clone()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// mount
    ///
    /// Hydrates the session store and arms the revalidation for this mount.
    pub async fn mount(&self) {
        {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            inner.state = GuardState::Initializing;
            inner.hydrated = false;
        }

        let session = self.store.hydrate().await;
        tracing::debug!(restored = session.is_some(), "guard mounted");

        let mut inner = self.inner.lock();
        inner.hydrated = true;
        inner.revalidation_spent = false;
    }

    /// navigate
    ///
    /// Evaluates `path` from scratch and returns the resulting state.
    ///
    /// Returns `None` when a newer navigation started while this one was
    /// waiting on the backend: its result is discarded, including any
    /// identity the backend returned.
    pub async fn navigate(&self, path: &str) -> Option<GuardState> {
        let (epoch, revalidate) = {
            let mut inner = self.inner.lock();
            inner.epoch += 1;

            if !inner.hydrated {
                inner.state = GuardState::Initializing;
                return Some(GuardState::Initializing);
            }

            let revalidate =
                self.store.current_session().is_none() && !inner.revalidation_spent;
            if revalidate {
                inner.revalidation_spent = true;
                inner.state = GuardState::Validating;
            }
            (inner.epoch, revalidate)
        };

        if revalidate {
            let outcome = self.revalidate().await;

            let superseded = self.inner.lock().epoch != epoch;
            if superseded {
                tracing::debug!(path, epoch, "discarding revalidation from superseded navigation");
                return None;
            }

            match outcome {
                Ok(identity) => {
                    self.store.establish_session(identity).await;
                }
                Err(e) => {
                    tracing::info!(error = %e, "revalidation failed, continuing signed out");
                }
            }
        }

        let identity = self.store.current_session().map(|session| session.identity);
        let state = match access::decide(path, identity.as_ref()) {
            AccessDecision::Allow => GuardState::Allowed,
            AccessDecision::Redirect(target) => {
                tracing::debug!(path, target = %target, "guard redirect");
                GuardState::Redirecting(target)
            }
        };

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return None;
        }
        inner.state = state.clone();
        Some(state)
    }

    /// sign_in
    ///
    /// Establishes a session for a freshly authenticated identity and sends it
    /// to the destination preserved in the login URL, if that is allowed.
    pub async fn sign_in(&self, identity: Identity, redirect_param: Option<&str>) -> GuardState {
        let target = access::post_login_destination(redirect_param, &identity);
        self.store.establish_session(identity).await;

        let state = GuardState::Redirecting(target);
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.state = state.clone();
        state
    }

    /// logout
    ///
    /// Clears the session and returns to the login page. Any navigation still
    /// in flight is superseded before the store is touched.
    pub async fn logout(&self) -> GuardState {
        self.inner.lock().epoch += 1;
        self.store.clear_session().await;

        let state = GuardState::Redirecting(LOGIN_PATH.to_string());
        self.inner.lock().state = state.clone();
        state
    }

    async fn revalidate(&self) -> Result<Identity, GuardError> {
        match &self.credential {
            Some(credential) => self.api.fetch_profile(credential).await,
            None => Err(GuardError::InvalidCredential),
        }
    }
}
