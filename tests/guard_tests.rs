use async_trait::async_trait;
use marketplace_portal::{
    GuardError, MockMarketplaceApi,
    api::ApiState,
    guard::{GuardOrchestrator, GuardState},
    models::Identity,
    session::{KeyValueStorage, MemoryStorage, SESSION_KEY, SessionStore},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

// --- Helpers ---

fn student() -> Identity {
    Identity::new("s-1", "student@example.com", "student", None)
}

struct Harness {
    guard: Arc<GuardOrchestrator>,
    api: Arc<MockMarketplaceApi>,
    storage: Arc<MemoryStorage>,
}

fn harness(storage: MemoryStorage, api: MockMarketplaceApi, credential: Option<&str>) -> Harness {
    let storage = Arc::new(storage);
    let api = Arc::new(api);
    let store = Arc::new(SessionStore::new(storage.clone()));
    let guard = GuardOrchestrator::new(
        store,
        api.clone() as ApiState,
        credential.map(str::to_string),
    );
    Harness {
        guard: Arc::new(guard),
        api,
        storage,
    }
}

/// Memory storage whose writes park until the test releases them, standing in
/// for a slow disk.
struct SlowWriteStorage {
    inner: MemoryStorage,
    release: Arc<Notify>,
    pending_writes: AtomicUsize,
}

impl SlowWriteStorage {
    fn new(release: Arc<Notify>) -> Self {
        Self {
            inner: MemoryStorage::new(),
            release,
            pending_writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl KeyValueStorage for SlowWriteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, GuardError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GuardError> {
        self.pending_writes.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), GuardError> {
        self.inner.remove(key).await
    }
}

fn redirecting(target: &str) -> Option<GuardState> {
    Some(GuardState::Redirecting(target.to_string()))
}

// --- State machine ---

#[tokio::test]
async fn test_navigation_before_mount_stays_initializing() {
    let h = harness(MemoryStorage::new(), MockMarketplaceApi::new(), None);

    assert_eq!(h.guard.state(), GuardState::Initializing);
    assert_eq!(
        h.guard.navigate("/dashboard/student").await,
        Some(GuardState::Initializing)
    );
    assert_eq!(h.api.profile_calls(), 0);
}

#[tokio::test]
async fn test_revalidation_establishes_session_and_allows() {
    let h = harness(
        MemoryStorage::new(),
        MockMarketplaceApi::with_profile(student()),
        Some("cookie-token"),
    );
    h.guard.mount().await;

    assert_eq!(
        h.guard.navigate("/dashboard/student/profile").await,
        Some(GuardState::Allowed)
    );
    assert_eq!(h.api.profile_calls(), 1);
    assert_eq!(
        h.guard.store().current_session().map(|s| s.identity),
        Some(student())
    );
    assert!(h.storage.raw(SESSION_KEY).is_some());
}

#[tokio::test]
async fn test_restored_session_skips_revalidation() {
    let previous = SessionStore::new(Arc::new(MemoryStorage::new()));
    let session = previous.establish_session(student()).await;
    let raw = serde_json::to_string(&session).unwrap();

    let h = harness(
        MemoryStorage::with_entry(SESSION_KEY, &raw),
        MockMarketplaceApi::new(),
        Some("cookie-token"),
    );
    h.guard.mount().await;

    assert_eq!(
        h.guard.navigate("/dashboard/vendor/services").await,
        redirecting("/dashboard/student")
    );
    assert_eq!(h.api.profile_calls(), 0);
}

#[tokio::test]
async fn test_failed_revalidation_redirects_to_login_once_per_mount() {
    let h = harness(MemoryStorage::new(), MockMarketplaceApi::new(), Some("stale"));
    h.guard.mount().await;

    assert_eq!(
        h.guard.navigate("/dashboard/student/profile").await,
        redirecting("/login?redirect=%2Fdashboard%2Fstudent%2Fprofile")
    );
    assert_eq!(h.guard.navigate("/orders").await, redirecting("/login?redirect=%2Forders"));
    assert_eq!(h.api.profile_calls(), 1);

    // A remount arms one more attempt.
    h.guard.mount().await;
    h.guard.navigate("/orders").await;
    assert_eq!(h.api.profile_calls(), 2);
}

#[tokio::test]
async fn test_no_credential_skips_network() {
    let h = harness(MemoryStorage::new(), MockMarketplaceApi::with_profile(student()), None);
    h.guard.mount().await;

    assert_eq!(h.guard.navigate("/").await, Some(GuardState::Allowed));
    assert_eq!(
        h.guard.navigate("/profile").await,
        redirecting("/login?redirect=%2Fprofile")
    );
    assert_eq!(h.api.profile_calls(), 0);
}

#[tokio::test]
async fn test_network_failure_degrades_to_login() {
    let api = MockMarketplaceApi::with_profile_result(Err(GuardError::NetworkFailure(
        "connection refused".to_string(),
    )));
    let h = harness(MemoryStorage::new(), api, Some("token"));
    h.guard.mount().await;

    assert_eq!(
        h.guard.navigate("/bookings").await,
        redirecting("/login?redirect=%2Fbookings")
    );
    assert_eq!(h.guard.state(), GuardState::Redirecting("/login?redirect=%2Fbookings".to_string()));
}

#[tokio::test]
async fn test_corrupt_storage_cleared_then_revalidated_once() {
    let h = harness(
        MemoryStorage::with_entry(SESSION_KEY, "][garbage"),
        MockMarketplaceApi::with_profile(student()),
        Some("cookie-token"),
    );
    h.guard.mount().await;
    assert_eq!(h.storage.raw(SESSION_KEY), None);

    assert_eq!(h.guard.navigate("/dashboard").await, redirecting("/dashboard/student"));
    assert_eq!(
        h.guard.navigate("/dashboard/student").await,
        Some(GuardState::Allowed)
    );
    assert_eq!(h.api.profile_calls(), 1);
}

#[tokio::test]
async fn test_every_navigation_is_reevaluated() {
    let h = harness(
        MemoryStorage::new(),
        MockMarketplaceApi::with_profile(student()),
        Some("cookie-token"),
    );
    h.guard.mount().await;

    assert_eq!(h.guard.navigate("/dashboard/student").await, Some(GuardState::Allowed));
    assert_eq!(
        h.guard.navigate("/dashboard/admin").await,
        redirecting("/dashboard/student")
    );
    assert_eq!(h.guard.navigate("/services").await, Some(GuardState::Allowed));
}

// --- Navigation race ---

#[tokio::test]
async fn test_superseded_revalidation_is_discarded() {
    let gate = Arc::new(Notify::new());
    let api = MockMarketplaceApi::with_profile(student()).gated(gate.clone());
    let h = harness(MemoryStorage::new(), api, Some("cookie-token"));
    h.guard.mount().await;

    let first = tokio::spawn({
        let guard = h.guard.clone();
        async move { guard.navigate("/dashboard/student").await }
    });

    // Wait until the first navigation is parked on the backend.
    while h.api.profile_calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.guard.state(), GuardState::Validating);

    // The user moves on before the profile arrives.
    assert_eq!(h.guard.navigate("/about").await, Some(GuardState::Allowed));

    gate.notify_one();
    assert_eq!(first.await.unwrap(), None);

    // The stale identity was not adopted and the newer decision stands.
    assert!(h.guard.store().current_session().is_none());
    assert_eq!(h.guard.state(), GuardState::Allowed);
    assert_eq!(h.api.profile_calls(), 1);
}

#[tokio::test]
async fn test_revalidation_from_previous_mount_is_discarded() {
    let gate = Arc::new(Notify::new());
    let api = MockMarketplaceApi::with_profile(student()).gated(gate.clone());
    let h = harness(MemoryStorage::new(), api, Some("cookie-token"));
    h.guard.mount().await;

    let first = tokio::spawn({
        let guard = h.guard.clone();
        async move { guard.navigate("/dashboard/student").await }
    });
    while h.api.profile_calls() == 0 {
        tokio::task::yield_now().await;
    }

    h.guard.mount().await;
    gate.notify_one();

    assert_eq!(first.await.unwrap(), None);
    assert!(h.guard.store().current_session().is_none());
    assert_eq!(h.storage.raw(SESSION_KEY), None);
}

#[tokio::test]
async fn test_logout_during_pending_session_write_stays_logged_out() {
    let release = Arc::new(Notify::new());
    let storage = Arc::new(SlowWriteStorage::new(release.clone()));
    let api = Arc::new(MockMarketplaceApi::with_profile(student()));
    let guard = Arc::new(GuardOrchestrator::new(
        Arc::new(SessionStore::new(storage.clone())),
        api as ApiState,
        Some("cookie-token".to_string()),
    ));
    guard.mount().await;

    let navigation = tokio::spawn({
        let guard = guard.clone();
        async move { guard.navigate("/dashboard/student").await }
    });
    // Wait until the revalidated session is being written.
    while storage.pending_writes.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let logout = tokio::spawn({
        let guard = guard.clone();
        async move { guard.logout().await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    release.notify_one();
    assert_eq!(navigation.await.unwrap(), None);
    assert_eq!(
        logout.await.unwrap(),
        GuardState::Redirecting("/login".to_string())
    );

    assert!(guard.store().current_session().is_none());
    assert_eq!(guard.state(), GuardState::Redirecting("/login".to_string()));

    // A reload over the same storage must not bring the user back.
    let reloaded = SessionStore::new(storage.clone());
    assert!(reloaded.hydrate().await.is_none());
}

// --- Sign in / out ---

#[tokio::test]
async fn test_sign_in_returns_to_preserved_destination() {
    let h = harness(MemoryStorage::new(), MockMarketplaceApi::new(), None);
    h.guard.mount().await;

    assert_eq!(
        h.guard
            .sign_in(student(), Some("%2Fdashboard%2Fstudent%2Fprofile"))
            .await,
        GuardState::Redirecting("/dashboard/student/profile".to_string())
    );
    assert_eq!(
        h.guard.navigate("/dashboard/student/profile").await,
        Some(GuardState::Allowed)
    );
}

#[tokio::test]
async fn test_logout_clears_session() {
    let h = harness(
        MemoryStorage::new(),
        MockMarketplaceApi::with_profile(student()),
        Some("cookie-token"),
    );
    h.guard.mount().await;
    h.guard.navigate("/orders").await;

    assert_eq!(
        h.guard.logout().await,
        GuardState::Redirecting("/login".to_string())
    );
    assert_eq!(h.storage.raw(SESSION_KEY), None);
    // The revalidation for this mount is spent, so the user stays signed out.
    assert_eq!(h.guard.navigate("/orders").await, redirecting("/login?redirect=%2Forders"));
    assert_eq!(h.api.profile_calls(), 1);
}
