use std::env;

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared through
/// `AppState` (pulled out by the edge interceptor via `FromRef`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and secret strictness.
    pub env: Env,
    // Shared secret the access credentials are signed with (HS256).
    pub jwt_secret: String,
    // Root of the backend REST API, without a trailing slash.
    pub api_base_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "marketplace-local-development-secret";
const LOCAL_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// Non-panicking configuration for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            api_base_url: LOCAL_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Panics
    /// In production, panics when `JWT_SECRET` or `API_BASE_URL` is missing:
    /// the server must not start able to accept forged or unverifiable
    /// credentials. Locally both fall back to development values.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                api_base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| LOCAL_API_BASE_URL.to_string()),
                bind_addr,
            },
            Env::Production => Self {
                env: Env::Production,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                api_base_url: env::var("API_BASE_URL")
                    .expect("FATAL: API_BASE_URL must be set in production."),
                bind_addr,
            },
        }
    }
}
