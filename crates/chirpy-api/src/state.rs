//! Application state

use chirpy_auth::{DeploymentGate, JwtManager, RefreshTokenService, WebhookGuard};
use chirpy_db::Database;
use chrono::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prometheus render handle served on `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Auth settings taken from configuration
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub polka_key: String,
    pub platform: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub leeway: Duration,
}

/// Process-wide count of static file hits
#[derive(Debug, Clone, Default)]
pub struct HitCounter(Arc<AtomicU64>);

impl HitCounter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub refresh: RefreshTokenService,
    pub webhook: WebhookGuard,
    pub gate: DeploymentGate,
    pub hits: HitCounter,
}

impl AppState {
    pub fn new(db: Database, auth: AuthSettings) -> Self {
        let jwt = JwtManager::new(&auth.jwt_secret, auth.access_token_ttl).with_leeway(auth.leeway);
        let refresh = RefreshTokenService::new(Arc::new(db.clone()), auth.refresh_token_ttl);

        Self {
            db,
            jwt: Arc::new(jwt),
            refresh,
            webhook: WebhookGuard::new(auth.polka_key),
            gate: DeploymentGate::new(auth.platform),
            hits: HitCounter::default(),
        }
    }
}
