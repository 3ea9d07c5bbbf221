//! Bearer token cache for the warehouse API
//!
//! One `TokenCache` is built at start-up and shared by handle. Refreshes are
//! serialized behind an async mutex, so concurrent callers hitting an expired token
//! wait for a single upstream call instead of each issuing their own.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, DashboardResult};

/// A freshly issued token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime reported by the issuer, if any
    pub expires_in: Option<Duration>,
}

/// Anything that can mint warehouse tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> DashboardResult<IssuedToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Token endpoint reached over plain HTTP GET
pub struct HttpTokenSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTokenSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch_token(&self) -> DashboardResult<IssuedToken> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DashboardError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| DashboardError::Auth(format!("invalid token response: {e}")))?;

        match body.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => Ok(IssuedToken {
                access_token,
                expires_in: body.expires_in.map(Duration::from_secs),
            }),
            None => Err(DashboardError::Auth("token response has no access_token".to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    /// Real expiry minus the safety margin
    usable_until: Instant,
}

pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    default_lifetime: Duration,
    safety_margin: Duration,
    state: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(
        source: Arc<dyn TokenSource>,
        default_lifetime: Duration,
        safety_margin: Duration,
    ) -> Self {
        Self {
            source,
            default_lifetime,
            safety_margin,
            state: Mutex::new(None),
        }
    }

    /// Return a usable token, refreshing it first if it is missing or about to expire
    pub async fn get_token(&self) -> DashboardResult<String> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            if Instant::now() < cached.usable_until {
                return Ok(cached.value.clone());
            }
            debug!("Warehouse token expired, refreshing");
        }

        info!("Refreshing warehouse auth token...");
        let issued = match self.source.fetch_token().await {
            Ok(issued) => issued,
            Err(e) => {
                warn!("Failed to refresh warehouse auth token: {}", e);
                return Err(e);
            }
        };

        let lifetime = issued.expires_in.unwrap_or(self.default_lifetime);
        let usable_for = lifetime.saturating_sub(self.safety_margin);
        let value = issued.access_token;
        *state = Some(CachedToken {
            value: value.clone(),
            usable_until: Instant::now() + usable_for,
        });
        info!("Warehouse token refreshed (usable for {}s)", usable_for.as_secs());

        Ok(value)
    }

    /// Drop the cached token, e.g. after the warehouse rejected it
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Issues "token-1", "token-2", ... and counts calls
    pub(crate) struct CountingSource {
        pub calls: AtomicUsize,
        pub expires_in: Option<Duration>,
        pub fail: bool,
    }

    impl CountingSource {
        pub(crate) fn new(expires_in: Option<Duration>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                expires_in,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> DashboardResult<IssuedToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if self.fail {
                return Err(DashboardError::Auth("token endpoint unreachable".to_string()));
            }
            Ok(IssuedToken {
                access_token: format!("token-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    fn cache(source: Arc<CountingSource>) -> TokenCache {
        TokenCache::new(source, Duration::from_secs(3600), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn reuses_a_valid_token() {
        let source = Arc::new(CountingSource::new(None));
        let cache = cache(source.clone());

        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refreshes_inside_the_safety_margin() {
        // Reported lifetime shorter than the margin: never considered usable again
        let source = Arc::new(CountingSource::new(Some(Duration::from_secs(60))));
        let cache = cache(source.clone());

        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        assert_eq!(cache.get_token().await.unwrap(), "token-2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_refresh() {
        let source = Arc::new(CountingSource::new(None));
        let cache = cache(source.clone());

        cache.get_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.get_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let source = Arc::new(CountingSource::new(None));
        let cache = Arc::new(cache(source.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_surface_as_auth_errors_and_are_not_cached() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::new(None)
        });
        let cache = cache(source.clone());

        assert!(matches!(cache.get_token().await, Err(DashboardError::Auth(_))));
        assert!(cache.get_token().await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
