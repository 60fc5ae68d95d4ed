//! Ordered multi-provider failover
//!
//! A [`FailoverClient`] holds a fixed, ordered chain of providers and tries
//! them in turn: unhealthy providers are skipped without being invoked,
//! failing providers cascade to the next, and the first success wins. The
//! same state machine serves every provider kind (text generation, audio
//! transcription) through the generic request/response parameters.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from provider execution
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider-originated failure, message passed through verbatim
    #[error("{0}")]
    Failed(String),

    /// Provider-originated failure carrying an HTTP-style status code
    #[error("provider error {status}: {message}")]
    Api { status: u16, message: String },

    /// Fixed sentinel: the chain was empty or no provider could be invoked
    #[error("all providers failed or unavailable")]
    NoneAvailable,
}

/// External capability endpoint: execute a request, optionally report health
///
/// Health checking is an optional capability: the default implementation
/// returns `None`, meaning "no health check, invoke directly". Returning
/// `Some(false)` makes the failover client skip the provider without
/// calling [`execute`](Provider::execute).
#[async_trait]
pub trait Provider<Req, Resp>: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Optional health capability; `None` when not implemented
    async fn health_check(&self) -> Option<bool> {
        None
    }

    /// Execute one request
    ///
    /// Providers own their request timeouts and must return promptly on
    /// failure so the next provider in the chain can be tried.
    async fn execute(&self, request: Req) -> Result<Resp, ProviderError>;
}

/// Ordered-provider executor
///
/// Holds no state beyond the chain itself; the order is fixed at
/// construction.
pub struct FailoverClient<Req, Resp> {
    providers: Vec<Arc<dyn Provider<Req, Resp>>>,
}

impl<Req, Resp> FailoverClient<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + 'static,
{
    /// Create a client over an ordered provider chain
    pub fn new(providers: Vec<Arc<dyn Provider<Req, Resp>>>) -> Self {
        debug!(provider_count = providers.len(), "FailoverClient::new: called");
        Self { providers }
    }

    /// Number of configured providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are configured
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try each provider in order until one succeeds
    ///
    /// Returns the first success, or - when the whole chain is exhausted -
    /// the **last** recorded error: the most recent failure is presumed most
    /// relevant to current conditions. An empty chain, or one where every
    /// provider was skipped as unhealthy, yields
    /// [`ProviderError::NoneAvailable`].
    pub async fn execute(&self, request: Req) -> Result<Resp, ProviderError> {
        debug!(provider_count = self.providers.len(), "FailoverClient::execute: called");
        let mut last_error: Option<ProviderError> = None;

        for provider in &self.providers {
            if let Some(false) = provider.health_check().await {
                warn!(provider = provider.name(), "Provider unhealthy, skipping without invoking");
                continue;
            }

            match provider.execute(request.clone()).await {
                Ok(response) => {
                    debug!(provider = provider.name(), "FailoverClient::execute: provider succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ProviderError::NoneAvailable))
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockProvider;
    use super::*;

    fn chain(providers: Vec<Arc<MockProvider>>) -> FailoverClient<String, String> {
        FailoverClient::new(
            providers
                .into_iter()
                .map(|p| p as Arc<dyn Provider<String, String>>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_first_healthy_provider_wins() {
        let p1 = Arc::new(MockProvider::succeeding("p1", "from-p1"));
        let p2 = Arc::new(MockProvider::succeeding("p2", "from-p2"));
        let client = chain(vec![Arc::clone(&p1), Arc::clone(&p2)]);

        let response = client.execute("req".to_string()).await.unwrap();
        assert_eq!(response, "from-p1");
        assert_eq!(p1.execute_count(), 1);
        assert_eq!(p2.execute_count(), 0);
    }

    #[tokio::test]
    async fn test_unhealthy_provider_skipped_without_invoking() {
        let p1 = Arc::new(MockProvider::succeeding("p1", "from-p1").with_health(false));
        let p2 = Arc::new(MockProvider::succeeding("p2", "from-p2").with_health(true));
        let p3 = Arc::new(MockProvider::succeeding("p3", "from-p3").with_health(true));
        let client = chain(vec![Arc::clone(&p1), Arc::clone(&p2), Arc::clone(&p3)]);

        let response = client.execute("req".to_string()).await.unwrap();
        assert_eq!(response, "from-p2");
        assert_eq!(p1.execute_count(), 0, "unhealthy provider must never be invoked");
        assert_eq!(p2.execute_count(), 1);
        assert_eq!(p3.execute_count(), 0, "later providers untouched after a success");
    }

    #[tokio::test]
    async fn test_failure_cascades_to_next_provider() {
        let p1 = Arc::new(MockProvider::failing("p1", "p1 down"));
        let p2 = Arc::new(MockProvider::succeeding("p2", "from-p2"));
        let client = chain(vec![Arc::clone(&p1), Arc::clone(&p2)]);

        let response = client.execute("req".to_string()).await.unwrap();
        assert_eq!(response, "from-p2");
        assert_eq!(p1.execute_count(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let p1 = Arc::new(MockProvider::failing("p1", "err-A"));
        let p2 = Arc::new(MockProvider::failing("p2", "err-B"));
        let client = chain(vec![p1, p2]);

        let error = client.execute("req".to_string()).await.unwrap_err();
        assert_eq!(error.to_string(), "err-B");
    }

    #[tokio::test]
    async fn test_empty_chain_returns_sentinel() {
        let client: FailoverClient<String, String> = FailoverClient::new(vec![]);

        let error = client.execute("req".to_string()).await.unwrap_err();
        assert!(matches!(error, ProviderError::NoneAvailable));
        assert_eq!(error.to_string(), "all providers failed or unavailable");
    }

    #[tokio::test]
    async fn test_all_unhealthy_returns_sentinel() {
        let p1 = Arc::new(MockProvider::succeeding("p1", "x").with_health(false));
        let p2 = Arc::new(MockProvider::succeeding("p2", "y").with_health(false));
        let client = chain(vec![Arc::clone(&p1), Arc::clone(&p2)]);

        let error = client.execute("req".to_string()).await.unwrap_err();
        assert!(matches!(error, ProviderError::NoneAvailable));
        assert_eq!(p1.execute_count(), 0);
        assert_eq!(p2.execute_count(), 0);
        assert_eq!(p1.health_count(), 1);
    }

    #[tokio::test]
    async fn test_no_health_capability_is_invoked_directly() {
        let p1 = Arc::new(MockProvider::failing("p1", "err"));
        let client = chain(vec![Arc::clone(&p1)]);

        let _ = client.execute("req".to_string()).await;
        // Default health_check returns None: provider is executed anyway
        assert_eq!(p1.execute_count(), 1);
    }
}
