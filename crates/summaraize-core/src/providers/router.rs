//! Fallback router: tries providers in priority order until one answers
//!
//! Attempts are strictly sequential. The first provider that returns
//! non-empty text wins and no later provider is called. A provider without
//! a credential is skipped without an attempt entry; a provider that errors,
//! times out, or answers with empty text is recorded and the chain moves on.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::types::{GenerationRequest, LlmProvider};
use crate::error::{AttemptFailure, GenerationError, ProviderAttempt};

/// A successful generation, tagged with the provider that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub provider: String,
    pub text: String,
}

/// Ordered candidate list plus the per-provider deadline
pub struct FallbackRouter {
    providers: Vec<Arc<dyn LlmProvider>>,
    timeout: Duration,
}

impl std::fmt::Debug for FallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|p| p.identifier()).collect();
        f.debug_struct("FallbackRouter")
            .field("providers", &ids)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FallbackRouter {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Build the router from configuration
    pub fn from_config(config: &crate::config::ProvidersConfig) -> Self {
        Self::new(super::build_providers(config), config.timeout())
    }

    pub fn providers(&self) -> &[Arc<dyn LlmProvider>] {
        &self.providers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// First provider in priority order that has its credential
    pub fn primary(&self) -> Option<&Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.is_available())
    }

    /// Run one bounded call against a single provider
    pub async fn attempt(
        &self,
        provider: &dyn LlmProvider,
        request: &GenerationRequest,
    ) -> Result<String, AttemptFailure> {
        match tokio::time::timeout(self.timeout, provider.generate(request)).await {
            Err(_) => Err(AttemptFailure::TimedOut(self.timeout)),
            Ok(Err(e)) => Err(AttemptFailure::CallFailed(format!("{e:#}"))),
            Ok(Ok(result)) if result.is_empty() => Err(AttemptFailure::EmptyResult),
            Ok(Ok(result)) => Ok(result.text),
        }
    }

    /// Try each available provider in order and return the first non-empty result
    pub async fn invoke(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let mut attempts: Vec<ProviderAttempt> = Vec::new();

        for provider in &self.providers {
            let id = provider.identifier();
            if !provider.is_available() {
                debug!(provider = id, "Skipping provider without credential");
                continue;
            }

            info!(provider = id, model = provider.model(), "Attempting generation");
            match self.attempt(provider.as_ref(), request).await {
                Ok(text) => {
                    info!(
                        provider = id,
                        chars = text.len(),
                        failed_before = attempts.len(),
                        "Generation succeeded"
                    );
                    return Ok(Generation {
                        provider: id.to_string(),
                        text,
                    });
                }
                Err(failure) => {
                    warn!(provider = id, error = %failure, "Provider failed, falling back");
                    attempts.push(ProviderAttempt {
                        provider: id.to_string(),
                        failure,
                    });
                }
            }
        }

        error!(attempted = attempts.len(), "All providers exhausted");
        Err(GenerationError::AllProvidersExhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{Behavior, StubProvider};

    fn router(providers: &[&Arc<StubProvider>]) -> FallbackRouter {
        let providers = providers
            .iter()
            .map(|p| Arc::clone(*p) as Arc<dyn LlmProvider>)
            .collect();
        FallbackRouter::new(providers, Duration::from_secs(5))
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("You summarize.", "Summarize this.")
    }

    #[tokio::test]
    async fn test_first_success_stops_chain() {
        let a = StubProvider::new("a", true, Behavior::Text("first"));
        let b = StubProvider::new("b", true, Behavior::Text("second"));
        let result = router(&[&a, &b]).invoke(&request()).await.unwrap();

        assert_eq!(result.text, "first");
        assert_eq!(result.provider, "a");
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_after_error() {
        let a = StubProvider::new("a", true, Behavior::Fail("boom"));
        let b = StubProvider::new("b", true, Behavior::Text("second"));
        let result = router(&[&a, &b]).invoke(&request()).await.unwrap();

        assert_eq!(result.text, "second");
        assert_eq!(result.provider, "b");
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_skip_fail_succeed_scenario() {
        let a = StubProvider::new("a", false, Behavior::Text("never"));
        let b = StubProvider::new("b", true, Behavior::Fail("rate limited"));
        let c = StubProvider::new("c", true, Behavior::Text("ok"));
        let result = router(&[&a, &b, &c]).invoke(&request()).await.unwrap();

        assert_eq!(result, Generation {
            provider: "c".to_string(),
            text: "ok".to_string(),
        });
        assert_eq!(a.calls(), 0);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 1);
    }

    #[tokio::test]
    async fn test_skip_fail_records_only_attempted() {
        let a = StubProvider::new("a", false, Behavior::Text("never"));
        let b = StubProvider::new("b", true, Behavior::Fail("rate limited"));
        let err = router(&[&a, &b]).invoke(&request()).await.unwrap_err();

        let GenerationError::AllProvidersExhausted { attempts } = err else {
            panic!("expected exhaustion");
        };
        assert_eq!(attempts, vec![ProviderAttempt {
            provider: "b".to_string(),
            failure: AttemptFailure::CallFailed("rate limited".to_string()),
        }]);
    }

    #[tokio::test]
    async fn test_empty_result_is_failure() {
        let a = StubProvider::new("a", true, Behavior::Text(""));
        let err = router(&[&a]).invoke(&request()).await.unwrap_err();

        assert_eq!(err, GenerationError::AllProvidersExhausted {
            attempts: vec![ProviderAttempt {
                provider: "a".to_string(),
                failure: AttemptFailure::EmptyResult,
            }],
        });
    }

    #[tokio::test]
    async fn test_empty_result_continues_chain() {
        let a = StubProvider::new("a", true, Behavior::Text("   "));
        let b = StubProvider::new("b", true, Behavior::Text("filled"));
        let result = router(&[&a, &b]).invoke(&request()).await.unwrap();
        assert_eq!(result.provider, "b");
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_fail_one_entry_per_attempt() {
        let a = StubProvider::new("a", true, Behavior::Fail("auth"));
        let b = StubProvider::new("b", false, Behavior::Fail("unused"));
        let c = StubProvider::new("c", true, Behavior::Text(""));
        let err = router(&[&a, &b, &c]).invoke(&request()).await.unwrap_err();

        let GenerationError::AllProvidersExhausted { attempts } = err else {
            panic!("expected exhaustion");
        };
        let ids: Vec<&str> = attempts.iter().map(|a| a.provider.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(attempts[1].failure, AttemptFailure::EmptyResult);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_unavailable_has_no_attempts() {
        let a = StubProvider::new("a", false, Behavior::Text("x"));
        let b = StubProvider::new("b", false, Behavior::Text("y"));
        let err = router(&[&a, &b]).invoke(&request()).await.unwrap_err();

        assert_eq!(err, GenerationError::AllProvidersExhausted { attempts: vec![] });
        assert_eq!(a.calls() + b.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_router_exhausts() {
        let router = FallbackRouter::new(Vec::new(), Duration::from_secs(1));
        assert!(router.invoke(&request()).await.is_err());
        assert!(router.primary().is_none());
    }

    #[tokio::test]
    async fn test_same_request_same_selection() {
        let a = StubProvider::new("a", true, Behavior::Fail("down"));
        let b = StubProvider::new("b", true, Behavior::Text("stable"));
        let router = router(&[&a, &b]);

        let first = router.invoke(&request()).await.unwrap();
        let second = router.invoke(&request()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(a.calls(), 2);
        assert_eq!(b.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_next_provider() {
        let a = StubProvider::new("a", true, Behavior::Hang);
        let b = StubProvider::new("b", true, Behavior::Text("fast"));
        let providers: Vec<Arc<dyn LlmProvider>> =
            vec![a.clone() as Arc<dyn LlmProvider>, b.clone() as Arc<dyn LlmProvider>];
        let router = FallbackRouter::new(providers, Duration::from_millis(100));

        let result = router.invoke(&request()).await.unwrap();
        assert_eq!(result.provider, "b");

        let err = FallbackRouter::new(vec![a.clone() as Arc<dyn LlmProvider>], Duration::from_millis(100))
            .invoke(&request())
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::AllProvidersExhausted {
            attempts: vec![ProviderAttempt {
                provider: "a".to_string(),
                failure: AttemptFailure::TimedOut(Duration::from_millis(100)),
            }],
        });
    }

    #[test]
    fn test_primary_skips_unavailable() {
        let a = StubProvider::new("a", false, Behavior::Text("x"));
        let b = StubProvider::new("b", true, Behavior::Text("y"));
        let router = router(&[&a, &b]);
        assert_eq!(router.primary().map(|p| p.identifier()), Some("b"));
    }

    #[test]
    fn test_debug_lists_provider_ids() {
        let a = StubProvider::new("a", true, Behavior::Text("x"));
        let debug = format!("{:?}", router(&[&a]));
        assert!(debug.contains("[\"a\"]"));
    }
}
