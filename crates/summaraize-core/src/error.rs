//! Error types shared by the router, the flows, and configuration loading

use std::time::Duration;

use thiserror::Error;

/// Why a single provider attempt did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    /// Transport, authentication, or quota error from the provider
    #[error("call failed: {0}")]
    CallFailed(String),
    /// The provider answered without usable text
    #[error("empty result")]
    EmptyResult,
    /// The provider did not answer before the per-provider deadline
    #[error("timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

/// One failed attempt in a fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub failure: AttemptFailure,
}

impl std::fmt::Display for ProviderAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.failure)
    }
}

/// Terminal failure of a generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Every configured provider was unavailable, failed, or returned nothing.
    /// `attempts` holds one entry per provider that was actually called.
    #[error("all providers exhausted ({})", format_attempts(.attempts))]
    AllProvidersExhausted { attempts: Vec<ProviderAttempt> },
    /// A single-provider operation found no provider with a credential
    #[error("no provider is available")]
    NoProviderAvailable,
}

fn format_attempts(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no provider was available".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the user-facing flows
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// A single-provider flow failed; carries the provider and its failure
    #[error("{operation} failed on {provider}: {failure}")]
    OperationFailed {
        operation: &'static str,
        provider: String,
        failure: AttemptFailure,
    },
}

/// Errors produced while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown provider '{0}' (expected groq, openai or gemini)")]
    UnknownProvider(String),
    #[error("provider '{0}' is listed more than once in providers.order")]
    DuplicateProvider(String),
    #[error("providers.order must not be empty")]
    EmptyOrder,
    #[error("providers.timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("invalid gateway bind address '{0}'")]
    InvalidBind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_lists_attempts() {
        let err = GenerationError::AllProvidersExhausted {
            attempts: vec![
                ProviderAttempt {
                    provider: "groq".to_string(),
                    failure: AttemptFailure::CallFailed("rate limited".to_string()),
                },
                ProviderAttempt {
                    provider: "openai".to_string(),
                    failure: AttemptFailure::EmptyResult,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "all providers exhausted (groq: call failed: rate limited; openai: empty result)"
        );
    }

    #[test]
    fn test_exhausted_message_without_attempts() {
        let err = GenerationError::AllProvidersExhausted { attempts: vec![] };
        assert_eq!(
            err.to_string(),
            "all providers exhausted (no provider was available)"
        );
    }

    #[test]
    fn test_timed_out_display() {
        let failure = AttemptFailure::TimedOut(Duration::from_millis(1500));
        assert_eq!(failure.to_string(), "timed out after 1.5s");
    }
}
