//! summaraize-core: providers, the fallback chain, and the user-facing flows
//!
//! A [`FallbackRouter`] tries each configured [`LlmProvider`] in priority
//! order and returns the first non-empty generation. The [`flows`] module
//! builds the summarize, transcript optimization, and document Q&A
//! operations on top of it.

pub mod config;
pub mod error;
pub mod flows;
pub mod providers;
pub mod status;

pub use config::Config;
pub use error::{AttemptFailure, ConfigError, FlowError, GenerationError, ProviderAttempt};
pub use providers::{FallbackRouter, Generation, GenerationRequest, GenerationResult, LlmProvider};
