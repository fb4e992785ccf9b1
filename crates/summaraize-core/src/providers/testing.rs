//! Scripted providers for unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::types::{GenerationRequest, GenerationResult, LlmProvider};

pub(crate) enum Behavior {
    Text(&'static str),
    Fail(&'static str),
    Hang,
}

pub(crate) struct StubProvider {
    id: &'static str,
    available: bool,
    behavior: Behavior,
    calls: AtomicUsize,
    last_request: std::sync::Mutex<Option<GenerationRequest>>,
}

impl StubProvider {
    pub(crate) fn new(id: &'static str, available: bool, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id,
            available,
            behavior,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn identifier(&self) -> &str {
        self.id
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match self.behavior {
            Behavior::Text(t) => Ok(GenerationResult::new(t)),
            Behavior::Fail(msg) => Err(anyhow::anyhow!(msg)),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(GenerationResult::new("too late"))
            }
        }
    }
}
