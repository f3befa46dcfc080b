// In-process stand-ins for the generation backend, shared by unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::generation::request::{GenerationRequest, GenerationResult, TextGenerator};

type Responder = dyn Fn(&GenerationRequest) -> (u64, GenerationResult) + Send + Sync;

/// Answers every request with a closure and records what it was asked.
pub struct FnGenerator {
    respond: Box<Responder>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl FnGenerator {
    pub fn new(
        respond: impl Fn(&GenerationRequest) -> GenerationResult + Send + Sync + 'static,
    ) -> Self {
        Self::delayed(move |request| (0, respond(request)))
    }

    /// Like `new`, but the closure also returns how many milliseconds to wait before answering.
    pub fn delayed(
        respond: impl Fn(&GenerationRequest) -> (u64, GenerationResult) + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the requests seen so far, usable after the generator is moved.
    pub fn recorder(&self) -> Arc<Mutex<Vec<GenerationRequest>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl TextGenerator for FnGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        self.calls.lock().unwrap().push(request.clone());
        let (delay_ms, result) = (self.respond)(request);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        result
    }
}
