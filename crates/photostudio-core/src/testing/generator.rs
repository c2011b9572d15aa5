use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use photostudio_proto::{GenerationFailure, GenerationRequest, GenerationResult, ImageGenerator};

#[derive(Debug, Default)]
struct GeneratorState {
    results: VecDeque<GenerationResult>,
    requests: Vec<GenerationRequest>,
}

/// Generator that returns pre-scripted results in order.
///
/// Once the script is exhausted every call fails with a backend error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    state: Arc<Mutex<GeneratorState>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new(results: Vec<GenerationResult>) -> Self {
        Self {
            state: Arc::new(Mutex::new(GeneratorState {
                results: results.into(),
                requests: Vec::new(),
            })),
            delay: None,
        }
    }

    /// Makes every call take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        state.results.pop_front().unwrap_or_else(|| {
            Err(GenerationFailure::BackendError(
                "no scripted response".to_string(),
            ))
        })
    }
}
