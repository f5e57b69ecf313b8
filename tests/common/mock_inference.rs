//! Mock Inference Backend for Testing
//!
//! Records every (instructions, input) pair and answers with a canned reply.

use async_trait::async_trait;
use rephrase::core::InferenceBackend;
use rephrase::error::{ServiceError, ServiceResult};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Unavailable,
    ModelMissing,
    Empty,
    /// Answers "ok" after the given delay
    Slow(Duration),
}

#[derive(Debug)]
pub struct MockInference {
    pub reply: Mutex<MockReply>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockInference {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(MockReply::Text(text.to_string()))
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceBackend for MockInference {
    async fn generate(&self, instructions: &str, input: &str) -> ServiceResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((instructions.to_string(), input.to_string()));

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok("ok".to_string())
            }
            MockReply::Unavailable => Err(ServiceError::InferenceUnavailable(
                "connection refused".to_string(),
            )),
            MockReply::ModelMissing => {
                Err(ServiceError::ModelUnavailable("mock-model".to_string()))
            }
            MockReply::Empty => Err(ServiceError::InferenceEmptyResult(
                "model returned an empty response".to_string(),
            )),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
