//! Clipboard summariser
//!
//! Works without a selection: summarises whatever text is on the clipboard
//! and writes the summary to the log.

use super::{OutputAction, Service, ServiceContext, TriggerOutcome};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use tracing::info;

const INSTRUCTIONS: &str = "Please provide a concise summary of the following text. \
Keep it brief and capture the main points. Return only the summary without any explanations.";

#[derive(Debug, Clone)]
pub struct SummaryService {
    trigger_key: u8,
}

impl SummaryService {
    pub fn new(trigger_key: u8) -> Self {
        Self { trigger_key }
    }
}

#[async_trait]
impl Service for SummaryService {
    fn name(&self) -> &str {
        "Summary"
    }

    fn trigger_key(&self) -> u8 {
        self.trigger_key
    }

    fn build_instructions(&self) -> String {
        INSTRUCTIONS.to_string()
    }

    async fn handle_trigger(&self, ctx: &ServiceContext<'_>) -> ServiceResult<TriggerOutcome> {
        info!("📖 Getting text from clipboard...");
        let text = ctx.bridge.read_clipboard().await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::EmptyInput);
        }

        let event = ctx
            .infer(self.build_instructions(), text.to_string(), OutputAction::Log)
            .await?;
        ctx.apply(&event).await?;
        Ok(TriggerOutcome::Applied(event))
    }
}
