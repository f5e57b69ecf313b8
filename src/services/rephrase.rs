//! Grammar and style rewrite of the current selection

use super::{OutputAction, Service, ServiceContext, TriggerOutcome};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use tracing::info;

const INSTRUCTIONS: &str = "Please correct any grammatical errors and make improvements to the writing \
while keeping the original tone and meaning. If you cannot rephrase it, or change is not needed, \
return <null>. Return only the improved text without any explanations or additional commentary.";

/// Reply meaning "nothing to change"
const NO_CHANGE_MARKER: &str = "<null>";

/// Rewrites the selected text in place
#[derive(Debug, Clone)]
pub struct RephraseService {
    trigger_key: u8,
}

impl RephraseService {
    pub fn new(trigger_key: u8) -> Self {
        Self { trigger_key }
    }

    fn model_input(selection: &str) -> String {
        format!("Text to rephrase:\n{selection}")
    }
}

#[async_trait]
impl Service for RephraseService {
    fn name(&self) -> &str {
        "Rephrase"
    }

    fn trigger_key(&self) -> u8 {
        self.trigger_key
    }

    fn build_instructions(&self) -> String {
        INSTRUCTIONS.to_string()
    }

    async fn handle_trigger(&self, ctx: &ServiceContext<'_>) -> ServiceResult<TriggerOutcome> {
        let selection = ctx.bridge.read_selection().await?;
        let selection = selection.trim();
        if selection.is_empty() {
            return Err(ServiceError::EmptyInput);
        }

        info!("📝 ORIGINAL TEXT: '{}'", selection);

        let event = ctx
            .infer(
                self.build_instructions(),
                Self::model_input(selection),
                OutputAction::ReplaceSelection,
            )
            .await?;

        if event.response.trim() == NO_CHANGE_MARKER {
            info!("ℹ️ No changes needed - text is already well-written or could not be rephrased");
            return Ok(TriggerOutcome::Unchanged);
        }

        info!("✨ REPHRASED TEXT: '{}'", event.response);

        ctx.apply(&event).await?;
        Ok(TriggerOutcome::Applied(event))
    }
}
