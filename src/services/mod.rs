//! Service template
//!
//! A service turns one shortcut press into: fetch input → ask the model →
//! apply the result. Concrete services supply the instructions and the
//! input/output choice; everything else is shared here.

pub mod rephrase;
pub mod summary;

use crate::bridge::SystemBridge;
use crate::config::{Config, ServiceKind};
use crate::core::InferenceBackend;
use crate::error::{ServiceError, ServiceResult};
use crate::hotkey::ListenerSignal;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub use rephrase::RephraseService;
pub use summary::SummaryService;

/// Where a model response goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    /// Clipboard + paste over the current selection
    ReplaceSelection,
    /// Write to the log only
    Log,
    /// Leave on the clipboard
    ClipboardCopy,
    /// Desktop notification
    Notify,
}

/// One shortcut activation, from captured input to model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub input: String,
    pub instructions: String,
    pub response: String,
    pub action: OutputAction,
}

/// How a handled trigger ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The response was applied with the event's output action
    Applied(TriggerEvent),
    /// The model reported nothing to change; no output was applied
    Unchanged,
}

/// Trait for shortcut-driven services
#[async_trait]
pub trait Service: Send + Sync {
    /// Human-readable service name
    fn name(&self) -> &str;

    /// Digit of the shortcut this service listens on
    fn trigger_key(&self) -> u8;

    /// Fixed system instructions sent with every request
    fn build_instructions(&self) -> String;

    /// Run the pipeline for one press
    async fn handle_trigger(&self, ctx: &ServiceContext<'_>) -> ServiceResult<TriggerOutcome>;
}

/// Infrastructure handed to [`Service::handle_trigger`]
pub struct ServiceContext<'a> {
    pub inference: &'a dyn InferenceBackend,
    pub bridge: &'a dyn SystemBridge,
    pub service_name: &'a str,
    pub restore_clipboard: bool,
}

impl<'a> ServiceContext<'a> {
    /// Ask the model and package the exchange as a [`TriggerEvent`]
    pub async fn infer(
        &self,
        instructions: String,
        input: String,
        action: OutputAction,
    ) -> ServiceResult<TriggerEvent> {
        let response = self.inference.generate(&instructions, &input).await?;
        Ok(TriggerEvent {
            input,
            instructions,
            response,
            action,
        })
    }

    /// Apply the event's response with its output action
    pub async fn apply(&self, event: &TriggerEvent) -> ServiceResult<()> {
        match event.action {
            OutputAction::ReplaceSelection => self.replace_selection(&event.response).await,
            OutputAction::Log => {
                info!("{}", "=".repeat(60));
                info!("📄 {} RESULT:", self.service_name.to_uppercase());
                info!("'{}'", event.response);
                info!("{}", "=".repeat(60));
                Ok(())
            }
            OutputAction::ClipboardCopy => {
                self.bridge.write_clipboard(&event.response).await?;
                info!("📋 Result copied to clipboard");
                Ok(())
            }
            OutputAction::Notify => self.bridge.notify(self.service_name, &event.response).await,
        }
    }

    async fn replace_selection(&self, text: &str) -> ServiceResult<()> {
        info!("🔄 Replacing selected text...");

        // Taken even when restoring is off: a failed paste must leave the clipboard as it was
        let previous = match self.bridge.read_clipboard().await {
            Ok(saved) => Some(saved),
            Err(e) => {
                debug!("Could not save current clipboard: {}", e);
                None
            }
        };

        self.bridge.write_clipboard(text).await?;

        // The clipboard write is checked; the paste itself cannot be
        match self.bridge.read_clipboard().await {
            Ok(current) if current == text => debug!("✓ Clipboard holds the new text"),
            Ok(_) => warn!("⚠️ Clipboard content differs from the text just written"),
            Err(e) => warn!("⚠️ Could not verify clipboard content: {}", e),
        }

        if let Err(e) = self.bridge.paste_into_focused_window().await {
            if let Some(saved) = &previous {
                self.restore(saved).await;
            }
            return Err(e);
        }

        if let Some(saved) = previous.filter(|s| self.restore_clipboard && !s.is_empty()) {
            self.restore(&saved).await;
        }

        info!("✅ Text replacement completed");
        Ok(())
    }

    async fn restore(&self, saved: &str) {
        match self.bridge.write_clipboard(saved).await {
            Ok(()) => debug!("✓ Original clipboard restored"),
            Err(e) => debug!("Could not restore original clipboard: {}", e),
        }
    }
}

/// Factory to create the configured service
pub fn create_service(config: &Config) -> Box<dyn Service> {
    match config.service {
        ServiceKind::Rephrase => Box::new(RephraseService::new(config.shortcut_key)),
        ServiceKind::Summary => Box::new(SummaryService::new(config.shortcut_key)),
    }
}

/// Drives one service from listener signals
pub struct ServiceRunner {
    service: Box<dyn Service>,
    inference: Arc<dyn InferenceBackend>,
    bridge: Arc<dyn SystemBridge>,
    restore_clipboard: bool,
}

impl ServiceRunner {
    pub fn new(
        service: Box<dyn Service>,
        inference: Arc<dyn InferenceBackend>,
        bridge: Arc<dyn SystemBridge>,
    ) -> Self {
        Self {
            service,
            inference,
            bridge,
            restore_clipboard: true,
        }
    }

    pub fn with_restore_clipboard(mut self, restore: bool) -> Self {
        self.restore_clipboard = restore;
        self
    }

    /// Handle one press. Every failure stops here and is logged.
    pub async fn dispatch(&self) -> Option<TriggerOutcome> {
        let name = self.service.name();
        info!("🚀 {} shortcut detected, processing...", name);

        let ctx = ServiceContext {
            inference: self.inference.as_ref(),
            bridge: self.bridge.as_ref(),
            service_name: name,
            restore_clipboard: self.restore_clipboard,
        };

        match self.service.handle_trigger(&ctx).await {
            Ok(outcome) => {
                if let TriggerOutcome::Applied(_) = outcome {
                    info!("✅ {} completed successfully", name);
                }
                Some(outcome)
            }
            Err(e) if e.is_no_op() => {
                info!("❌ {}: no text available, ignoring", name);
                None
            }
            Err(e) => {
                error!("❌ Error in {} processing: {}", name, e);
                None
            }
        }
    }

    /// Process listener signals until quit, Ctrl+C or SIGTERM.
    ///
    /// Triggers run one at a time. Presses that arrive while one is in
    /// flight are dropped once it finishes.
    pub async fn run(&self, signals: mpsc::UnboundedReceiver<ListenerSignal>) -> ServiceResult<()> {
        self.run_until(signals, shutdown_signal()).await
    }

    /// [`ServiceRunner::run`] with a custom shutdown future.
    ///
    /// Shutdown also interrupts a trigger that is still in flight.
    pub async fn run_until(
        &self,
        mut signals: mpsc::UnboundedReceiver<ListenerSignal>,
        shutdown: impl std::future::Future<Output = ()>,
    ) -> ServiceResult<()> {
        tokio::pin!(shutdown);

        // First poll installs the signal handlers before any press is handled
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Received termination signal");
                return Ok(());
            }
            _ = std::future::ready(()) => {}
        }

        loop {
            let signal = tokio::select! {
                signal = signals.recv() => signal,
                _ = &mut shutdown => {
                    info!("Received termination signal");
                    return Ok(());
                }
            };

            match signal {
                Some(ListenerSignal::Trigger) => {
                    tokio::select! {
                        _ = self.dispatch() => {}
                        _ = &mut shutdown => {
                            warn!("Received termination signal, abandoning trigger in flight");
                            return Ok(());
                        }
                    }
                    if drain_while_busy(&mut signals) {
                        info!("👋 Quit key pressed, shutting down");
                        return Ok(());
                    }
                }
                Some(ListenerSignal::Quit) => {
                    info!("👋 Quit key pressed, shutting down");
                    return Ok(());
                }
                None => {
                    return Err(ServiceError::EnvironmentUnavailable(
                        "keyboard listener stopped".to_string(),
                    ))
                }
            }
        }
    }
}

/// Discard presses queued during a trigger; returns true if a quit was queued
fn drain_while_busy(signals: &mut mpsc::UnboundedReceiver<ListenerSignal>) -> bool {
    let mut dropped = 0;
    while let Ok(signal) = signals.try_recv() {
        match signal {
            ListenerSignal::Trigger => dropped += 1,
            ListenerSignal::Quit => return true,
        }
    }
    if dropped > 0 {
        info!("Ignored {} shortcut press(es) received while busy", dropped);
    }
    false
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_service_follows_config() {
        let mut config = Config::default();
        config.shortcut_key = 4;
        let service = create_service(&config);
        assert_eq!(service.name(), "Rephrase");
        assert_eq!(service.trigger_key(), 4);

        config.service = ServiceKind::Summary;
        assert_eq!(create_service(&config).name(), "Summary");
    }

    #[test]
    fn test_drain_while_busy() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(ListenerSignal::Trigger).unwrap();
        tx.send(ListenerSignal::Trigger).unwrap();
        assert!(!drain_while_busy(&mut rx));
        assert!(rx.try_recv().is_err());

        tx.send(ListenerSignal::Trigger).unwrap();
        tx.send(ListenerSignal::Quit).unwrap();
        assert!(drain_while_busy(&mut rx));
    }
}
