//! Mock System Bridge for Testing
//!
//! Keeps an in-memory selection and clipboard and records every call.

use async_trait::async_trait;
use rephrase::bridge::SystemBridge;
use rephrase::error::{ServiceError, ServiceResult};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    ReadSelection,
    ReadClipboard,
    WriteClipboard(String),
    Paste,
    Notify(String, String),
}

#[derive(Debug, Default)]
pub struct MockBridge {
    pub selection: Mutex<String>,
    pub clipboard: Mutex<String>,
    pub calls: Mutex<Vec<BridgeCall>>,
    /// Simulate a missing paste utility
    pub fail_paste: Mutex<bool>,
}

impl MockBridge {
    pub fn with_selection(text: &str) -> Self {
        let bridge = Self::default();
        *bridge.selection.lock().unwrap() = text.to_string();
        bridge
    }

    pub fn with_clipboard(self, text: &str) -> Self {
        *self.clipboard.lock().unwrap() = text.to_string();
        self
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change something outside the process
    pub fn mutations(&self) -> Vec<BridgeCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, BridgeCall::ReadSelection | BridgeCall::ReadClipboard))
            .collect()
    }

    pub fn clipboard(&self) -> String {
        self.clipboard.lock().unwrap().clone()
    }

    fn record(&self, call: BridgeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SystemBridge for MockBridge {
    async fn read_selection(&self) -> ServiceResult<String> {
        self.record(BridgeCall::ReadSelection);
        Ok(self.selection.lock().unwrap().clone())
    }

    async fn read_clipboard(&self) -> ServiceResult<String> {
        self.record(BridgeCall::ReadClipboard);
        Ok(self.clipboard())
    }

    async fn write_clipboard(&self, text: &str) -> ServiceResult<()> {
        self.record(BridgeCall::WriteClipboard(text.to_string()));
        *self.clipboard.lock().unwrap() = text.to_string();
        Ok(())
    }

    async fn paste_into_focused_window(&self) -> ServiceResult<()> {
        if *self.fail_paste.lock().unwrap() {
            return Err(ServiceError::EnvironmentUnavailable(
                "'xdotool' is not installed".to_string(),
            ));
        }
        self.record(BridgeCall::Paste);
        Ok(())
    }

    async fn notify(&self, summary: &str, body: &str) -> ServiceResult<()> {
        self.record(BridgeCall::Notify(summary.to_string(), body.to_string()));
        Ok(())
    }
}
