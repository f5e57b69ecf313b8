//! System Bridge
//!
//! Access to the OS text selection, the clipboard, synthetic paste and
//! desktop notifications.

pub mod command;

use crate::config::{Config, DisplayServerChoice};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use command::{CommandBridge, ToolCommand, ToolSet};

/// Trait for selection/clipboard/keystroke backends
#[async_trait]
pub trait SystemBridge: Send + Sync {
    /// Currently selected text; empty when nothing is selected
    async fn read_selection(&self) -> ServiceResult<String>;

    /// Clipboard contents; empty when the clipboard holds no text
    async fn read_clipboard(&self) -> ServiceResult<String>;

    /// Replace the clipboard contents
    async fn write_clipboard(&self, text: &str) -> ServiceResult<()>;

    /// Send a paste keystroke to whichever window has focus.
    ///
    /// Nothing confirms the paste landed where the user expects.
    async fn paste_into_focused_window(&self) -> ServiceResult<()>;

    /// Show a desktop notification
    async fn notify(&self, summary: &str, body: &str) -> ServiceResult<()>;
}

/// Display server the bridge utilities target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    X11,
    Wayland,
}

impl DisplayServer {
    /// Detect from the session environment, preferring Wayland
    pub fn detect() -> ServiceResult<Self> {
        Self::detect_with(|name| std::env::var(name).ok())
    }

    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> ServiceResult<Self> {
        let is_set = |name: &str| lookup(name).is_some_and(|v| !v.is_empty());

        if is_set("WAYLAND_DISPLAY") {
            Ok(DisplayServer::Wayland)
        } else if is_set("DISPLAY") {
            Ok(DisplayServer::X11)
        } else {
            Err(ServiceError::EnvironmentUnavailable(
                "no display server found (neither WAYLAND_DISPLAY nor DISPLAY is set)".to_string(),
            ))
        }
    }

    fn resolve(choice: DisplayServerChoice) -> ServiceResult<Self> {
        match choice {
            DisplayServerChoice::Auto => Self::detect(),
            DisplayServerChoice::X11 => Ok(DisplayServer::X11),
            DisplayServerChoice::Wayland => Ok(DisplayServer::Wayland),
        }
    }
}

/// Factory to create the configured bridge
pub fn create_bridge(config: &Config) -> ServiceResult<Arc<dyn SystemBridge>> {
    let server = DisplayServer::resolve(config.display_server)?;
    info!("🖥️ System bridge: {:?}", server);
    let bridge = CommandBridge::new(ToolSet::for_display(server))
        .with_paste_delay(Duration::from_millis(config.paste_delay_ms));
    Ok(Arc::new(bridge))
}
