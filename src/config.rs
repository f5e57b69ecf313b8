//! Process-wide configuration
//!
//! Read once at startup: JSON file, then environment, then CLI flags.
//! Immutable once the listener is running.

use crate::error::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which concrete service this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Grammar/style rewrite of the current selection
    Rephrase,
    /// Summarise the clipboard into the log
    Summary,
}

impl std::str::FromStr for ServiceKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rephrase" => Ok(ServiceKind::Rephrase),
            "summary" => Ok(ServiceKind::Summary),
            other => Err(ServiceError::Config(format!("unknown service '{other}'"))),
        }
    }
}

/// Modifier keys that must be held together with the shortcut digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Super => "Super",
        };
        f.write_str(name)
    }
}

/// Display server selection for the system bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayServerChoice {
    #[default]
    Auto,
    X11,
    Wayland,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceKind,

    // Inference
    pub ollama_url: String,
    pub ollama_model: String,

    // Shortcut
    pub shortcut_key: u8,
    pub modifiers: Vec<Modifier>,
    pub quit_on_escape: bool,

    // Bridge
    pub display_server: DisplayServerChoice,
    pub restore_clipboard: bool,
    pub paste_delay_ms: u64,

    // Meta
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceKind::Rephrase,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "gemma3".to_string(),
            shortcut_key: 0,
            modifiers: vec![Modifier::Ctrl, Modifier::Alt],
            quit_on_escape: true,
            display_server: DisplayServerChoice::Auto,
            restore_clipboard: true,
            paste_delay_ms: 200,
            debug: false,
        }
    }
}

impl Config {
    /// Load config from a file, falling back to defaults when missing or corrupt
    pub fn load_from(path: &Path) -> ServiceResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> ServiceResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `OLLAMA_MODEL`, `OLLAMA_URL`, `REPHRASE_KEYNUM`, `REPHRASE_SERVICE` and `DEBUG`
    pub fn apply_env(&mut self) -> ServiceResult<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::apply_env`] with an injectable lookup.
    ///
    /// Unparseable values are stored as-is where possible so that
    /// [`Config::validate`] reports them; an unparseable key number becomes
    /// an out-of-range digit for the same reason. An unknown service name
    /// is rejected here.
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ServiceResult<()> {
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama_model = model;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Some(keynum) = lookup("REPHRASE_KEYNUM") {
            self.shortcut_key = keynum.trim().parse().unwrap_or(u8::MAX);
        }
        if let Some(service) = lookup("REPHRASE_SERVICE") {
            self.service = service.parse()?;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = is_truthy(&debug);
        }
        Ok(())
    }

    /// Reject settings the listener or client cannot work with
    pub fn validate(&self) -> ServiceResult<()> {
        if self.shortcut_key > 9 {
            return Err(ServiceError::Config(format!(
                "shortcut key must be a digit 0-9, got {}",
                self.shortcut_key
            )));
        }
        if self.ollama_model.trim().is_empty() {
            return Err(ServiceError::Config("model name is empty".to_string()));
        }
        if !(self.ollama_url.starts_with("http://") || self.ollama_url.starts_with("https://")) {
            return Err(ServiceError::Config(format!(
                "endpoint URL must start with http:// or https://, got '{}'",
                self.ollama_url
            )));
        }
        if self.modifiers.is_empty() {
            return Err(ServiceError::Config(
                "at least one shortcut modifier is required".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    !(value.is_empty() || value == "0" || value == "false" || value == "no")
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rephrase")
        .join("config.json")
}
