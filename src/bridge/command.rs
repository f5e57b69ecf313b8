//! Bridge backed by command-line utilities
//!
//! xclip/xdotool on X11, wl-clipboard/wtype on Wayland, notify-send for
//! notifications.

use super::{DisplayServer, SystemBridge};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// One external utility invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        cmd
    }
}

/// The utilities used for each bridge operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub selection: ToolCommand,
    pub clipboard_read: ToolCommand,
    /// Receives the new clipboard text on stdin
    pub clipboard_write: ToolCommand,
    pub paste: ToolCommand,
    /// Summary and body are appended as the last two arguments
    pub notify: ToolCommand,
}

impl ToolSet {
    pub fn x11() -> Self {
        Self {
            selection: ToolCommand::new("xclip", &["-selection", "primary", "-o"]),
            clipboard_read: ToolCommand::new("xclip", &["-selection", "clipboard", "-o"]),
            clipboard_write: ToolCommand::new("xclip", &["-selection", "clipboard"]),
            paste: ToolCommand::new("xdotool", &["key", "--clearmodifiers", "ctrl+v"]),
            notify: ToolCommand::new("notify-send", &[]),
        }
    }

    pub fn wayland() -> Self {
        Self {
            selection: ToolCommand::new("wl-paste", &["--primary", "--no-newline"]),
            clipboard_read: ToolCommand::new("wl-paste", &["--no-newline"]),
            clipboard_write: ToolCommand::new("wl-copy", &[]),
            paste: ToolCommand::new("wtype", &["-M", "ctrl", "v", "-m", "ctrl"]),
            notify: ToolCommand::new("notify-send", &[]),
        }
    }

    pub fn for_display(display: DisplayServer) -> Self {
        match display {
            DisplayServer::X11 => Self::x11(),
            DisplayServer::Wayland => Self::wayland(),
        }
    }
}

/// Shells out to the configured [`ToolSet`]
#[derive(Debug, Clone)]
pub struct CommandBridge {
    tools: ToolSet,
    paste_delay: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl CommandBridge {
    pub fn new(tools: ToolSet) -> Self {
        Self {
            tools,
            paste_delay: Duration::ZERO,
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        }
    }

    /// Pause before and after the paste keystroke
    pub fn with_paste_delay(mut self, delay: Duration) -> Self {
        self.paste_delay = delay;
        self
    }

    pub fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    /// Run a read utility; a non-zero exit means "nothing there"
    async fn capture(&self, tool: &ToolCommand) -> ServiceResult<String> {
        let mut cmd = tool.command();
        cmd.stdin(Stdio::null());

        let output = self.finish(tool, self.read_timeout, cmd.output()).await?;
        if !output.status.success() {
            debug!(
                "{} exited with {}: {}",
                tool.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run an action utility; a non-zero exit is a failure
    async fn execute(&self, tool: &ToolCommand, extra_args: &[&str]) -> ServiceResult<()> {
        let mut cmd = tool.command();
        cmd.args(extra_args).stdin(Stdio::null());

        let output = self.finish(tool, self.write_timeout, cmd.output()).await?;
        check_status(tool, &output)
    }

    async fn finish(
        &self,
        tool: &ToolCommand,
        limit: Duration,
        fut: impl std::future::Future<Output = std::io::Result<Output>>,
    ) -> ServiceResult<Output> {
        match tokio::time::timeout(limit, fut).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(spawn_error(tool, e)),
            Err(_) => Err(ServiceError::EnvironmentUnavailable(format!(
                "{} timed out after {:?}",
                tool.program, limit
            ))),
        }
    }
}

#[async_trait]
impl SystemBridge for CommandBridge {
    async fn read_selection(&self) -> ServiceResult<String> {
        info!("📖 Reading selected text...");
        self.capture(&self.tools.selection).await
    }

    async fn read_clipboard(&self) -> ServiceResult<String> {
        debug!("Reading clipboard");
        self.capture(&self.tools.clipboard_read).await
    }

    async fn write_clipboard(&self, text: &str) -> ServiceResult<()> {
        let tool = &self.tools.clipboard_write;
        debug!("📋 Writing {} characters to clipboard", text.chars().count());

        // Clipboard owners (xclip, wl-copy) fork and keep running; they must not hold our pipes
        let mut child = tool
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(tool, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| pipe_error(tool, e))?;
            stdin.shutdown().await.map_err(|e| pipe_error(tool, e))?;
        }

        let status = match tokio::time::timeout(self.write_timeout, child.wait()).await {
            Ok(status) => status.map_err(|e| spawn_error(tool, e))?,
            Err(_) => {
                return Err(ServiceError::EnvironmentUnavailable(format!(
                    "{} timed out after {:?}",
                    tool.program, self.write_timeout
                )))
            }
        };

        if !status.success() {
            return Err(ServiceError::EnvironmentUnavailable(format!(
                "{} exited with {}",
                tool.program, status
            )));
        }
        Ok(())
    }

    async fn paste_into_focused_window(&self) -> ServiceResult<()> {
        info!("⌨️ Simulating paste keystroke...");
        tokio::time::sleep(self.paste_delay).await;
        self.execute(&self.tools.paste, &[]).await?;
        // Let the focused application consume the clipboard before anyone rewrites it
        tokio::time::sleep(self.paste_delay).await;
        Ok(())
    }

    async fn notify(&self, summary: &str, body: &str) -> ServiceResult<()> {
        self.execute(&self.tools.notify, &[summary, body]).await
    }
}

fn spawn_error(tool: &ToolCommand, err: std::io::Error) -> ServiceError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ServiceError::EnvironmentUnavailable(format!("'{}' is not installed", tool.program))
    } else {
        ServiceError::EnvironmentUnavailable(format!("failed to run {}: {}", tool.program, err))
    }
}

fn pipe_error(tool: &ToolCommand, err: std::io::Error) -> ServiceError {
    ServiceError::EnvironmentUnavailable(format!(
        "failed to send text to {}: {}",
        tool.program, err
    ))
}

fn check_status(tool: &ToolCommand, output: &Output) -> ServiceResult<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(ServiceError::EnvironmentUnavailable(format!(
        "{} exited with {}: {}",
        tool.program,
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
    )))
}
