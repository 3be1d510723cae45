//! Clipboard backends for the copy affordance.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard command available on this platform")]
    Unavailable,
    #[error("clipboard command `{command}` failed: {detail}")]
    Command { command: String, detail: String },
}

/// Somewhere copied text can be written.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Process-local clipboard. Used by tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().map(|c| c.clone()).unwrap_or(None)
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self.contents.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(text.to_string());
        Ok(())
    }
}

/// The desktop clipboard, reached through the platform's copy command.
#[derive(Debug, Default)]
pub struct SystemClipboard;

struct CopyCommand {
    program: &'static str,
    args: &'static [&'static str],
}

#[cfg(target_os = "macos")]
const COPY_COMMANDS: &[CopyCommand] = &[CopyCommand { program: "pbcopy", args: &[] }];

#[cfg(target_os = "windows")]
const COPY_COMMANDS: &[CopyCommand] = &[CopyCommand { program: "clip", args: &[] }];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const COPY_COMMANDS: &[CopyCommand] = &[
    CopyCommand { program: "wl-copy", args: &[] },
    CopyCommand { program: "xclip", args: &["-selection", "clipboard"] },
    CopyCommand { program: "xsel", args: &["--clipboard", "--input"] },
];

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        for CopyCommand { program, args } in COPY_COMMANDS {
            let child = Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            let mut child = match child {
                Ok(child) => child,
                // Not installed; try the next one.
                Err(_) => continue,
            };
            let fail = |detail: String| ClipboardError::Command {
                command: program.to_string(),
                detail,
            };
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).map_err(|e| fail(e.to_string()))?;
            }
            let status = child.wait().map_err(|e| fail(e.to_string()))?;
            if status.success() {
                return Ok(());
            }
            return Err(fail(format!("exited with {status}")));
        }
        Err(ClipboardError::Unavailable)
    }
}
