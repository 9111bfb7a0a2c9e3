//! osascript bridge: sends AppleScript to the running Music app and
//! returns its textual result.
//!
//! One call at a time — the target application serializes automation
//! requests, so callers await each invocation before issuing the next.
//! There are no retries and no timeout here; a hung call is the transport's
//! problem.

use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to launch osascript: {0}")]
    Launch(#[from] std::io::Error),
    #[error("script failed (exit {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("script output was not valid UTF-8")]
    Utf8,
}

/// The one capability this crate needs from the OS: evaluate a script,
/// hand back its stdout. Trait seam so tests can substitute a scripted
/// fake for the real osascript process.
pub trait Bridge: Send + Sync {
    fn run(
        &self,
        script: &str,
    ) -> impl std::future::Future<Output = Result<String, ScriptError>> + Send;
}

/// Real bridge: `osascript -e <script>`.
#[derive(Debug, Default, Clone)]
pub struct Osascript;

impl Bridge for Osascript {
    async fn run(&self, script: &str) -> Result<String, ScriptError> {
        debug!("osascript:\n{}", script);
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("osascript exited {:?}: {}", output.status.code(), stderr);
            return Err(ScriptError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| ScriptError::Utf8)?;
        // osascript appends a trailing newline to the result.
        Ok(stdout.trim_end_matches('\n').to_string())
    }
}

/// Escape a string for interpolation inside AppleScript double quotes
/// (`whose name is "…"` filters on user-controlled metadata).
pub fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
