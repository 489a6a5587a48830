//! Subprocess-backed checks.
//!
//! The event is written to the child's stdin as JSON. The child answers
//! through its exit code and stdout:
//!
//! | exit | stdout                  | verdict                                |
//! |------|-------------------------|----------------------------------------|
//! | 0    | empty                   | allow                                  |
//! | 0    | JSON object             | parsed as a `Verdict`                  |
//! | 0    | other text              | allow, text passed through as context  |
//! | 2    | any                     | block, stderr (or stdout) as reason    |
//! | else | any                     | error: the check is unavailable        |
//!
//! The child is killed if the evaluation future is dropped, which is how the
//! hook adapter cancels it at the timeout boundary.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use hookgate_contracts::{
    error::{GateError, GateResult},
    event::Event,
    verdict::Verdict,
};

use crate::traits::PolicyCheck;

/// Exit code a command uses to block the action.
pub const BLOCK_EXIT_CODE: i32 = 2;

/// A policy check that runs an external executable.
#[derive(Debug, Clone)]
pub struct CommandCheck {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl CommandCheck {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn unavailable(&self, reason: impl Into<String>) -> GateError {
        GateError::CheckUnavailable {
            hook: self.program.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Map the child's exit status and output to a verdict.
    fn interpret(&self, code: Option<i32>, stdout: &str, stderr: &str) -> GateResult<Verdict> {
        match code {
            Some(0) => {
                if stdout.is_empty() {
                    return Ok(Verdict::allow());
                }
                if stdout.starts_with('{') {
                    // A JSON body that is not a verdict is malformed, not context.
                    let mut verdict: Verdict = serde_json::from_str(stdout)
                        .map_err(|e| self.unavailable(format!("malformed verdict: {e}")))?;
                    verdict.degraded = false;
                    return Ok(verdict);
                }
                Ok(Verdict::allow_with_context(stdout))
            }
            Some(BLOCK_EXIT_CODE) => {
                let reason = if !stderr.is_empty() {
                    stderr.to_string()
                } else if !stdout.is_empty() {
                    stdout.to_string()
                } else {
                    format!("blocked by '{}'", self.program.display())
                };
                Ok(Verdict::block(reason))
            }
            Some(other) => Err(self.unavailable(format!(
                "exited with status {other}{}",
                if stderr.is_empty() {
                    String::new()
                } else {
                    format!(": {stderr}")
                }
            ))),
            None => Err(self.unavailable("terminated by signal")),
        }
    }
}

#[async_trait]
impl PolicyCheck for CommandCheck {
    async fn evaluate(&self, event: &Event) -> GateResult<Verdict> {
        let input = serde_json::to_vec(event)
            .map_err(|e| self.unavailable(format!("failed to serialize event: {e}")))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env("HOOKGATE_PHASE", event.phase().as_str())
            .env("HOOKGATE_TOOL", event.tool())
            .env("HOOKGATE_SESSION_ID", event.session_id().as_str());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| self.unavailable(format!("failed to spawn: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A check that exits without reading stdin closes the pipe; that
            // is not a failure of the check.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(program = %self.program.display(), error = %e, "check did not read stdin");
            }
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.unavailable(format!("process error: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            program = %self.program.display(),
            status = ?output.status.code(),
            "command check finished"
        );

        self.interpret(output.status.code(), stdout.trim(), stderr.trim())
    }
}
