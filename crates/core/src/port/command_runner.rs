// Command Runner Port
// Abstraction for running shell commands on the test host

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// How a command should be run and what happens to its output
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Keep stdout/stderr in memory and return them
    pub capture: bool,
    /// Fail with `ExecutionError::NonZeroExit` when the exit code is not 0
    pub check: bool,
    /// Relay stdout lines to the log at INFO
    pub log_stdout: bool,
    /// Relay stderr lines to the log at WARN
    pub log_stderr: bool,
    /// Replaces the whole child environment when set
    pub env: Option<HashMap<String, String>>,
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            capture: false,
            check: true,
            log_stdout: true,
            log_stderr: true,
            env: None,
            working_dir: None,
        }
    }
}

impl ExecuteOptions {
    /// Capturing options with checking enabled, the usual choice for polling
    pub fn captured() -> Self {
        Self::default().capture(true)
    }

    pub fn capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn log_stdout(mut self, log_stdout: bool) -> Self {
        self.log_stdout = log_stdout;
        self
    }

    pub fn log_stderr(mut self, log_stderr: bool) -> Self {
        self.log_stderr = log_stderr;
        self
    }

    pub fn env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Result of a finished command
///
/// `stdout`/`stderr` are `Some` only when the command ran with `capture`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, or the negated signal number if the child was killed
    pub code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    /// Output fields are only populated when the command was captured
    #[error("Command `{command}` returned non-zero exit status {code}")]
    NonZeroExit {
        command: String,
        code: i32,
        stdout: Option<String>,
        stderr: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(String),
}

/// Command Runner trait
///
/// Implementations:
/// - SubprocessExecutor: runs the command through `sh -c`
/// - MockCommandRunner: scripted outputs for tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` through the shell
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the shell cannot be started
    /// - ExecutionError::NonZeroExit if `opts.check` is set and the command fails
    /// - ExecutionError::Io if reading output or waiting fails
    async fn execute(
        &self,
        command: &str,
        opts: &ExecuteOptions,
    ) -> Result<CommandOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock runner that replays a script of stdout values
    ///
    /// Each call pops the next entry; once the script is exhausted the last
    /// entry repeats. Every command is recorded.
    pub struct MockCommandRunner {
        script: Arc<Mutex<VecDeque<CommandOutput>>>,
        last: Arc<Mutex<Option<CommandOutput>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockCommandRunner {
        pub fn new(outputs: Vec<CommandOutput>) -> Self {
            Self {
                script: Arc::new(Mutex::new(outputs.into())),
                last: Arc::new(Mutex::new(None)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Script of successful commands printing the given stdout values
        pub fn with_stdout<I, S>(stdouts: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self::new(
                stdouts
                    .into_iter()
                    .map(|s| CommandOutput {
                        code: 0,
                        stdout: Some(s.into()),
                        stderr: Some(String::new()),
                    })
                    .collect(),
            )
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn execute(
            &self,
            command: &str,
            opts: &ExecuteOptions,
        ) -> Result<CommandOutput, ExecutionError> {
            self.calls.lock().unwrap().push(command.to_string());

            let next = self.script.lock().unwrap().pop_front();
            let output = match next {
                Some(output) => {
                    *self.last.lock().unwrap() = Some(output.clone());
                    output
                }
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| ExecutionError::SpawnFailed("empty mock script".into()))?,
            };

            if opts.check && output.code != 0 {
                return Err(ExecutionError::NonZeroExit {
                    command: command.to_string(),
                    code: output.code,
                    stdout: output.stdout.clone(),
                    stderr: output.stderr.clone(),
                });
            }
            Ok(output)
        }
    }
}
