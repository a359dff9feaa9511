// Subprocess executor: runs shell commands, relaying and capturing output
// reason: tokio::process so both pipes drain concurrently without threads
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use clustertest_core::port::command_runner::{
    CommandOutput, CommandRunner, ExecuteOptions, ExecutionError,
};

/// Shell used to interpret command strings
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Which child pipe a reader is draining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    /// stdout is informational; stderr is a warning and the caller decides
    /// whether the exit code makes it an error
    fn log(self, command: &str, line: &str) {
        match self {
            Stream::Stdout => info!(command = %command, "{}", line),
            Stream::Stderr => warn!(command = %command, "{}", line),
        }
    }
}

/// Subprocess executor
/// Spawns `sh -c <command>` and streams its output to the log
pub struct SubprocessExecutor {
    shell: String,
}

impl SubprocessExecutor {
    /// Create an executor using `/bin/sh`
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new();
    /// let out = executor.run("uname -a", &ExecuteOptions::captured()).await?;
    /// ```
    pub fn new() -> Self {
        Self::with_shell(DEFAULT_SHELL)
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run `command` and wait for it to exit
    ///
    /// A pipe is opened for a stream when it is logged or captured; otherwise
    /// the stream goes to the null device. Both pipes are drained at the same
    /// time, so a chatty stderr cannot block stdout.
    pub async fn run(
        &self,
        command: &str,
        opts: &ExecuteOptions,
    ) -> Result<CommandOutput, ExecutionError> {
        debug!(
            command = %command,
            capture = opts.capture,
            check = opts.check,
            "Starting subprocess execution"
        );

        let mut child = self
            .command(command, opts)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{command}: {e}")))?;

        let (stdout, stderr) = tokio::try_join!(
            drain(
                child.stdout.take(),
                Stream::Stdout,
                command,
                opts.log_stdout,
                opts.capture
            ),
            drain(
                child.stderr.take(),
                Stream::Stderr,
                command,
                opts.log_stderr,
                opts.capture
            ),
        )?;

        let status = child
            .wait()
            .await
            .map_err(|e| ExecutionError::Io(e.to_string()))?;
        let code = exit_code(status);

        debug!(command = %command, code = code, "Command finished");

        if opts.check && code != 0 {
            return Err(ExecutionError::NonZeroExit {
                command: command.to_string(),
                code,
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput {
            code,
            stdout,
            stderr,
        })
    }

    fn command(&self, command: &str, opts: &ExecuteOptions) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdout(pipe_for(opts.log_stdout || opts.capture))
            .stderr(pipe_for(opts.log_stderr || opts.capture))
            .kill_on_drop(true);

        if let Some(env) = &opts.env {
            cmd.env_clear().envs(env);
        }
        if let Some(dir) = &opts.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn pipe_for(wanted: bool) -> Stdio {
    if wanted {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

/// Read one child pipe to EOF
///
/// Logged streams are read line by line and each line is logged as it
/// arrives; unlogged but captured streams are slurped in one go. Returns the
/// captured text (with original line endings) when `capture` is set.
async fn drain<R>(
    pipe: Option<R>,
    stream: Stream,
    command: &str,
    log: bool,
    capture: bool,
) -> Result<Option<String>, ExecutionError>
where
    R: AsyncRead + Unpin,
{
    let io_err = |e: std::io::Error| ExecutionError::Io(format!("{stream:?}: {e}"));

    let Some(pipe) = pipe else {
        return Ok(capture.then(String::new));
    };
    let mut reader = BufReader::new(pipe);

    if !log {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.map_err(io_err)?;
        return Ok(capture.then(|| String::from_utf8_lossy(&buf).into_owned()));
    }

    let mut captured = capture.then(String::new);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await.map_err(io_err)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        stream.log(command, text.trim_end());
        if let Some(buf) = captured.as_mut() {
            buf.push_str(&text);
        }
    }
    Ok(captured)
}

/// Exit code, or the negated signal number when the child was killed
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(sig) = status.signal() {
            let name = nix::sys::signal::Signal::try_from(sig)
                .map(|s| s.as_str())
                .unwrap_or("unknown signal");
            warn!(signal = sig, name = name, "Command terminated by signal");
            return -sig;
        }
    }

    -1
}

#[async_trait]
impl CommandRunner for SubprocessExecutor {
    async fn execute(
        &self,
        command: &str,
        opts: &ExecuteOptions,
    ) -> Result<CommandOutput, ExecutionError> {
        self.run(command, opts).await
    }
}
