// Polling helper: retry a probe until its output matches
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

use super::constants::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use super::matcher::Matcher;
use crate::error::{HarnessError, Result};
use crate::port::{CommandOutput, CommandRunner, ExecuteOptions};

/// Attempt budget for `wait_for_result`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

/// Decoders turning a probe's raw result into the value that gets matched
pub mod decode {
    use crate::port::CommandOutput;

    /// Captured stdout, or the empty string when nothing was captured
    pub fn stdout(output: CommandOutput) -> String {
        output.stdout.unwrap_or_default()
    }

    pub fn identity<T>(value: T) -> T {
        value
    }
}

/// Run `func` until `matcher` accepts its decoded output
///
/// Each attempt awaits `func()`, passes the value through `decode` and checks
/// it against `matcher`. On a match the decoded value is returned. Otherwise
/// the helper sleeps `policy.interval` and tries again, up to
/// `policy.attempts` times in total; no sleep follows the final attempt.
///
/// An error from `func` is returned immediately without further attempts.
/// When the budget runs out, the last decoded output is logged and carried in
/// `HarnessError::Timeout`. It is rendered with `{:?}` for every `O`, so a
/// `String` shows up quoted with its newlines escaped (`"ready\n"`).
///
/// # Example
/// ```text
/// let out = wait_for_result(
///     || runner.execute("kubectl get nodes", &ExecuteOptions::captured()),
///     decode::stdout,
///     &regex_count_matcher(Regex::new(" Ready ")?, 3),
///     &PollPolicy::default(),
/// ).await?;
/// ```
pub async fn wait_for_result<F, Fut, R, E, D, O, M>(
    mut func: F,
    decode: D,
    matcher: &M,
    policy: &PollPolicy,
) -> Result<O>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
    E: Into<HarnessError>,
    D: Fn(R) -> O,
    O: Debug,
    M: Matcher<O> + ?Sized,
{
    let mut last_output: Option<O> = None;

    for attempt in 1..=policy.attempts {
        let out = decode(func().await.map_err(Into::into)?);
        if matcher.matches(&out) {
            debug!(attempt = attempt, matcher = %matcher.describe(), "Poll matched");
            return Ok(out);
        }

        debug!(
            attempt = attempt,
            attempts = policy.attempts,
            matcher = %matcher.describe(),
            "Poll did not match yet"
        );
        last_output = Some(out);

        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    let last_output = last_output.map(|out| format!("{:?}", out));
    error!(
        matcher = %matcher.describe(),
        attempts = policy.attempts,
        "Timed out waiting for result"
    );
    error!("The last output of the function:");
    error!("{}", last_output.as_deref().unwrap_or("<none>"));

    Err(HarnessError::Timeout {
        attempts: policy.attempts,
        matcher: matcher.describe(),
        last_output,
    })
}

/// Poll a shell command until its captured stdout matches
pub async fn wait_for_command<R, M>(
    runner: &R,
    command: &str,
    opts: &ExecuteOptions,
    matcher: &M,
    policy: &PollPolicy,
) -> Result<String>
where
    R: CommandRunner + ?Sized,
    M: Matcher<String> + ?Sized,
{
    let opts = opts.clone().capture(true);
    debug!(command = %command, "Polling command output");
    wait_for_result(
        || runner.execute(command, &opts),
        decode::stdout,
        matcher,
        policy,
    )
    .await
}

/// Poll until a command exits with code 0, returning its final output
pub async fn wait_for_success<R>(
    runner: &R,
    command: &str,
    policy: &PollPolicy,
) -> Result<CommandOutput>
where
    R: CommandRunner + ?Sized,
{
    let opts = ExecuteOptions::captured().check(false);
    wait_for_result(
        || runner.execute(command, &opts),
        decode::identity,
        &super::matcher::predicate("exit code 0", |out: &CommandOutput| out.success()),
        policy,
    )
    .await
}
