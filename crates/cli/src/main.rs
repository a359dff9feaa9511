//! Clustertest CLI - run and poll shell commands the way test suites do

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use regex::Regex;
use std::time::Duration;

use clustertest_harness::{
    init_logging, predicate, regex_count_matcher, regex_matcher, wait_for_command,
    CommandOutput, ExecuteOptions, ExecutionError, HarnessError, Matcher, PollPolicy, Settings,
    SubprocessExecutor,
};

#[derive(Parser)]
#[command(name = "clustertest")]
#[command(about = "Run and poll shell commands with streamed, captured output", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command once, relaying its output
    Exec {
        /// Capture stdout/stderr and print a summary afterwards
        #[arg(long)]
        capture: bool,

        /// Do not treat a non-zero exit code as an error
        #[arg(long)]
        no_check: bool,

        /// Do not relay stdout to the log
        #[arg(long)]
        quiet_stdout: bool,

        /// Do not relay stderr to the log
        #[arg(long)]
        quiet_stderr: bool,

        /// Print the result as JSON (implies --capture)
        #[arg(long)]
        json: bool,

        /// Shell command to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Re-run a command until its stdout matches
    Wait {
        /// Number of attempts (default from settings)
        #[arg(short, long)]
        attempts: Option<u32>,

        /// Seconds between attempts (default from settings)
        #[arg(short, long)]
        interval: Option<u64>,

        #[command(flatten)]
        expect: Expectation,

        /// Shell command to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[derive(Args)]
struct Expectation {
    /// Stdout (without trailing whitespace) must equal this value
    #[arg(long, required_unless_present = "regex", conflicts_with = "regex")]
    equals: Option<String>,

    /// Stdout must match this regex
    #[arg(long)]
    regex: Option<String>,

    /// With --regex: require exactly this many matches
    #[arg(long, requires = "regex")]
    count: Option<usize>,
}

/// Map an exit code to a process status (signals become 128 + n)
fn exit_status(code: i32) -> i32 {
    if code < 0 {
        128 - code
    } else {
        code
    }
}

fn print_summary(output: &CommandOutput) {
    let code = if output.success() {
        output.code.to_string().green()
    } else {
        output.code.to_string().red()
    };
    println!("{} {}", "Exit code:".bold(), code);
    if let Some(stdout) = &output.stdout {
        println!("{}", "stdout:".cyan().bold());
        print!("{stdout}");
    }
    if let Some(stderr) = &output.stderr {
        println!("{}", "stderr:".yellow().bold());
        print!("{stderr}");
    }
}

/// Options for each `wait` attempt; a failing command is just "not ready yet"
fn wait_options() -> ExecuteOptions {
    ExecuteOptions::captured().check(false).log_stdout(false)
}

fn build_matcher(expect: Expectation) -> Result<Box<dyn Matcher<String>>> {
    if let Some(expected) = expect.equals {
        return Ok(Box::new(predicate(
            format!("equals({expected:?})"),
            move |out: &String| out.trim_end() == expected,
        )));
    }

    let pattern = expect
        .regex
        .context("one of --equals or --regex is required")?;
    let regex = Regex::new(&pattern).with_context(|| format!("Invalid regex: {pattern}"))?;

    let matcher: Box<dyn Matcher<String>> = match expect.count {
        Some(count) => Box::new(regex_count_matcher(regex, count)),
        None => Box::new(regex_matcher(regex)),
    };
    Ok(matcher)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let executor = SubprocessExecutor::new();

    match cli.command {
        Commands::Exec {
            capture,
            no_check,
            quiet_stdout,
            quiet_stderr,
            json,
            command,
        } => {
            let command = command.join(" ");
            let opts = ExecuteOptions::default()
                .capture(capture || json)
                .check(!no_check)
                .log_stdout(!quiet_stdout)
                .log_stderr(!quiet_stderr);

            let output = match executor.run(&command, &opts).await {
                Ok(output) => output,
                Err(ExecutionError::NonZeroExit {
                    code,
                    stdout,
                    stderr,
                    ..
                }) => {
                    let output = CommandOutput {
                        code,
                        stdout,
                        stderr,
                    };
                    if json {
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    } else {
                        print_summary(&output);
                        eprintln!("{} command failed", "✗".red());
                    }
                    std::process::exit(exit_status(code));
                }
                Err(e) => return Err(e).context("Failed to run command"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if capture {
                print_summary(&output);
            }
            if output.code != 0 {
                std::process::exit(exit_status(output.code));
            }
        }

        Commands::Wait {
            attempts,
            interval,
            expect,
            command,
        } => {
            let command = command.join(" ");
            let settings = Settings::load().context("Failed to load settings")?;
            let defaults = settings.poll_policy();
            let policy = PollPolicy::new(
                attempts.unwrap_or(defaults.attempts),
                interval.map(Duration::from_secs).unwrap_or(defaults.interval),
            );
            let matcher = build_matcher(expect)?;

            match wait_for_command(&executor, &command, &wait_options(), matcher.as_ref(), &policy).await {
                Ok(stdout) => {
                    println!("{} {}", "✓".green().bold(), matcher.describe());
                    print!("{stdout}");
                }
                Err(HarnessError::Timeout { last_output, .. }) => {
                    eprintln!(
                        "{} timed out after {} attempts waiting for {}",
                        "✗".red().bold(),
                        policy.attempts,
                        matcher.describe()
                    );
                    if let Some(last) = last_output {
                        eprintln!("{} {}", "last output:".bold(), last);
                    }
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Polling failed"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_maps_signals() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(3), 3);
        assert_eq!(exit_status(-9), 137);
    }

    #[test]
    fn test_equals_matcher_ignores_trailing_newline() {
        let matcher = build_matcher(Expectation {
            equals: Some("ready".to_string()),
            regex: None,
            count: None,
        })
        .unwrap();
        assert!(matcher.matches(&"ready\n".to_string()));
        assert!(!matcher.matches(&"not ready\n".to_string()));
    }

    #[test]
    fn test_regex_count_matcher() {
        let matcher = build_matcher(Expectation {
            equals: None,
            regex: Some("Ready".to_string()),
            count: Some(2),
        })
        .unwrap();
        assert!(matcher.matches(&"Ready\nReady\n".to_string()));
        assert!(!matcher.matches(&"Ready\n".to_string()));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let result = build_matcher(Expectation {
            equals: None,
            regex: Some("(".to_string()),
            count: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_trailing_command() {
        let cli = Cli::try_parse_from(["clustertest", "exec", "--capture", "--", "ls", "-la"])
            .unwrap();
        match cli.command {
            Commands::Exec {
                capture, command, ..
            } => {
                assert!(capture);
                assert_eq!(command.join(" "), "ls -la");
            }
            Commands::Wait { .. } => panic!("parsed wrong subcommand"),
        }
    }

    #[tokio::test]
    async fn test_wait_polls_through_failures() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tries");
        let command = format!(
            "echo x >> {p}; [ $(wc -l < {p}) -ge 2 ] && echo ok || exit 3",
            p = marker.display()
        );
        let opts = wait_options();
        assert!(opts.capture);
        assert!(!opts.check);

        let stdout = wait_for_command(
            &SubprocessExecutor::new(),
            &command,
            &opts,
            &regex_matcher(Regex::new("ok").unwrap()),
            &PollPolicy::new(5, Duration::from_millis(10)),
        )
        .await
        .unwrap();
        assert_eq!(stdout, "ok\n");
    }

    #[test]
    fn test_wait_requires_expectation() {
        assert!(Cli::try_parse_from(["clustertest", "wait", "--", "true"]).is_err());
        assert!(
            Cli::try_parse_from(["clustertest", "wait", "--regex", "x", "--", "true"]).is_ok()
        );
    }
}
