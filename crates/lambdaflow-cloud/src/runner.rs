//! External command gateway
//!
//! Every provider call goes through a [`CommandRunner`]. The runner decides,
//! once, whether a non-zero exit means "no such resource" or a real failure.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Exit code the AWS CLI uses for service-side errors such as
/// `ResourceNotFoundException`
pub const AWS_NOT_FOUND_EXIT_CODE: i32 = 254;

/// How the child's output is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Child inherits stdout/stderr so progress shows up live
    Mirror,
    /// stdout and stderr are captured; nothing reaches the console
    Capture,
}

/// Result of a command that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exit status 0, with captured stdout (empty in [`OutputMode::Mirror`])
    Output(Vec<u8>),
    /// The provider reported that the resource does not exist
    Absent,
}

impl CommandOutcome {
    pub fn is_absent(&self) -> bool {
        matches!(self, CommandOutcome::Absent)
    }

    /// Unwrap the output of a call where absence is not an acceptable answer
    pub fn into_output(self, program: &str, action: &str) -> Result<Vec<u8>> {
        match self {
            CommandOutcome::Output(output) => Ok(output),
            CommandOutcome::Absent => Err(CloudError::CommandFailed {
                program: program.to_string(),
                action: action.to_string(),
                status: "no such resource".to_string(),
                stderr: String::new(),
            }),
        }
    }
}

/// Capability to run an external program
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], mode: OutputMode)
    -> Result<CommandOutcome>;
}

/// `<service> <action>` part of an argument list, for messages
pub fn describe_action(args: &[String]) -> String {
    args.iter()
        .take_while(|a| !a.starts_with("--"))
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone)]
pub struct CliRunner {
    not_found_exit_code: Option<i32>,
}

impl CliRunner {
    pub fn new(not_found_exit_code: Option<i32>) -> Self {
        Self {
            not_found_exit_code,
        }
    }

    /// Runner for the AWS CLI
    pub fn aws() -> Self {
        Self::new(Some(AWS_NOT_FOUND_EXIT_CODE))
    }
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::aws()
    }
}

#[async_trait]
impl CommandRunner for CliRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        mode: OutputMode,
    ) -> Result<CommandOutcome> {
        tracing::debug!("Running: {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());

        let (status, stdout, stderr) = match mode {
            OutputMode::Mirror => {
                cmd.stdout(Stdio::inherit());
                cmd.stderr(Stdio::inherit());
                let status = cmd.status().await.map_err(|e| spawn_error(program, e))?;
                (status, Vec::new(), String::new())
            }
            OutputMode::Capture => {
                cmd.stdout(Stdio::piped());
                cmd.stderr(Stdio::piped());
                let output = cmd.output().await.map_err(|e| spawn_error(program, e))?;
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                (output.status, output.stdout, stderr)
            }
        };

        if status.success() {
            return Ok(CommandOutcome::Output(stdout));
        }

        if let Some(code) = status.code()
            && Some(code) == self.not_found_exit_code
        {
            tracing::debug!("{} exited with {}, treating as absent", program, code);
            return Ok(CommandOutcome::Absent);
        }

        let status = match status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        Err(CloudError::CommandFailed {
            program: program.to_string(),
            action: describe_action(args),
            status,
            stderr,
        })
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> CloudError {
    if err.kind() == std::io::ErrorKind::NotFound {
        CloudError::ProgramNotFound(program.to_string())
    } else {
        CloudError::Io(err)
    }
}
