//! Structured external process invocation.
//!
//! Commands are spawned with an explicit argument list rather than a shell
//! string, so values containing quotes, `&` or `^` reach the program verbatim.

use crate::error::{AppError, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated without one.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into `AppError::CommandFailed`.
    pub fn into_result(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(AppError::CommandFailed {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs a program to completion and captures its output.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs commands on the host via `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!("Running {} {:?}", program, args);
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("{} finished with {:?}", program, result.code);
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Records every invocation and replays queued outputs (success when the queue is empty).
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: RefCell<Vec<(String, Vec<String>)>>,
        pub outputs: RefCell<VecDeque<Result<CommandOutput>>>,
    }

    impl RecordingRunner {
        pub fn push_output(&self, output: Result<CommandOutput>) {
            self.outputs.borrow_mut().push_back(output);
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            self.calls.borrow_mut().push((
                program.to_string(),
                args.iter().map(|a| a.to_string()).collect(),
            ));
            self.outputs.borrow_mut().pop_front().unwrap_or_else(|| {
                Ok(CommandOutput {
                    code: Some(0),
                    ..CommandOutput::default()
                })
            })
        }
    }
}
