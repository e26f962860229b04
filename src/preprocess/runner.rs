use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::PreprocessError;

/// Runs one external filter command from file to file.
///
/// The whole input is bound to the child's stdin and its stdout is captured
/// verbatim. No placeholders are substituted in the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreprocessorRunner {
    timeout: Option<Duration>,
}

impl PreprocessorRunner {
    /// `None` waits for as long as the command runs.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Split a shell-style command line into program and arguments.
    pub fn parse_command_line(command_line: &str) -> Result<(String, Vec<String>), PreprocessError> {
        let mut words = shlex::split(command_line)
            .ok_or_else(|| PreprocessError::InvalidCommandLine(command_line.to_string()))?;
        if words.is_empty() {
            return Err(PreprocessError::EmptyCommandLine);
        }
        let program = words.remove(0);
        Ok((program, words))
    }

    pub fn run(&self, command_line: &str, input: &Path, output: &Path) -> Result<(), PreprocessError> {
        let (program, args) = Self::parse_command_line(command_line)?;
        let stdin = File::open(input)?;
        let stdout = File::create(output)?;

        log::info!("Running preprocessor: {} {:?}", program, args);

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PreprocessError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = match self.timeout {
            Some(limit) => match child.wait_timeout(limit)? {
                Some(status) => status,
                None => {
                    log::warn!("Preprocessor '{}' timed out after {:?}, killing it", program, limit);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PreprocessError::TimedOut(limit));
                }
            },
            None => child.wait()?,
        };

        if !status.success() {
            return Err(PreprocessError::ExitStatus(status));
        }
        Ok(())
    }
}
