use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};

use tracing::{debug, warn};

use crate::config::EngineEnv;
use crate::error::AppError;

/// An external program plus its arguments, run with the engine environment applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn to_command(&self, env: &EngineEnv) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.envs(env.vars());
        command
    }

    /// Run to completion and capture its output.
    pub fn capture(&self, env: &EngineEnv) -> Result<Captured, AppError> {
        debug!(command = %self, "Running command");
        let output = self
            .to_command(env)
            .output()
            .map_err(|source| AppError::Launch { program: self.program.clone(), source })?;
        Ok(Captured::from(output))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        combined.extend_from_slice(&self.stdout);
        combined.extend_from_slice(&self.stderr);
        combined
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn combined_text(&self) -> String {
        String::from_utf8_lossy(&self.combined()).into_owned()
    }
}

impl From<Output> for Captured {
    fn from(output: Output) -> Self {
        Captured { status: output.status, stdout: output.stdout, stderr: output.stderr }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Written { path: PathBuf, bytes: u64 },
    Failed { status: ExitStatus, output: String },
}

/// Run `spec` and store its captured output in `path`.
///
/// A non-zero exit leaves `path` untouched and reports [`RunOutcome::Failed`],
/// unless `ignore_exit_code` is set, in which case the output is written anyway.
pub fn write_output_to_file(
    spec: &CommandSpec,
    env: &EngineEnv,
    path: &Path,
    ignore_exit_code: bool,
) -> Result<RunOutcome, AppError> {
    let captured = spec.capture(env)?;
    if !captured.success() {
        if !ignore_exit_code {
            return Ok(RunOutcome::Failed {
                status: captured.status,
                output: captured.combined_text(),
            });
        }
        warn!(command = %spec, status = %captured.status, "Keeping output of failed command");
    }

    let output = captured.combined();
    fs::write(path, &output)?;
    Ok(RunOutcome::Written { path: path.to_path_buf(), bytes: output.len() as u64 })
}
