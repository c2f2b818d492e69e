//! Child-process launch with inherited standard streams.

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::command::CommandLine;

/// Errors spawning the child process. Not retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Spawns a built command with inherited stdin/stdout/stderr.
///
/// There is no capture layer: the child writes straight to the operator's
/// terminal. Extra environment variables override inherited values with the
/// same name; everything else passes through from the parent unchanged.
#[derive(Debug)]
pub struct Launcher {
    command: CommandLine,
    extra_env: Vec<(String, String)>,
}

impl Launcher {
    pub fn of(command: CommandLine) -> Self {
        Self {
            command,
            extra_env: Vec::new(),
        }
    }

    /// Merge an extra variable into the child environment.
    pub fn add_environment(mut self, key: &str, value: &str) -> Self {
        self.extra_env.push((key.to_string(), value.to_string()));
        self
    }

    /// Spawn the child.
    pub fn launch(&self) -> Result<ProcessHandle, LaunchError> {
        let mut cmd = Command::new(&self.command.command);
        cmd.args(&self.command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for (key, value) in self.command.env.iter().chain(self.extra_env.iter()) {
            cmd.env(key, value);
        }
        let child = cmd.spawn().map_err(|source| LaunchError::SpawnFailed {
            command: self.command.command.display().to_string(),
            source,
        })?;
        tracing::debug!(pid = child.id(), "child process started");
        Ok(ProcessHandle { child })
    }
}

/// Handle to a launched child: blocking wait and forced termination.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Block until the child exits.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    /// Forcibly terminate the child. The caller still waits afterwards to
    /// collect the exit status.
    pub fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}
