//! Launch supervision — the restart protocol and interrupt handling.

use std::io::{self, Write};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::command::CommandLine;
use crate::launcher::{LaunchError, Launcher};

/// Reserved child exit status meaning "relaunch me with the same arguments".
///
/// A fixed protocol between this launcher and the server processes it
/// launches; the value is not configurable.
pub const RESTART_STATUS: i32 = 10;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("Failed waiting for child process: {source}")]
    WaitFailed {
        #[source]
        source: io::Error,
    },

    #[error("Failed writing launch report: {source}")]
    ReportFailed {
        #[source]
        source: io::Error,
    },
}

/// Shared interrupt state: the interrupted flag plus the pid of the child
/// currently being supervised.
#[derive(Debug, Clone, Default)]
pub struct InterruptState {
    interrupted: Arc<AtomicBool>,
    child_pid: Arc<AtomicU32>,
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the interrupt and forcibly terminate the supervised child, if
    /// any. Safe to call from a signal-handling thread.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        let pid = self.child_pid.load(Ordering::SeqCst);
        if pid != 0 {
            force_kill(pid);
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn watch(&self, pid: u32) {
        self.child_pid.store(pid, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.child_pid.store(0, Ordering::SeqCst);
    }
}

#[cfg(unix)]
fn force_kill(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn force_kill(_pid: u32) {}

/// Register SIGINT/SIGTERM handling: either signal marks the state
/// interrupted and force-terminates the supervised child, so no orphan
/// outlives the supervisor.
#[cfg(unix)]
pub fn install_interrupt_handler(state: &InterruptState) -> io::Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let state = state.clone();
    std::thread::Builder::new()
        .name("relaunch-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::warn!(signal, "interrupt received");
                state.interrupt();
            }
        })?;
    Ok(())
}

#[cfg(not(unix))]
pub fn install_interrupt_handler(_state: &InterruptState) -> io::Result<()> {
    Ok(())
}

/// Supervises one logical server: launch, wait, relaunch on the restart
/// sentinel, propagate anything else.
///
/// Operator-facing output (the welcome banner and the forced-exit report)
/// goes through the supervisor's output port so callers and tests control
/// where it lands.
pub struct Supervisor<W: Write> {
    out: W,
    interrupts: InterruptState,
}

impl<W: Write> Supervisor<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            interrupts: InterruptState::new(),
        }
    }

    /// Shared handle for wiring signal delivery (or tests) to this
    /// supervisor.
    pub fn interrupt_state(&self) -> InterruptState {
        self.interrupts.clone()
    }

    /// Recover the output port.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run the supervision loop until the child exits with a non-sentinel
    /// status, returning that status for the caller to propagate.
    ///
    /// Every relaunch reuses the same built argument vector; nothing else
    /// survives from the previous child. The loop is unbounded by design:
    /// administrative restarts may legitimately recur indefinitely. An
    /// interrupt force-terminates the running child and yields the child's
    /// forced exit status, never the supervisor's own signal.
    pub fn run(&mut self, command: &CommandLine) -> Result<i32, SupervisorError> {
        loop {
            self.print_welcome(command)
                .map_err(|source| SupervisorError::ReportFailed { source })?;
            let mut handle = Launcher::of(command.clone()).launch()?;
            self.interrupts.watch(handle.pid());
            if self.interrupts.is_interrupted() {
                // The interrupt raced the spawn and saw no pid to kill.
                let _ = handle.kill();
            }
            let status = handle
                .wait()
                .map_err(|source| SupervisorError::WaitFailed { source })?;
            self.interrupts.clear();
            let code = exit_code(status);
            if self.interrupts.is_interrupted() {
                tracing::warn!(
                    status = code,
                    "supervision interrupted; child forcibly terminated"
                );
                writeln!(self.out, "******** Exit status: {code} ********")
                    .and_then(|()| self.out.flush())
                    .map_err(|source| SupervisorError::ReportFailed { source })?;
                return Ok(code);
            }
            if code == RESTART_STATUS {
                tracing::info!(
                    "child requested an administrative restart (exit status {RESTART_STATUS})"
                );
                continue;
            }
            return Ok(code);
        }
    }

    fn print_welcome(&mut self, command: &CommandLine) -> io::Result<()> {
        let rule = "=".repeat(73);
        writeln!(self.out, "{rule}")?;
        writeln!(self.out)?;
        writeln!(self.out, "  Server Bootstrap Environment")?;
        writeln!(self.out)?;
        writeln!(self.out, "  SERVER_HOME: {}", command.home.display())?;
        writeln!(self.out)?;
        writeln!(self.out, "  JAVA: {}", command.command.display())?;
        writeln!(self.out)?;
        write!(self.out, "  JAVA_OPTS:")?;
        for option in &command.options {
            write!(self.out, " {option}")?;
        }
        writeln!(self.out)?;
        writeln!(self.out)?;
        writeln!(self.out, "{rule}")?;
        self.out.flush()
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
