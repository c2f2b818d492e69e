//! Integration tests for the supervision loop and the restart protocol.
//! Unix-only: they drive real `/bin/sh` children.
#![cfg(unix)]

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use relaunch::command::CommandLine;
use relaunch::launcher::LaunchError;
use relaunch::supervisor::{Supervisor, SupervisorError, RESTART_STATUS};

/// A child that exits with the restart status until the `limit`-th run, then
/// exits cleanly. Run count is kept in a scratch file.
fn restarting_command(dir: &tempfile::TempDir, limit: u32) -> (CommandLine, PathBuf) {
    let counter = dir.path().join("counter");
    let script = dir.path().join("child.sh");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             count=$(cat \"$1\" 2>/dev/null || echo 0)\n\
             count=$((count + 1))\n\
             echo \"$count\" > \"$1\"\n\
             if [ \"$count\" -lt {limit} ]; then\n\
                 exit {RESTART_STATUS}\n\
             fi\n\
             exit 0\n"
        ),
    )
    .unwrap();

    let command = CommandLine {
        command: PathBuf::from("/bin/sh"),
        args: vec![
            script.display().to_string(),
            counter.display().to_string(),
        ],
        env: Vec::new(),
        home: dir.path().to_path_buf(),
        options: vec!["-Xmx64m".to_string()],
    };
    (command, counter)
}

fn shell_command(script: &str, home: PathBuf) -> CommandLine {
    CommandLine {
        command: PathBuf::from("/bin/sh"),
        args: vec!["-c".to_string(), script.to_string()],
        env: Vec::new(),
        home,
        options: Vec::new(),
    }
}

fn banner_count(out: &str) -> usize {
    out.matches("Server Bootstrap Environment").count()
}

#[test]
fn restart_status_relaunches_with_the_same_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let (command, counter) = restarting_command(&dir, 4);

    let mut supervisor = Supervisor::new(Vec::new());
    let status = supervisor.run(&command).unwrap();

    assert_eq!(status, 0);
    // Three restarts plus the final clean run: four launches total.
    assert_eq!(std::fs::read_to_string(&counter).unwrap().trim(), "4");
    let out = String::from_utf8(supervisor.into_inner()).unwrap();
    assert_eq!(banner_count(&out), 4);
}

#[test]
fn non_sentinel_status_propagates_after_one_launch() {
    let dir = tempfile::tempdir().unwrap();
    let command = shell_command("exit 1", dir.path().to_path_buf());

    let mut supervisor = Supervisor::new(Vec::new());
    let status = supervisor.run(&command).unwrap();

    assert_eq!(status, 1);
    let out = String::from_utf8(supervisor.into_inner()).unwrap();
    assert_eq!(banner_count(&out), 1);
}

#[test]
fn arbitrary_statuses_pass_through_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let command = shell_command("exit 5", dir.path().to_path_buf());

    let mut supervisor = Supervisor::new(Vec::new());
    assert_eq!(supervisor.run(&command).unwrap(), 5);
}

#[test]
fn welcome_banner_reports_the_resolved_launch() {
    let dir = tempfile::tempdir().unwrap();
    let (command, _counter) = restarting_command(&dir, 1);

    let mut supervisor = Supervisor::new(Vec::new());
    supervisor.run(&command).unwrap();

    let out = String::from_utf8(supervisor.into_inner()).unwrap();
    assert!(out.contains(&format!("SERVER_HOME: {}", dir.path().display())));
    assert!(out.contains("JAVA: /bin/sh"));
    assert!(out.contains("JAVA_OPTS: -Xmx64m"));
}

#[test]
fn interrupt_kills_the_child_and_reports_its_status() {
    let dir = tempfile::tempdir().unwrap();
    let command = shell_command("sleep 30", dir.path().to_path_buf());

    let mut supervisor = Supervisor::new(Vec::new());
    let interrupts = supervisor.interrupt_state();
    let trigger = interrupts.clone();
    let killer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.interrupt();
    });

    let status = supervisor.run(&command).unwrap();
    killer.join().unwrap();

    // SIGKILL surfaces as 128 + 9.
    assert_eq!(status, 137);
    assert!(interrupts.is_interrupted());
    let out = String::from_utf8(supervisor.into_inner()).unwrap();
    assert!(out.contains("******** Exit status: 137 ********"));
}

#[test]
fn interrupted_supervisor_does_not_relaunch() {
    let dir = tempfile::tempdir().unwrap();
    // Would restart forever if the interrupt were treated as a sentinel exit.
    let command = shell_command("sleep 30", dir.path().to_path_buf());

    let mut supervisor = Supervisor::new(Vec::new());
    let trigger = supervisor.interrupt_state();
    let killer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.interrupt();
    });

    supervisor.run(&command).unwrap();
    killer.join().unwrap();

    let out = String::from_utf8(supervisor.into_inner()).unwrap();
    assert_eq!(banner_count(&out), 1);
}

#[test]
fn launch_failure_surfaces_as_an_error() {
    let command = CommandLine {
        command: PathBuf::from("/nonexistent/definitely-missing-runtime"),
        args: Vec::new(),
        env: Vec::new(),
        home: PathBuf::from("."),
        options: Vec::new(),
    };

    let mut supervisor = Supervisor::new(Vec::new());
    match supervisor.run(&command) {
        Err(SupervisorError::Launch(LaunchError::SpawnFailed { .. })) => {}
        other => panic!("expected a spawn failure, got {other:?}"),
    }
}
