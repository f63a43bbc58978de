// INTENTIONALLY VULNERABLE CODE - FOR SECURITY SCANNER TESTING ONLY
// Every entry point below forwards caller input to a process launcher
// without validation. Do not "fix" them; see `controls.rs` for the
// hardened counterparts.

use crate::errors::FixtureResult;
use crate::utils::config::FixtureConfig;
use std::process::{Child, Command};

/// Command-injection fixture.
///
/// Each method spawns a process and hands back the [`Child`] untouched: no
/// wait, no output capture, no exit-code check.
#[derive(Debug, Clone)]
pub struct VulnerableCommand {
    shell: String,
    ping_count: u32,
    convert_program: String,
    convert_output: String,
    backup_archive: String,
}

impl VulnerableCommand {
    pub fn new(config: &FixtureConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            ping_count: config.ping_count,
            convert_program: config.convert_program.clone(),
            convert_output: config.convert_output.clone(),
            backup_archive: config.backup_archive.clone(),
        }
    }

    /// VULNERABLE: shell line built by concatenation.
    pub fn ping_host(&self, host: &str) -> FixtureResult<Child> {
        let line = format!("ping -c {} {host}", self.ping_count);
        tracing::debug!(%line, "ping_host");
        Ok(Command::new(&self.shell).arg("-c").arg(&line).spawn()?)
    }

    /// VULNERABLE: user input as a direct argument to a fixed program.
    pub fn process_file(&self, filename: &str) -> FixtureResult<Child> {
        tracing::debug!(filename, program = %self.convert_program, "process_file");
        Ok(Command::new(&self.convert_program)
            .arg(filename)
            .arg(&self.convert_output)
            .spawn()?)
    }

    /// VULNERABLE: arbitrary input wrapped in `sh -c`.
    pub fn execute_command(&self, cmd: &str) -> FixtureResult<Child> {
        tracing::debug!(cmd, "execute_command");
        Ok(Command::new(&self.shell).args(["-c", cmd]).spawn()?)
    }

    /// VULNERABLE: filename spliced into a `tar` shell line.
    pub fn backup_file(&self, filename: &str) -> FixtureResult<Child> {
        let line = format!("tar -czf {} {}", self.backup_archive, filename);
        tracing::debug!(%line, "backup_file");
        Ok(Command::new(&self.shell).arg("-c").arg(line).spawn()?)
    }
}

#[test]
fn ping_host_chains_a_second_command() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("chained");

    let fixture = VulnerableCommand::new(&FixtureConfig::default());
    let payload = format!("2>/dev/null; touch {}", marker.display());
    fixture.ping_host(&payload).unwrap().wait().unwrap();

    assert!(marker.exists(), "`;` must start a second command");
}

#[test]
fn process_file_passes_input_as_argument() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let output = dir.path().join("converted.png");

    let config = FixtureConfig {
        convert_program: "touch".into(),
        convert_output: output.to_string_lossy().into_owned(),
        ..FixtureConfig::default()
    };
    let fixture = VulnerableCommand::new(&config);
    fixture
        .process_file(&input.to_string_lossy())
        .unwrap()
        .wait()
        .unwrap();

    assert!(input.exists());
    assert!(output.exists());
}

#[test]
fn execute_command_runs_through_the_shell() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");

    let fixture = VulnerableCommand::new(&FixtureConfig::default());
    let cmd = format!("echo injected > {}", out.display());
    let status = fixture.execute_command(&cmd).unwrap().wait().unwrap();

    assert!(status.success());
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "injected\n");
}

#[test]
fn backup_file_chains_a_second_command() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("after-tar");

    let config = FixtureConfig {
        backup_archive: dir.path().join("backup.tar.gz").to_string_lossy().into_owned(),
        ..FixtureConfig::default()
    };
    let fixture = VulnerableCommand::new(&config);
    let payload = format!("missing-file 2>/dev/null; touch {}", marker.display());
    fixture.backup_file(&payload).unwrap().wait().unwrap();

    assert!(marker.exists());
}

#[test]
fn spawn_failure_propagates_as_io_error() {
    let config = FixtureConfig {
        shell: "/nonexistent/nyx-fixtures-shell".into(),
        ..FixtureConfig::default()
    };
    let fixture = VulnerableCommand::new(&config);

    let err = fixture.execute_command("true").unwrap_err();
    assert!(matches!(err, crate::errors::FixtureError::Io(_)));
}
