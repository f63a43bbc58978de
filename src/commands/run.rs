use crate::errors::FixtureResult;
use crate::fixtures::command::VulnerableCommand;
use crate::fixtures::controls::SafeCommand;
use crate::utils::config::FixtureConfig;
use console::style;
use std::process::Child;

pub fn ping(host: &str, control: bool, cfg: &FixtureConfig) -> FixtureResult<()> {
    let child = if control {
        SafeCommand::new(cfg).ping_host(host)?
    } else {
        VulnerableCommand::new(cfg).ping_host(host)?
    };
    wait("ping", child)
}

pub fn convert(file: &str, cfg: &FixtureConfig) -> FixtureResult<()> {
    wait("convert", VulnerableCommand::new(cfg).process_file(file)?)
}

pub fn exec(cmd: &str, cfg: &FixtureConfig) -> FixtureResult<()> {
    wait("exec", VulnerableCommand::new(cfg).execute_command(cmd)?)
}

pub fn backup(file: &str, cfg: &FixtureConfig) -> FixtureResult<()> {
    wait("backup", VulnerableCommand::new(cfg).backup_file(file)?)
}

/// The fixtures never wait on their children; the CLI does, so the output
/// lands before the process exits.
fn wait(label: &str, mut child: Child) -> FixtureResult<()> {
    let pid = child.id();
    let status = child.wait()?;
    tracing::info!(label, pid, %status, "child exited");
    eprintln!("{} {label} ({status})", style("ran").green().bold());
    Ok(())
}
