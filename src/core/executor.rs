use crate::system::SystemInfo;
use serde::Serialize;
use std::io;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs `command` through the detected shell and captures its output.
pub async fn execute_command(command: &str, system_info: &SystemInfo) -> io::Result<CommandOutput> {
    let output = Command::new(&system_info.shell_path)
        .arg(system_info.shell_type.command_flag())
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        success: output.status.success(),
    })
}
