use serde::Serialize;
use std::env;
use std::path::Path;

/// How a command string is handed to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    Cmd,
    PowerShell,
    Posix,
    Fish,
}

impl ShellType {
    /// Flag that makes the shell run the next argument as a command.
    pub fn command_flag(&self) -> &'static str {
        match self {
            ShellType::Cmd => "/C",
            ShellType::PowerShell => "-Command",
            ShellType::Posix | ShellType::Fish => "-c",
        }
    }
}

/// Host facts exposed to the model through `get_system_info`.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub bitness: String,
    pub shell_path: String,
    pub shell_type: ShellType,
}

impl SystemInfo {
    pub fn detect() -> Self {
        let info = os_info::get();
        let (shell_path, shell_type) = detect_shell();

        SystemInfo {
            os: info.os_type().to_string(),
            os_version: info.version().to_string(),
            bitness: info.bitness().to_string(),
            shell_path,
            shell_type,
        }
    }
}

fn detect_shell() -> (String, ShellType) {
    if cfg!(target_os = "windows") {
        if env::var("PSModulePath").is_ok() {
            if let Ok(posh_path) = env::var("POSH_EXECUTABLE") {
                if Path::new(&posh_path).exists() {
                    return (posh_path, ShellType::PowerShell);
                }
            }
            return ("powershell.exe".to_string(), ShellType::PowerShell);
        }
        (
            env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            ShellType::Cmd,
        )
    } else {
        let shell_path = env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        let shell_type = shell_type_for(&shell_path);
        (shell_path, shell_type)
    }
}

fn shell_type_for(shell_path: &str) -> ShellType {
    let shell_name = Path::new(shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sh")
        .to_lowercase();

    if shell_name == "fish" {
        ShellType::Fish
    } else {
        ShellType::Posix
    }
}
