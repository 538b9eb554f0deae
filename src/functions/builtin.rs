use super::Function;
use crate::config::FunctionsConfig;
use crate::core::error::ChatError;
use crate::core::executor::execute_command;
use crate::system::SystemInfo;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

pub fn builtin_functions(config: &FunctionsConfig) -> Vec<Arc<dyn Function>> {
    let system_info = SystemInfo::detect();
    let mut functions: Vec<Arc<dyn Function>> = vec![
        Arc::new(CurrentTime),
        Arc::new(SystemInfoFunction {
            info: system_info.clone(),
        }),
    ];
    if config.shell {
        functions.push(Arc::new(ShellCommand { system_info }));
    }
    functions
}

pub struct CurrentTime;

#[async_trait]
impl Function for CurrentTime {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Returns the current local date and time in RFC 3339 format, with the UTC offset."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _args: Value) -> Result<Value, ChatError> {
        let now = chrono::Local::now();
        Ok(json!({
            "datetime": now.to_rfc3339(),
            "timezone_offset": now.format("%:z").to_string(),
            "weekday": now.format("%A").to_string(),
        }))
    }
}

pub struct SystemInfoFunction {
    info: SystemInfo,
}

#[async_trait]
impl Function for SystemInfoFunction {
    fn name(&self) -> &str {
        "get_system_info"
    }

    fn description(&self) -> &str {
        "Describes the operating system and shell of the machine the user is on."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _args: Value) -> Result<Value, ChatError> {
        Ok(serde_json::to_value(&self.info)?)
    }
}

pub struct ShellCommand {
    system_info: SystemInfo,
}

#[async_trait]
impl Function for ShellCommand {
    fn name(&self) -> &str {
        "run_shell_command"
    }

    fn description(&self) -> &str {
        "Runs a single command in the user's shell and returns its stdout, stderr and exit code."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command line to run"
                }
            },
            "required": ["command"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ChatError> {
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .filter(|command| !command.trim().is_empty())
            .ok_or_else(|| {
                ChatError::FunctionExecution(
                    "run_shell_command needs a non-empty `command`".to_string(),
                )
            })?;

        tracing::info!(command, "running shell command for the model");
        let output = execute_command(command, &self.system_info)
            .await
            .map_err(|e| {
                ChatError::FunctionExecution(format!("failed to run `{}`: {}", command, e))
            })?;
        Ok(serde_json::to_value(output)?)
    }
}
