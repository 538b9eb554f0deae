pub mod builtin;

use crate::config::FunctionsConfig;
use crate::conversation::Message;
use crate::core::error::ChatError;
use crate::providers::Response;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Something the model can ask to run.
#[async_trait]
pub trait Function: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the accepted arguments object.
    fn parameters_schema(&self) -> Value;
    async fn call(&self, args: Value) -> Result<Value, ChatError>;
}

/// A function as advertised to the model in the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in functions allowed by `config`.
    pub fn with_builtins(config: &FunctionsConfig) -> Self {
        let mut registry = Self::new();
        for function in builtin::builtin_functions(config) {
            registry.register(function);
        }
        registry
    }

    pub fn register(&mut self, function: Arc<dyn Function>) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.functions
            .values()
            .map(|function| FunctionDefinition {
                name: function.name().to_string(),
                description: function.description().to_string(),
                parameters: function.parameters_schema(),
            })
            .collect()
    }

    /// Runs the function requested by the response's first choice.
    ///
    /// Returns a `function` role message holding the result, ready to be
    /// appended to the conversation.
    pub async fn dispatch(&self, response: &Response) -> Result<Message, ChatError> {
        let choice = response.first_choice()?;
        let call = choice.message.function_call_ref().ok_or_else(|| {
            ChatError::MalformedResponse(format!(
                "response {} asked for a function call but carries none",
                response.id
            ))
        })?;

        let function = self
            .functions
            .get(&call.name)
            .ok_or_else(|| ChatError::FunctionNotFound(call.name.clone()))?;

        let args = parse_arguments(&call.name, &call.arguments)?;
        info!(function = %call.name, "dispatching function call");
        debug!(function = %call.name, arguments = %call.arguments);

        let result = function.call(args).await?;
        let content = match result {
            Value::String(text) => text,
            other => serde_json::to_string(&other)?,
        };
        Ok(Message::function(&call.name, content))
    }
}

/// An empty payload means "no arguments".
fn parse_arguments(name: &str, arguments: &str) -> Result<Value, ChatError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments).map_err(|e| {
        ChatError::FunctionExecution(format!("invalid arguments for {}: {}", name, e))
    })
}
