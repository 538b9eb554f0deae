use super::ChatState;
use crate::commands::handler::CommandHandler;
use crate::conversation::Conversation;
use crate::core::error::ChatError;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: CommandHandler + 'static>(&mut self, name: &str, command: C) {
        self.handlers.insert(name.to_string(), Arc::new(command));
    }

    pub fn execute(
        &self,
        name: &str,
        args: &[&str],
        state: &mut ChatState,
        conversation: &Conversation,
    ) -> Result<Option<String>, ChatError> {
        self.handlers
            .get(name)
            .ok_or_else(|| ChatError::Input(format!("Unknown command: {}", name)))
            .and_then(|handler| handler.execute(state, conversation, args))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}
