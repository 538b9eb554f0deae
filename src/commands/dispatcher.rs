use super::{
    ChatState,
    handler::{
        HelpCommand, ListHistoryCommand, ModelCommand, QuitCommand, SaveHistoryCommand,
        UsageCommand,
    },
    registry::CommandRegistry,
};
use crate::conversation::Conversation;
use crate::core::error::ChatError;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn execute(
        &self,
        command: &str,
        args: &[&str],
        state: &mut ChatState,
        conversation: &Conversation,
    ) -> Result<Option<String>, ChatError> {
        self.registry.execute(command, args, state, conversation)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.registry.contains(command)
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }
}

pub fn create_command_registry() -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register("quit", QuitCommand);
    registry.register("help", HelpCommand);
    registry.register("model", ModelCommand);
    registry.register("usage", UsageCommand);
    registry.register("save", SaveHistoryCommand);
    registry.register("list", ListHistoryCommand);

    CommandDispatcher::new(Arc::new(registry))
}
