use super::ChatState;
use crate::conversation::Conversation;
use crate::core::error::ChatError;

use console::style;
use std::path::Path;

pub trait CommandHandler {
    fn execute(
        &self,
        state: &mut ChatState,
        conversation: &Conversation,
        args: &[&str],
    ) -> Result<Option<String>, ChatError>;
    fn help(&self) -> &'static str;
}

pub struct QuitCommand;
pub struct HelpCommand;
pub struct ModelCommand;
pub struct UsageCommand;
pub struct SaveHistoryCommand;
pub struct ListHistoryCommand;

impl CommandHandler for QuitCommand {
    fn execute(
        &self,
        state: &mut ChatState,
        _conversation: &Conversation,
        _args: &[&str],
    ) -> Result<Option<String>, ChatError> {
        state.should_continue = false;
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/quit - Exit the chat session"
    }
}

impl CommandHandler for HelpCommand {
    fn execute(
        &self,
        _state: &mut ChatState,
        _conversation: &Conversation,
        _args: &[&str],
    ) -> Result<Option<String>, ChatError> {
        let title = style("Available Commands").bold().underlined();
        let help_text = [
            title.to_string(),
            QuitCommand.help().to_string(),
            HelpCommand.help().to_string(),
            ModelCommand.help().to_string(),
            UsageCommand.help().to_string(),
            SaveHistoryCommand.help().to_string(),
            ListHistoryCommand.help().to_string(),
        ]
        .join("\n");

        Ok(Some(help_text))
    }

    fn help(&self) -> &'static str {
        "/help - Show available commands"
    }
}

impl CommandHandler for ModelCommand {
    fn execute(
        &self,
        state: &mut ChatState,
        _conversation: &Conversation,
        args: &[&str],
    ) -> Result<Option<String>, ChatError> {
        match args.first() {
            None => Ok(Some(format!("Current model: {}", state.model))),
            Some(model) => {
                state.model = model.to_string();
                tracing::info!(model = %state.model, "model changed");
                Ok(Some(format!("Model changed to: {}", state.model)))
            }
        }
    }

    fn help(&self) -> &'static str {
        "/model <name> - Show or change the current model"
    }
}

impl CommandHandler for UsageCommand {
    fn execute(
        &self,
        state: &mut ChatState,
        conversation: &Conversation,
        _args: &[&str],
    ) -> Result<Option<String>, ChatError> {
        let usage = state.usage;
        Ok(Some(format!(
            "Messages: {}\nPrompt tokens: {}\nCompletion tokens: {}\nTotal tokens: {}",
            conversation.len(),
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        )))
    }

    fn help(&self) -> &'static str {
        "/usage - Show token usage for this session"
    }
}

impl CommandHandler for SaveHistoryCommand {
    fn execute(
        &self,
        state: &mut ChatState,
        conversation: &Conversation,
        args: &[&str],
    ) -> Result<Option<String>, ChatError> {
        let filename = match args.first() {
            None => chrono::Local::now()
                .format("%Y%m%d_%H%M%S.json")
                .to_string(),
            Some(name) => Path::new(name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ChatError::Input(format!("Invalid filename: {}", name)))?,
        };

        std::fs::create_dir_all(&state.history_dir)?;
        let path = state.history_dir.join(filename);

        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, conversation)?;

        Ok(Some(format!("History saved to: {}", path.display())))
    }

    fn help(&self) -> &'static str {
        "/save <filename> - Save the conversation as JSON"
    }
}

impl CommandHandler for ListHistoryCommand {
    fn execute(
        &self,
        state: &mut ChatState,
        _conversation: &Conversation,
        _args: &[&str],
    ) -> Result<Option<String>, ChatError> {
        std::fs::create_dir_all(&state.history_dir)?;

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&state.history_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();

        if files.is_empty() {
            Ok(Some("No history files found.".to_string()))
        } else {
            Ok(Some(files.join("\n")))
        }
    }

    fn help(&self) -> &'static str {
        "/list - List saved conversations"
    }
}
