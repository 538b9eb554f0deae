use crate::commands::dispatcher::CommandDispatcher;
use crate::core::error::ChatError;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::debug;

/// The human at the keyboard.
pub trait Operator {
    /// Next line of input, or `None` once the operator asked to leave.
    fn read_line(&mut self) -> Result<Option<String>, ChatError>;

    /// Called once when the session ends.
    fn finish(&mut self) -> Result<(), ChatError> {
        Ok(())
    }
}

/// Completes slash-command names and hints from history
pub struct ChatHelper {
    commands: CommandDispatcher,
    highlighter: MatchingBracketHighlighter,
    history_hinter: HistoryHinter,
}

impl ChatHelper {
    pub fn new(commands: CommandDispatcher) -> Self {
        Self {
            commands,
            highlighter: MatchingBracketHighlighter::new(),
            history_hinter: HistoryHinter {},
        }
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Some(typed) = line[..pos].strip_prefix('/') else {
            return Ok((pos, Vec::new()));
        };
        if typed.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let mut matches: Vec<Pair> = self
            .commands
            .get_command_names()
            .into_iter()
            .filter(|name| name.starts_with(typed))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        matches.sort_by(|a, b| a.display.cmp(&b.display));

        Ok((1, matches))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.history_hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(style(hint).dim().to_string())
    }
}

impl Validator for ChatHelper {}

/// Reads operator lines with rustyline, keeping a history file across runs.
pub struct TerminalOperator {
    editor: Editor<ChatHelper, FileHistory>,
    history_path: PathBuf,
}

impl TerminalOperator {
    pub fn new(commands: CommandDispatcher, history_path: PathBuf) -> Result<Self, ChatError> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)
            .map_err(|e| ChatError::Input(format!("Failed to create line editor: {}", e)))?;
        editor.set_helper(Some(ChatHelper::new(commands)));

        if let Err(e) = editor.load_history(&history_path) {
            debug!(path = %history_path.display(), error = %e, "no input history loaded");
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    fn prompt() -> String {
        if cfg!(windows) && std::env::var("PSModulePath").is_ok() {
            "> ".to_string()
        } else {
            style("> ").bold().cyan().to_string()
        }
    }
}

impl Operator for TerminalOperator {
    fn read_line(&mut self) -> Result<Option<String>, ChatError> {
        match self.editor.readline(&Self::prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Exiting...");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn finish(&mut self) -> Result<(), ChatError> {
        if let Some(parent) = self.history_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.editor
            .save_history(&self.history_path)
            .map_err(|e| ChatError::Input(format!("Failed to save history: {}", e)))
    }
}
