//! One interactive chat session and its request/response cycle.

use crate::commands::{self, ChatState, dispatcher::CommandDispatcher};
use crate::conversation::{Conversation, Message};
use crate::core::error::ChatError;
use crate::display::{self, Screen};
use crate::functions::FunctionRegistry;
use crate::input::Operator;
use crate::providers::{FinishReason, LlmProvider};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Whether the outer loop should run another turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Exit,
}

pub struct SessionOptions {
    pub model: String,
    pub system_prompt: Option<String>,
    pub clear_screen: bool,
    pub history_dir: PathBuf,
}

pub struct Session {
    conversation: Conversation,
    state: ChatState,
    provider: Box<dyn LlmProvider>,
    functions: FunctionRegistry,
    commands: CommandDispatcher,
    operator: Box<dyn Operator>,
    screen: Box<dyn Screen>,
    clear_screen: bool,
}

impl Session {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        functions: FunctionRegistry,
        operator: Box<dyn Operator>,
        screen: Box<dyn Screen>,
        options: SessionOptions,
    ) -> Self {
        let conversation = match options.system_prompt {
            Some(prompt) => Conversation::with_system_prompt(prompt),
            None => Conversation::new(),
        };

        Self {
            conversation,
            state: ChatState::new(&options.model, options.history_dir),
            provider,
            functions,
            commands: commands::create_command_registry(),
            operator,
            screen,
            clear_screen: options.clear_screen,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn model(&self) -> &str {
        &self.state.model
    }

    pub fn greet(&mut self) -> Result<(), ChatError> {
        display::display_banner(self.screen.as_mut(), self.provider.name(), &self.state.model)?;
        Ok(())
    }

    /// Runs turns until the operator leaves or an error escapes.
    pub async fn run(&mut self) -> Result<(), ChatError> {
        loop {
            if self.turn().await? == TurnOutcome::Exit {
                return Ok(());
            }
        }
    }

    /// One request/response cycle.
    ///
    /// Seeds the conversation with an operator message when it holds at most
    /// one message, asks the model, appends the first choice, then either
    /// dispatches the requested function or asks the operator for the next
    /// message.
    pub async fn turn(&mut self) -> Result<TurnOutcome, ChatError> {
        if self.conversation.len() <= 1 {
            match self.solicit_user_message()? {
                Some(message) => self.conversation.add(message),
                None => return Ok(TurnOutcome::Exit),
            }
        }

        let definitions = self.functions.definitions();
        let response = self
            .provider
            .complete(self.conversation.messages(), &self.state.model, &definitions)
            .await?;
        self.state.usage += response.usage;
        debug!(id = %response.id, usage = ?response.usage, "completion received");

        let choice = response.first_choice()?;
        self.conversation.add(choice.message.clone());
        self.render()?;

        let outcome = match &choice.finish_reason {
            FinishReason::FunctionCall => {
                let result = self.functions.dispatch(&response).await?;
                self.conversation.add(result);
                TurnOutcome::Continue
            }
            FinishReason::Stop => self.prompt_operator()?,
            reason @ (FinishReason::Length
            | FinishReason::ToolCalls
            | FinishReason::ContentFilter
            | FinishReason::Other(_)) => {
                warn!(
                    finish_reason = ?reason,
                    "completion stopped early; handing back to operator"
                );
                self.prompt_operator()?
            }
        };

        self.render()?;
        Ok(outcome)
    }

    fn prompt_operator(&mut self) -> Result<TurnOutcome, ChatError> {
        match self.solicit_user_message()? {
            Some(message) => {
                self.conversation.add(message);
                Ok(TurnOutcome::Continue)
            }
            None => Ok(TurnOutcome::Exit),
        }
    }

    /// Reads lines until one is a message for the model.
    ///
    /// Registered slash commands run in place; any other text, including an
    /// unknown `/word`, goes to the model. Blank lines are skipped. `None`
    /// means the operator is done.
    fn solicit_user_message(&mut self) -> Result<Option<Message>, ChatError> {
        loop {
            let Some(line) = self.operator.read_line()? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = commands::parse_command(&line)
                .filter(|(name, _)| self.commands.contains(name));
            if let Some((name, args)) = command {
                match self
                    .commands
                    .execute(name, &args, &mut self.state, &self.conversation)
                {
                    Ok(Some(output)) => {
                        for text in output.lines() {
                            self.screen.print_line(text)?;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => self
                        .screen
                        .print_line(&format!("Error executing command: {}", e))?,
                }

                if !self.state.should_continue {
                    return Ok(None);
                }
                continue;
            }

            return Ok(Some(Message::user(line)));
        }
    }

    fn render(&mut self) -> Result<(), ChatError> {
        self.conversation
            .render(self.clear_screen, self.screen.as_mut())
    }

    /// Releases the operator's resources; call once after `run` returns.
    ///
    /// A failure here is only logged so it never hides the error that ended
    /// the session.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.operator.finish() {
            warn!(error = %e, "failed to release operator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::providers::Response;
    use crate::testing::{
        MockProvider, RecordingFunction, RecordingScreen, ScriptedOperator,
        function_call_response, text_response,
    };
    use serde_json::json;
    use std::sync::Arc;

    struct Harness {
        session: Session,
        operator: ScriptedOperator,
        provider: MockProvider,
        screen: RecordingScreen,
    }

    fn harness(
        responses: Vec<Response>,
        lines: &[&str],
        functions: FunctionRegistry,
        system_prompt: Option<&str>,
    ) -> Harness {
        let operator = ScriptedOperator::new(lines);
        let provider = MockProvider::new(responses);
        let screen = RecordingScreen::default();
        let session = Session::new(
            Box::new(provider.clone()),
            functions,
            Box::new(operator.clone()),
            Box::new(screen.clone()),
            SessionOptions {
                model: "gpt-4-0613".to_string(),
                system_prompt: system_prompt.map(str::to_string),
                clear_screen: true,
                history_dir: std::env::temp_dir(),
            },
        );
        Harness {
            session,
            operator,
            provider,
            screen,
        }
    }

    fn echo_registry() -> (FunctionRegistry, RecordingFunction) {
        let function = RecordingFunction::new("echo", json!({"ok": true}));
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(function.clone()));
        (registry, function)
    }

    #[tokio::test]
    async fn stop_cycle_from_empty_conversation() {
        let mut h = harness(
            vec![text_response("Hi, how can I help?", FinishReason::Stop)],
            &["hello", "tell me a joke"],
            FunctionRegistry::new(),
            None,
        );

        let outcome = h.session.turn().await.unwrap();

        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(
            h.session.conversation().messages(),
            &[
                Message::user("hello"),
                Message::assistant("Hi, how can I help?"),
                Message::user("tell me a joke"),
            ]
        );
        assert_eq!(h.operator.reads(), 2);
        assert_eq!(h.provider.calls().len(), 1);
        assert_eq!(h.provider.calls()[0], vec![Message::user("hello")]);
        assert_eq!(h.provider.models(), vec!["gpt-4-0613"]);
    }

    #[tokio::test]
    async fn function_call_dispatches_without_prompting() {
        let (registry, function) = echo_registry();
        let mut h = harness(
            vec![function_call_response("echo", r#"{"text":"ping"}"#)],
            &["call echo please"],
            registry,
            None,
        );

        h.session.turn().await.unwrap();

        assert_eq!(h.operator.reads(), 1, "only the seed prompt may read input");
        assert_eq!(function.calls().lock().unwrap().len(), 1);
        let messages = h.session.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].function_call_ref().unwrap().name, "echo");
        assert_eq!(messages[2].role, Role::Function);
        assert_eq!(messages[2].name.as_deref(), Some("echo"));
        assert_eq!(messages[2].content(), r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn other_finish_reasons_prompt_instead_of_dispatching() {
        for reason in [
            FinishReason::Stop,
            FinishReason::Length,
            FinishReason::ContentFilter,
            FinishReason::ToolCalls,
            FinishReason::Other("mystery".to_string()),
        ] {
            let (registry, function) = echo_registry();
            let mut h = harness(
                vec![text_response("partial", reason.clone())],
                &["seed", "next"],
                registry,
                None,
            );

            h.session.turn().await.unwrap();

            assert!(function.calls().lock().unwrap().is_empty(), "{reason:?} dispatched");
            assert_eq!(h.operator.reads(), 2, "{reason:?} did not prompt");
            assert_eq!(h.session.conversation().len(), 3);
        }
    }

    #[tokio::test]
    async fn seed_does_not_fire_on_later_turns() {
        let mut h = harness(
            vec![
                text_response("first", FinishReason::Stop),
                text_response("second", FinishReason::Stop),
            ],
            &["one", "two", "three"],
            FunctionRegistry::new(),
            None,
        );

        h.session.turn().await.unwrap();
        assert_eq!(h.operator.reads(), 2);
        h.session.turn().await.unwrap();

        assert_eq!(h.operator.reads(), 3);
        let contents: Vec<&str> = h
            .session
            .conversation()
            .iter()
            .map(Message::content)
            .collect();
        assert_eq!(contents, vec!["one", "first", "two", "second", "three"]);
        assert_eq!(h.provider.calls()[1].len(), 3);
    }

    #[tokio::test]
    async fn system_prompt_still_gets_seeded() {
        let mut h = harness(
            vec![text_response("ok", FinishReason::Stop)],
            &["question", "follow-up"],
            FunctionRegistry::new(),
            Some("You are terse."),
        );

        h.session.turn().await.unwrap();

        let messages = h.session.conversation().messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::system("You are terse."));
        assert_eq!(messages[1], Message::user("question"));
    }

    #[tokio::test]
    async fn function_result_goes_back_to_model_next_turn() {
        let (registry, _function) = echo_registry();
        let mut h = harness(
            vec![
                function_call_response("echo", "{}"),
                text_response("The echo worked.", FinishReason::Stop),
            ],
            &["try it", "thanks"],
            registry,
            None,
        );

        h.session.turn().await.unwrap();
        h.session.turn().await.unwrap();

        let second_request = &h.provider.calls()[1];
        assert_eq!(second_request.len(), 3);
        assert_eq!(second_request[2].role, Role::Function);
        assert_eq!(h.session.conversation().len(), 5);
        assert_eq!(h.operator.reads(), 2);
    }

    #[tokio::test]
    async fn renders_twice_per_turn() {
        let mut h = harness(
            vec![text_response("answer", FinishReason::Stop)],
            &["question", "next"],
            FunctionRegistry::new(),
            None,
        );

        h.session.turn().await.unwrap();

        assert_eq!(h.screen.clears(), 2);
        let output = h.screen.plain_lines().join("\n");
        assert_eq!(output.matches("answer").count(), 2);
        assert_eq!(output.matches("next").count(), 1);
    }

    #[tokio::test]
    async fn empty_input_at_seed_exits_without_calling_model() {
        let mut h = harness(vec![], &[], FunctionRegistry::new(), None);

        let outcome = h.session.turn().await.unwrap();

        assert_eq!(outcome, TurnOutcome::Exit);
        assert!(h.provider.calls().is_empty());
        assert!(h.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn interrupt_after_reply_keeps_assistant_message() {
        let mut h = harness(
            vec![text_response("bye", FinishReason::Stop)],
            &["hello"],
            FunctionRegistry::new(),
            None,
        );

        assert_eq!(h.session.turn().await.unwrap(), TurnOutcome::Exit);
        assert_eq!(h.session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn commands_run_between_messages() {
        let mut h = harness(
            vec![text_response("ok", FinishReason::Stop)],
            &["", "/model gpt-4o", "hello", "/quit"],
            FunctionRegistry::new(),
            None,
        );

        let outcome = h.session.turn().await.unwrap();

        assert_eq!(outcome, TurnOutcome::Exit);
        assert_eq!(h.session.model(), "gpt-4o");
        assert_eq!(h.provider.models(), vec!["gpt-4o"]);
        assert_eq!(h.session.conversation().messages()[0], Message::user("hello"));
        let output = h.screen.plain_lines().join("\n");
        assert!(output.contains("Model changed to: gpt-4o"));
    }

    #[tokio::test]
    async fn unregistered_slash_text_is_sent_to_model() {
        let mut h = harness(
            vec![text_response("That file looks fine.", FinishReason::Stop)],
            &["/etc/hosts looks wrong?", "thanks"],
            FunctionRegistry::new(),
            None,
        );

        h.session.turn().await.unwrap();

        assert_eq!(
            h.provider.calls()[0],
            vec![Message::user("/etc/hosts looks wrong?")]
        );
        let output = h.screen.plain_lines().join("\n");
        assert!(!output.contains("Unknown command"));
    }

    #[tokio::test]
    async fn run_loops_until_operator_leaves() {
        let mut h = harness(
            vec![
                text_response("a", FinishReason::Stop),
                text_response("b", FinishReason::Stop),
            ],
            &["1", "2"],
            FunctionRegistry::new(),
            None,
        );

        h.session.run().await.unwrap();

        assert_eq!(h.provider.calls().len(), 2);
        assert_eq!(h.session.conversation().len(), 4);
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let mut h = harness(vec![], &["hello"], FunctionRegistry::new(), None);
        let result = h.session.turn().await;
        assert!(matches!(result, Err(ChatError::Api(_))));
        assert_eq!(h.session.conversation().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_failure_keeps_session_error() {
        let mut h = harness(vec![], &["hello"], FunctionRegistry::new(), None);
        h.operator.fail_on_finish();

        let result = h.session.run().await;
        h.session.shutdown();

        assert!(matches!(result, Err(ChatError::Api(_))));
        assert_eq!(h.operator.finishes(), 1);
    }

    #[tokio::test]
    async fn unknown_function_propagates() {
        let mut h = harness(
            vec![function_call_response("missing", "{}")],
            &["hello"],
            FunctionRegistry::new(),
            None,
        );
        let result = h.session.turn().await;
        assert!(matches!(result, Err(ChatError::FunctionNotFound(_))));
    }

    #[tokio::test]
    async fn usage_is_accumulated() {
        let mut h = harness(
            vec![
                text_response("a", FinishReason::Stop),
                text_response("b", FinishReason::Stop),
            ],
            &["1", "2", "3"],
            FunctionRegistry::new(),
            None,
        );
        h.session.turn().await.unwrap();
        h.session.turn().await.unwrap();
        assert_eq!(h.session.state.usage.total_tokens, 2 * 15);
    }
}
