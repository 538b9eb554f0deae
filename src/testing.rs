//! Doubles for the session's collaborators.

use crate::conversation::{FunctionCall, Message};
use crate::core::error::ChatError;
use crate::display::Screen;
use crate::functions::{Function, FunctionDefinition};
use crate::input::Operator;
use crate::providers::types::Choice;
use crate::providers::{FinishReason, LlmProvider, Response, Usage};
use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

fn response_with(message: Message, finish_reason: FinishReason) -> Response {
    Response {
        id: "chatcmpl-test".to_string(),
        object: "chat.completion".to_string(),
        created: 1_700_000_000,
        model: Some("gpt-4-0613".to_string()),
        choices: vec![Choice {
            index: 0,
            message,
            finish_reason,
        }],
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

pub fn text_response(text: &str, finish_reason: FinishReason) -> Response {
    response_with(Message::assistant(text), finish_reason)
}

pub fn function_call_response(name: &str, arguments: &str) -> Response {
    let message = Message::function_call(FunctionCall {
        name: name.to_string(),
        arguments: arguments.to_string(),
    });
    response_with(message, FinishReason::FunctionCall)
}

/// Replies with scripted responses in order and records every request.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Response>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
    models: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        _functions: &[FunctionDefinition],
    ) -> Result<Response, ChatError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.models.lock().unwrap().push(model.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatError::Api("no scripted response left".to_string()))
    }
}

/// Feeds fixed lines, then behaves like an operator pressing Ctrl-D.
#[derive(Clone, Default)]
pub struct ScriptedOperator {
    lines: Rc<RefCell<VecDeque<String>>>,
    reads: Rc<Cell<usize>>,
    finishes: Rc<Cell<usize>>,
    fail_on_finish: Rc<Cell<bool>>,
}

impl ScriptedOperator {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: Rc::new(RefCell::new(lines.iter().map(|l| l.to_string()).collect())),
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn finishes(&self) -> usize {
        self.finishes.get()
    }

    pub fn fail_on_finish(&self) {
        self.fail_on_finish.set(true);
    }
}

impl Operator for ScriptedOperator {
    fn read_line(&mut self) -> Result<Option<String>, ChatError> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.lines.borrow_mut().pop_front())
    }

    fn finish(&mut self) -> Result<(), ChatError> {
        self.finishes.set(self.finishes.get() + 1);
        if self.fail_on_finish.get() {
            return Err(ChatError::Input("history file is read-only".to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingScreen {
    lines: Rc<RefCell<Vec<String>>>,
    clears: Rc<Cell<usize>>,
}

impl RecordingScreen {
    pub fn clears(&self) -> usize {
        self.clears.get()
    }

    /// Everything printed so far, without styling.
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .map(|line| console::strip_ansi_codes(line).into_owned())
            .collect()
    }
}

impl Screen for RecordingScreen {
    fn clear(&mut self) -> io::Result<()> {
        self.clears.set(self.clears.get() + 1);
        Ok(())
    }

    fn print_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}

/// Returns a fixed result and records the arguments of each call.
#[derive(Clone)]
pub struct RecordingFunction {
    name: String,
    result: Value,
    calls: Arc<Mutex<Vec<Value>>>,
}

impl RecordingFunction {
    pub fn new(name: &str, result: Value) -> Self {
        Self {
            name: name.to_string(),
            result,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<Value>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Function for RecordingFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "records its calls"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn call(&self, args: Value) -> Result<Value, ChatError> {
        self.calls.lock().unwrap().push(args);
        Ok(self.result.clone())
    }
}

/// One request seen by the local completion server.
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Clone)]
struct CompletionServer {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn record_completion(
    State(server): State<CompletionServer>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    server
        .requests
        .lock()
        .unwrap()
        .push(CapturedRequest { headers, body });
    (server.status, server.body.clone())
}

/// Serves `POST /v1/chat/completions` on a free local port, answering every
/// request with `status` and `body`.
///
/// Returns the base URL to hand to a provider and the recorded requests.
pub async fn spawn_completion_server(
    status: u16,
    body: &str,
) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let server = CompletionServer {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
        requests: Arc::clone(&requests),
    };
    let router = Router::new()
        .route("/v1/chat/completions", post(record_completion))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    (format!("http://{}/v1", addr), requests)
}

pub const COMPLETION_BODY: &str = r#"{
    "id": "chatcmpl-local",
    "object": "chat.completion",
    "created": 1,
    "model": "gpt-4-0613",
    "choices": [{
        "index": 0,
        "message": {"role": "assistant", "content": "Hello from the server."},
        "finish_reason": "stop"
    }],
    "usage": {"prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8}
}"#;
