//! Message schema and the append-only conversation log.

use crate::core::error::ChatError;
use crate::display::{self, Screen};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function invocation requested by the model.
///
/// `arguments` is the serialized JSON payload exactly as the model produced it.
/// It is only parsed by the function registry at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// What a message actually carries.
///
/// A reply is either plain text or a function call. Some endpoints send text
/// alongside a function call; it is kept in `text` so nothing on the wire is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    FunctionCall { call: FunctionCall, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMessage", into = "WireMessage")]
pub struct Message {
    pub role: Role,
    pub name: Option<String>,
    pub body: MessageBody,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            name: None,
            body: MessageBody::Text(content.into()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[cfg(test)]
    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            name: None,
            body: MessageBody::FunctionCall {
                call,
                text: String::new(),
            },
        }
    }

    /// Result of a dispatched function, fed back to the model.
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            name: Some(name.into()),
            body: MessageBody::Text(content.into()),
        }
    }

    /// Textual content; empty for a bare function call.
    pub fn content(&self) -> &str {
        match &self.body {
            MessageBody::Text(text) => text,
            MessageBody::FunctionCall { text, .. } => text,
        }
    }

    pub fn function_call_ref(&self) -> Option<&FunctionCall> {
        match &self.body {
            MessageBody::FunctionCall { call, .. } => Some(call),
            MessageBody::Text(_) => None,
        }
    }
}

/// Field layout used on the wire. `content` may be absent or null there.
#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let text = wire.content.unwrap_or_default();
        let body = match wire.function_call {
            Some(call) => MessageBody::FunctionCall { call, text },
            None => MessageBody::Text(text),
        };
        Self {
            role: wire.role,
            name: wire.name,
            body,
        }
    }
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        let (content, function_call) = match message.body {
            MessageBody::Text(text) => (Some(text), None),
            MessageBody::FunctionCall { call, text } if text.is_empty() => (None, Some(call)),
            MessageBody::FunctionCall { call, text } => (Some(text), Some(call)),
        };
        Self {
            role: message.role,
            content,
            name: message.name,
            function_call,
        }
    }
}

/// The dialogue history sent to the model on every turn.
///
/// Messages are only ever appended; nothing is edited or removed.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a conversation holding only the given system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.add(Message::system(prompt));
        conversation
    }

    pub fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Prints every message in order, optionally resetting the screen first.
    pub fn render(&self, clear: bool, screen: &mut dyn Screen) -> Result<(), ChatError> {
        if clear {
            screen.clear()?;
        }
        let width = screen.width();
        for message in self.iter() {
            for line in display::format_message(message, width) {
                screen.print_line(&line)?;
            }
        }
        Ok(())
    }
}
