use crate::conversation::Message;
use crate::core::error::ChatError;
use crate::functions::FunctionDefinition;
use async_trait::async_trait;

pub mod base_client;
pub mod factory;
pub mod openai_compatible;
pub mod types;

pub use types::{FinishReason, Response, Usage};

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Sends the whole conversation and returns the model's reply.
    ///
    /// `functions` are advertised to the model; an empty slice disables
    /// function calling for the request.
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        functions: &[FunctionDefinition],
    ) -> Result<Response, ChatError>;
}
