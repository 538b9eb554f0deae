use crate::conversation::Message;
use crate::core::error::ChatError;
use crate::functions::FunctionDefinition;
use crate::providers::base_client::HttpClient;
use crate::providers::{LlmProvider, Response};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "no_functions")]
    functions: &'a [FunctionDefinition],
}

fn no_functions(functions: &&[FunctionDefinition]) -> bool {
    functions.is_empty()
}

/// Parses a `/chat/completions` body, rejecting responses without choices.
pub fn parse_response(body: &str) -> Result<Response, ChatError> {
    let response: Response = serde_json::from_str(body)
        .map_err(|e| ChatError::MalformedResponse(format!("cannot decode completion: {}", e)))?;
    response.first_choice()?;
    Ok(response)
}

/// Any endpoint that speaks the OpenAI chat-completions protocol.
#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    client: HttpClient,
    name: String,
}

impl OpenAICompatibleProvider {
    pub fn new(
        name: &str,
        base_url: String,
        api_key: String,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            client: HttpClient::new(base_url, api_key, extra_headers)?,
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        functions: &[FunctionDefinition],
    ) -> Result<Response, ChatError> {
        let payload = ChatCompletionRequest {
            model,
            messages,
            functions,
        };
        debug!(
            provider = %self.name,
            model,
            messages = messages.len(),
            functions = functions.len(),
            "requesting completion"
        );

        let body = self.client.post_json("chat/completions", &payload).await?;
        parse_response(&body)
    }
}
