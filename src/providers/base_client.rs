use crate::core::error::ChatError;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    api_key: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Result<Self, ChatError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            extra_headers: extra_headers.unwrap_or_default(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// POSTs `payload` as JSON and returns the body of a successful response.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<String, ChatError> {
        let url = self.url(path);

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        for (key, value) in &self.extra_headers {
            request = request.header(key, value);
        }

        debug!(%url, "sending request");
        let response = request.json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(ChatError::Api(format!("{} returned {}: {}", url, status, body)));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let client = HttpClient::new("https://api.example.com/v1/".to_string(), String::new(), None)
            .unwrap();
        assert_eq!(
            client.url("/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            client.url("chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }
}
