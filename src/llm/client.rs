use serde::{Deserialize, Serialize};

use super::LlmError;

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// OpenAI-compatible chat completions format (Perplexity and OpenAI both accept it)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Sends one request and returns the first choice's text verbatim.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, LlmError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            chars = request.messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", &self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), url = %self.base_url, "Chat API returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let api_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Decode(format!("invalid JSON body: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Decode("no choices[0].message.content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::error::FailureKind;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "test-model".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "X"}},
                    {"message": {"role": "assistant", "content": "Y"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new("secret", &server.uri());
        let text = client.complete(&request()).await.unwrap();
        assert_eq!(text, "X");
    }

    #[tokio::test]
    async fn test_non_200_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = LlmClient::new("secret", &server.uri());
        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Api);
        assert_eq!(err.to_string(), "Error: 403 - forbidden");
    }

    #[tokio::test]
    async fn test_other_success_codes_are_still_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_body_string("queued"))
            .mount(&server)
            .await;

        let client = LlmClient::new("secret", &server.uri());
        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Error: 202 - queued");
    }

    #[tokio::test]
    async fn test_missing_choices_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = LlmClient::new("secret", &server.uri());
        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Bind then drop a server so the port is closed.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let client = LlmClient::new("secret", &uri);
        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[test]
    fn test_temperature_omitted_when_unset() {
        let json = serde_json::to_value(request()).unwrap();
        assert!(json.get("temperature").is_none());
    }
}
