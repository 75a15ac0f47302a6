use crate::llm::{ChatCompletionRequest, ChatMessage, LlmClient, LlmError};
use crate::strategy::{FragmentStyle, StrategyWeights};

const SYSTEM_PROMPT: &str = "You are an assistant helping teachers find publicly available content tailored to their students' learning strategies. Provide a concise summary and relevant links.";

pub struct Searcher {
    llm: LlmClient,
    model: String,
    style: FragmentStyle,
}

impl Searcher {
    pub fn new(llm: LlmClient, model: String, style: FragmentStyle) -> Self {
        Self { llm, model, style }
    }

    pub async fn search(&self, topic: &str, weights: &StrategyWeights) -> Result<String, LlmError> {
        perplexity_search(&self.llm, &self.model, topic, weights, self.style).await
    }
}

pub fn build_request(
    model: &str,
    topic: &str,
    weights: &StrategyWeights,
    style: FragmentStyle,
) -> ChatCompletionRequest {
    let strategy_prompt = weights.prompt_fragment(style);
    let user_message = format!(
        "Find educational content on '{}' tailored to the following learning strategies: {}. \
         Provide a brief summary and relevant links for each strategy with a non-zero percentage.",
        topic, strategy_prompt
    );

    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_message)],
        temperature: None,
    }
}

/// One best-effort search call. No retries.
pub async fn perplexity_search(
    llm: &LlmClient,
    model: &str,
    topic: &str,
    weights: &StrategyWeights,
    style: FragmentStyle,
) -> Result<String, LlmError> {
    let request = build_request(model, topic, weights, style);
    llm.complete(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_shape() {
        let weights = StrategyWeights::new([0, 50, 0, 0, 0]).unwrap();
        let request = build_request("m", "fractions", &weights, FragmentStyle::Ranked);

        assert_eq!(request.model, "m");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(request.messages[1].role, "user");
        assert!(request.messages[1]
            .content
            .starts_with("Find educational content on 'fractions' tailored to the following learning strategies: Incidental - Case Studies: 50%."));
    }

    #[test]
    fn test_empty_fragment_still_builds_request() {
        let weights = StrategyWeights::new([0; 5]).unwrap();
        let request = build_request("m", "volcanoes", &weights, FragmentStyle::Listed);
        assert!(request.messages[1]
            .content
            .contains("the following learning strategies: . Provide"));
    }

    #[tokio::test]
    async fn test_perplexity_search_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"model": "llama-3.1-70b-instruct"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "X"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let llm = LlmClient::new("key", &server.uri());
        let text = perplexity_search(
            &llm,
            "llama-3.1-70b-instruct",
            "photosynthesis",
            &StrategyWeights::default(),
            FragmentStyle::Ranked,
        )
        .await
        .unwrap();
        assert_eq!(text, "X");
    }

    #[tokio::test]
    async fn test_perplexity_search_formats_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let searcher = Searcher::new(
            LlmClient::new("key", &server.uri()),
            "llama-3.1-70b-instruct".to_string(),
            FragmentStyle::Listed,
        );
        let err = searcher
            .search("photosynthesis", &StrategyWeights::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: 403 - forbidden");
    }
}
