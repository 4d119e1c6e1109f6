use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CompletionBackend;
use crate::error::QueryError;
use crate::sanitize::sanitize;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-1.5-pro";

const TEMPERATURE: f32 = 0.2;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Point the client at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Send one prompt and always come back with displayable text.
    pub async fn query(&self, prompt: &str) -> String {
        match self.try_query(prompt).await {
            Ok(text) => text,
            Err(e) => {
                if let QueryError::Transport(ref err) = e {
                    tracing::error!(error = %err, "error querying Gemini");
                }
                e.user_message()
            }
        }
    }

    pub async fn try_query(&self, prompt: &str) -> Result<String, QueryError> {
        tracing::debug!(prompt, "querying Gemini");
        tracing::debug!(api_key_set = !self.api_key.is_empty(), "Gemini credentials");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, GEMINI_MODEL
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let data: Value = response.json().await?;
        extract_completion(data)
    }
}

/// Pull the first candidate's first text part out of a decoded response body.
fn extract_completion(data: Value) -> Result<String, QueryError> {
    if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
        tracing::error!(%error, "Gemini API error");
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(QueryError::Backend(message));
    }

    let raw = data.to_string();
    let text = serde_json::from_value::<GeminiResponse>(data)
        .ok()
        .and_then(|r| r.candidates.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);

    match text {
        Some(text) => Ok(sanitize(&text)),
        None => {
            tracing::warn!(payload = %raw, "could not parse Gemini response");
            Err(QueryError::MalformedPayload(raw))
        }
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn complete(&self, prompt: &str) -> String {
        self.query(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MALFORMED_FALLBACK, TRANSPORT_FALLBACK};
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-pro:generateContent";

    fn success_body(text: &str) -> Value {
        serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ], "role": "model" } }
            ]
        })
    }

    async fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key").with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_success_is_sanitized() {
        let server = MockServer::start().await;
        let text = "<strong>Centurion</strong><br>Terminal 4";

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body(text)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.query("prompt").await, sanitize(text));
    }

    #[tokio::test]
    async fn test_request_shape() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [ { "parts": [ { "text": "hello lounges" } ] } ],
                "generationConfig": {
                    "temperature": 0.2,
                    "topK": 40,
                    "topP": 0.95,
                    "maxOutputTokens": 8192
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.query("hello lounges").await, "ok");
    }

    #[tokio::test]
    async fn test_backend_error_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.try_query("prompt").await.unwrap_err();
        assert!(matches!(err, QueryError::Backend(ref m) if m == "quota exceeded"));

        let text = client.query("prompt").await;
        assert!(text.contains("quota exceeded"));
        assert!(text.starts_with("Error fetching lounge information: "));
    }

    #[tokio::test]
    async fn test_missing_fields_use_malformed_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [ { "finishReason": "SAFETY" } ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.try_query("prompt").await.unwrap_err();
        assert!(matches!(err, QueryError::MalformedPayload(ref raw) if raw.contains("SAFETY")));
        assert_eq!(client.query("prompt").await, MALFORMED_FALLBACK);
    }

    #[tokio::test]
    async fn test_non_json_body_uses_transport_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.query("prompt").await, TRANSPORT_FALLBACK);
    }

    #[tokio::test]
    async fn test_unreachable_host_uses_transport_fallback() {
        // Nothing listens on port 9 on loopback.
        let client = GeminiClient::new("test-key").with_base_url("http://127.0.0.1:9");
        let err = client.try_query("prompt").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
        assert_eq!(client.query("prompt").await, TRANSPORT_FALLBACK);
    }

    #[test]
    fn test_extract_uses_first_candidate_and_part() {
        let data = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "first" }, { "text": "second" } ] } },
                { "content": { "parts": [ { "text": "other" } ] } }
            ]
        });
        assert_eq!(extract_completion(data).unwrap(), "first");
    }

    #[test]
    fn test_extract_empty_candidates_is_malformed() {
        let data = serde_json::json!({ "candidates": [] });
        assert!(matches!(extract_completion(data), Err(QueryError::MalformedPayload(_))));
    }
}
