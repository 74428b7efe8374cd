//! Gemini API client for embeddings and text generation
//!
//! One attempt per request; failures propagate to the caller.

use crate::config::Config;
use crate::error::{Result, ResumeAnalyzerError};
use crate::llm::inference::{ChatModel, InferenceConfig, InferenceResult};
use crate::processing::embeddings::{check_embeddings, Embedding, EmbeddingProvider};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Server-side limit for `batchEmbedContents`
const MAX_EMBED_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub inference: InferenceConfig,
    pub batch_size: usize,
    pub timeout: Option<Duration>,
}

impl GeminiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.provider.base_url.clone(),
            embedding_model: config.provider.embedding_model.clone(),
            chat_model: config.provider.chat_model.clone(),
            inference: InferenceConfig {
                temperature: config.provider.temperature,
                max_output_tokens: None,
            },
            batch_size: config.processing.batch_size,
            timeout: config.provider.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
    chat_model: String,
    inference: InferenceConfig,
    batch_size: usize,
}

impl GeminiClient {
    pub fn new(api_key: String, settings: GeminiSettings) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ResumeAnalyzerError::Configuration("Missing Gemini API key".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.trim().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            embedding_model: qualified_model(&settings.embedding_model),
            chat_model: qualified_model(&settings.chat_model),
            inference: settings.inference,
            batch_size: settings.batch_size.clamp(1, MAX_EMBED_BATCH),
        })
    }

    /// Resolve the credential from config/environment and build the client
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::new(api_key, GeminiSettings::from_config(config))
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model, method)
    }

    async fn post_json<B, R>(
        &self,
        url: &str,
        body: &B,
        into_error: fn(String) -> ResumeAnalyzerError,
    ) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(into_error(format!("Gemini API returned {}: {}", status, message)));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| into_error(format!("Unexpected Gemini response: {}", e)))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest::new(&self.embedding_model, text, TaskType::RetrievalDocument))
                .collect(),
        };

        let url = self.endpoint(&self.embedding_model, "batchEmbedContents");
        let response: BatchEmbedResponse = self.post_json(&url, &request, ResumeAnalyzerError::Embedding).await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

/// `text-embedding-004` -> `models/text-embedding-004`
fn qualified_model(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

impl EmbeddingProvider for GeminiClient {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let start_time = Instant::now();
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch).await?);
        }

        check_embeddings(&embeddings, texts.len())?;
        debug!("Embedded {} texts in {:.2?}", texts.len(), start_time.elapsed());
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        let request = EmbedRequest::new(&self.embedding_model, text, TaskType::RetrievalQuery);
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let response: EmbedResponse = self.post_json(&url, &request, ResumeAnalyzerError::Embedding).await?;

        if response.embedding.values.is_empty() {
            return Err(ResumeAnalyzerError::Embedding("Gemini returned an empty query embedding".to_string()));
        }
        Ok(response.embedding.values)
    }
}

impl ChatModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.chat_model
    }

    async fn generate(&self, prompt: &str) -> Result<InferenceResult> {
        let start_time = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.inference.temperature,
                max_output_tokens: self.inference.max_output_tokens,
            },
        };

        debug!("Sending {} char prompt to {}", prompt.len(), self.chat_model);
        let url = self.endpoint(&self.chat_model, "generateContent");
        let response: GenerateResponse = self.post_json(&url, &request, ResumeAnalyzerError::LlmInference).await?;

        let token_count = response
            .usage_metadata
            .as_ref()
            .map(|u| u.total_token_count)
            .unwrap_or(0);
        let text = response.into_text()?;

        Ok(InferenceResult {
            text,
            token_count,
            inference_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

impl<'a> EmbedRequest<'a> {
    fn new(model: &'a str, text: &'a str, task_type: TaskType) -> Self {
        Self {
            model,
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
            task_type,
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: usize,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated
    fn into_text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ResumeAnalyzerError::LlmInference("Gemini returned no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ResumeAnalyzerError::LlmInference("Gemini returned empty content".to_string()));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn settings() -> GeminiSettings {
        GeminiSettings::from_config(&Config::default())
    }

    /// Serves the canned `(status, body)` replies one connection at a time and
    /// hands back every request it received, headers included
    async fn stub_server(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
            requests
        });

        (base_url, handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn stub_client(base_url: String, batch_size: usize) -> GeminiClient {
        let mut settings = settings();
        settings.base_url = base_url;
        settings.batch_size = batch_size;
        let mut client = GeminiClient::new("test-key".to_string(), settings).unwrap();
        client.client = Client::builder().no_proxy().build().unwrap();
        client
    }

    #[test]
    fn test_blank_key_is_configuration_error() {
        let result = GeminiClient::new("  ".to_string(), settings());
        assert!(matches!(result, Err(ResumeAnalyzerError::Configuration(_))));
    }

    #[test]
    fn test_endpoints_use_qualified_model_names() {
        let mut settings = settings();
        settings.base_url = "https://example.test/v1beta/".to_string();
        let client = GeminiClient::new("key".to_string(), settings).unwrap();

        assert_eq!(
            client.endpoint(&client.embedding_model, "batchEmbedContents"),
            "https://example.test/v1beta/models/text-embedding-004:batchEmbedContents"
        );
        assert_eq!(
            client.endpoint(&client.chat_model, "generateContent"),
            "https://example.test/v1beta/models/gemini-2.5-flash-lite:generateContent"
        );
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let mut settings = settings();
        settings.batch_size = 1000;
        let client = GeminiClient::new("key".to_string(), settings).unwrap();
        assert_eq!(client.batch_size, MAX_EMBED_BATCH);
    }

    #[test]
    fn test_embed_request_shape() {
        let request = EmbedRequest::new("models/text-embedding-004", "Rust", TaskType::RetrievalQuery);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "models/text-embedding-004",
                "content": { "parts": [{ "text": "Rust" }] },
                "taskType": "RETRIEVAL_QUERY"
            })
        );
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
                "generationConfig": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn test_generate_response_text_joins_parts() {
        let raw = r#"{
            "candidates": [{ "content": { "parts": [{ "text": "```json\n" }, { "text": "{}\n```" }] } }],
            "usageMetadata": { "totalTokenCount": 42 }
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.usage_metadata.as_ref().unwrap().total_token_count, 42);
        assert_eq!(response.into_text().unwrap(), "```json\n{}\n```");
    }

    #[test]
    fn test_generate_response_without_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(response.into_text(), Err(ResumeAnalyzerError::LlmInference(_))));
    }

    #[test]
    fn test_batch_embed_response_parsing() {
        let raw = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let response: BatchEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_client_error_envelope_becomes_embedding_error() {
        let (base_url, server) = stub_server(vec![(
            400,
            r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#,
        )])
        .await;
        let client = stub_client(base_url, 8);

        match client.embed_query("rust").await {
            Err(ResumeAnalyzerError::Embedding(msg)) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("API key not valid"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /v1beta/models/text-embedding-004:embedContent"));
        assert!(requests[0].to_lowercase().contains("x-goog-api-key: test-key"));
    }

    #[tokio::test]
    async fn test_server_error_becomes_inference_error() {
        let (base_url, server) = stub_server(vec![(
            503,
            r#"{"error": {"code": 503, "message": "The model is overloaded", "status": "UNAVAILABLE"}}"#,
        )])
        .await;
        let client = stub_client(base_url, 8);

        match client.generate("Score this resume").await {
            Err(ResumeAnalyzerError::LlmInference(msg)) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("The model is overloaded"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_documents_embedded_in_order_across_batches() {
        let (base_url, server) = stub_server(vec![
            (200, r#"{"embeddings": [{"values": [1.0, 0.0]}]}"#),
            (200, r#"{"embeddings": [{"values": [0.0, 1.0]}]}"#),
        ])
        .await;
        let client = stub_client(base_url, 1);

        let texts = vec!["Python developer".to_string(), "Kubernetes operator".to_string()];
        let embeddings = client.embed_documents(&texts).await.unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        for (request, text) in requests.iter().zip(&texts) {
            assert!(request.starts_with("POST /v1beta/models/text-embedding-004:batchEmbedContents"));
            let body = request_body(request);
            assert_eq!(body["requests"].as_array().unwrap().len(), 1);
            assert_eq!(body["requests"][0]["content"]["parts"][0]["text"], text.as_str());
            assert_eq!(body["requests"][0]["taskType"], "RETRIEVAL_DOCUMENT");
        }
    }

    #[tokio::test]
    async fn test_short_batch_reply_is_count_mismatch() {
        let (base_url, server) = stub_server(vec![(200, r#"{"embeddings": [{"values": [0.5, 0.5]}]}"#)]).await;
        let client = stub_client(base_url, 8);

        let texts = vec!["first".to_string(), "second".to_string()];
        match client.embed_documents(&texts).await {
            Err(ResumeAnalyzerError::Embedding(msg)) => assert!(msg.contains("1 embeddings for 2 inputs")),
            other => panic!("unexpected result: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_inference_error() {
        let (base_url, server) = stub_server(vec![(200, "<html>gateway</html>")]).await;
        let client = stub_client(base_url, 8);

        match client.generate("hello").await {
            Err(ResumeAnalyzerError::LlmInference(msg)) => assert!(msg.contains("Unexpected Gemini response")),
            other => panic!("unexpected result: {:?}", other),
        }
        server.await.unwrap();
    }
}
