//! HTTP client for the generation gateway

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::GatewayError;
use super::generator::ContentGenerator;
use super::models::{
    Action, ChapterMaterialPayload, ChapterPayload, GatewayRequest, GroundedSearchPayload,
    SearchResponse, SendMessagePayload, TextResponse, TopicPayload, TranslatePayload,
    VisualResponse, WireQuizQuestion, WireSubtopic, WireTurn, validate_quiz, validate_structure,
};
use crate::course::Subtopic;
use crate::learning::{ChatMessage, Language, QuizQuestion, ResearchResult, VisualConcept};

/// Longest raw error body shown to the learner
const MAX_RAW_ERROR_LEN: usize = 300;

/// Generation gateway client
pub struct GatewayClient {
    /// HTTP client
    client: Client,
    /// Gateway URL
    endpoint: String,
    /// Optional bearer token
    token: Option<String>,
}

impl GatewayClient {
    /// Create a client for the given endpoint
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: endpoint.into(), token: None })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one action and decode the success body
    async fn call<P, T>(&self, action: Action, payload: P) -> Result<T, GatewayError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        tracing::debug!("Calling gateway action {}", action.name());

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&GatewayRequest { action, payload });

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            tracing::warn!("Gateway action {} failed ({}): {}", action.name(), status, message);
            return Err(GatewayError::ApiError { status: status.as_u16(), message });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Pull a readable message out of a failed response: the JSON `error` field if the
/// body is JSON, the raw body if it is short text, the status reason otherwise.
fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || format!("Server error: {}", status.canonical_reason().unwrap_or("Unknown"));

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value["error"].as_str().map(str::to_string).unwrap_or_else(fallback),
        Err(_) => {
            let len = body.chars().count();
            if len > 0 && len < MAX_RAW_ERROR_LEN { body.to_string() } else { fallback() }
        }
    }
}

#[async_trait]
impl ContentGenerator for GatewayClient {
    async fn chapter_content(&self, title: &str) -> Result<String, GatewayError> {
        let response: TextResponse =
            self.call(Action::GenerateChapterContent, ChapterPayload { title }).await?;
        response.into_lesson()
    }

    async fn quiz(
        &self,
        chapter_title: &str,
        chapter_content: &str,
    ) -> Result<Vec<QuizQuestion>, GatewayError> {
        let wire: Vec<WireQuizQuestion> = self
            .call(Action::GenerateQuiz, ChapterMaterialPayload { chapter_title, chapter_content })
            .await?;
        Ok(validate_quiz(wire))
    }

    async fn topic_structure(&self, topic_title: &str) -> Result<Vec<Subtopic>, GatewayError> {
        let wire: Vec<WireSubtopic> =
            self.call(Action::GenerateTopicStructure, TopicPayload { topic_title }).await?;
        validate_structure(wire)
    }

    async fn translate(&self, text: &str, language: Language) -> Result<String, GatewayError> {
        let response: TextResponse = self
            .call(Action::TranslateContent, TranslatePayload { text, language: language.code() })
            .await?;
        response.into_text()
    }

    async fn visual_concept(
        &self,
        chapter_title: &str,
        chapter_content: &str,
    ) -> Result<VisualConcept, GatewayError> {
        let response: VisualResponse = self
            .call(
                Action::GenerateVisualConcept,
                ChapterMaterialPayload { chapter_title, chapter_content },
            )
            .await?;
        response.into_concept()
    }

    async fn send_message(
        &self,
        history: &[ChatMessage],
        message: &str,
        thinking_mode: bool,
        language: Language,
    ) -> Result<String, GatewayError> {
        let payload = SendMessagePayload {
            history: history.iter().map(WireTurn::from).collect(),
            message,
            is_thinking_mode: thinking_mode,
            language: language.code(),
        };
        let response: TextResponse = self.call(Action::SendMessage, payload).await?;
        response.into_text()
    }

    async fn grounded_search(&self, query: &str) -> Result<ResearchResult, GatewayError> {
        let response: SearchResponse =
            self.call(Action::GroundedSearch, GroundedSearchPayload { query }).await?;
        response.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve a single canned HTTP response; the request body is sent back through
    /// the returned receiver
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/gateway", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];

            // Read headers, then as much body as Content-Length announces
            let request_body = loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break text[split + 4..].to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(request_body);
        });

        (url, rx)
    }

    fn client(url: &str) -> GatewayClient {
        GatewayClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn client_creation() {
        let client = client("http://localhost/gen").with_token(Some("abc".into()));
        assert_eq!(client.endpoint(), "http://localhost/gen");
        assert_eq!(client.token.as_deref(), Some("abc"));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"Quota exceeded"}"#);
        assert_eq!(msg, "Quota exceeded");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        let json_without_error = error_message(StatusCode::BAD_GATEWAY, r#"{"detail":"x"}"#);
        assert_eq!(json_without_error, "Server error: Bad Gateway");

        let long_text = "x".repeat(400);
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, &long_text),
            "Server error: Service Unavailable"
        );

        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Server error: Not Found");
    }

    #[test]
    fn error_message_uses_short_raw_text() {
        let msg = error_message(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        assert_eq!(msg, "Method Not Allowed");
    }

    #[tokio::test]
    async fn chapter_content_posts_action_envelope() {
        let (url, request) = serve_once("200 OK", r#"{"text":"Ownership explained"}"#).await;

        let text = client(&url).chapter_content("Ownership").await.unwrap();
        assert_eq!(text, "Ownership explained");

        let body: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(body["action"], "generateChapterContent");
        assert_eq!(body["payload"]["title"], "Ownership");
    }

    #[tokio::test]
    async fn translate_sends_language_code() {
        let (url, request) = serve_once("200 OK", r#"{"text":"অনুবাদ"}"#).await;

        let text = client(&url).translate("Translation", Language::Bengali).await.unwrap();
        assert_eq!(text, "অনুবাদ");

        let body: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(body["action"], "translateContent");
        assert_eq!(body["payload"]["language"], "bn");
    }

    #[tokio::test]
    async fn non_success_status_becomes_api_error() {
        let (url, _request) =
            serve_once("500 Internal Server Error", r#"{"error":"Model overloaded"}"#).await;

        let err = client(&url).chapter_content("Ownership").await.unwrap_err();
        match err {
            GatewayError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Model overloaded");
            }
            other => panic!("Expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_typed_failure() {
        let (url, _request) = serve_once("200 OK", r#"{"unexpected": true}"#).await;
        let err = client(&url).topic_structure("Rust").await.unwrap_err();
        assert!(matches!(err, GatewayError::JsonError(_)));
    }

    #[tokio::test]
    async fn quiz_filters_invalid_questions() {
        let (url, _request) = serve_once(
            "200 OK",
            r#"[{"question":"Q","options":["a","b","c","d"],"correctAnswerIndex":1,"explanation":"E"},
                {"question":"Bad","options":["a"],"correctAnswerIndex":0,"explanation":"E"}]"#,
        )
        .await;

        let questions = client(&url).quiz("Ownership", "text").await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer_index(), 1);
    }

    #[tokio::test]
    async fn send_message_posts_history_and_mode() {
        let (url, request) = serve_once("200 OK", r#"{"text":"Moves transfer ownership."}"#).await;

        let history = [ChatMessage::user("Hi"), ChatMessage::model("Hello!")];
        let reply = client(&url)
            .send_message(&history, "What is a move?", true, Language::English)
            .await
            .unwrap();
        assert_eq!(reply, "Moves transfer ownership.");

        let body: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(body["action"], "sendMessage");
        assert_eq!(body["payload"]["message"], "What is a move?");
        assert_eq!(body["payload"]["isThinkingMode"], true);
        assert_eq!(body["payload"]["language"], "en");
        assert_eq!(body["payload"]["history"][1]["role"], "model");
        assert_eq!(body["payload"]["history"][1]["parts"][0]["text"], "Hello!");
    }

    #[tokio::test]
    async fn grounded_search_returns_sources() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"text":"Found it.","citations":[{"web":{"uri":"https://doc.rust-lang.org","title":"Docs"}}]}"#,
        )
        .await;

        let result = client(&url).grounded_search("rust editions").await.unwrap();
        assert_eq!(result.text, "Found it.");
        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.citations[0].title, "Docs");

        let body: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(body["action"], "groundedSearch");
        assert_eq!(body["payload"]["query"], "rust editions");
    }
}
