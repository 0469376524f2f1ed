use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

use super::Reply;

#[derive(Serialize)]
struct AnswerRequest<'a> {
    question: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
struct AnswerResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the server route that forwards questions with its own credential
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `paragraph` selects the server's paragraph layout instead of points
    pub async fn query(&self, prompt: &str, paragraph: bool) -> Result<Reply> {
        let url = format!("{}/generate-answer", self.base_url);

        let request = AnswerRequest {
            question: prompt,
            format: if paragraph { "paragraph" } else { "points" },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body: AnswerResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(anyhow!("Proxy error {}: {}", status, error));
        }
        if !status.is_success() {
            return Err(anyhow!("Proxy request failed with status: {}", status));
        }

        Ok(body
            .answer
            .filter(|a| !a.is_empty())
            .map(Reply::Text)
            .unwrap_or(Reply::Fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_once;

    #[tokio::test]
    async fn test_paragraph_format_and_answer() {
        let (url, request) =
            serve_once(200, "application/json", br#"{"answer":"Plants make food"}"#.to_vec()).await;
        let client = ProxyClient::new(&url);

        let reply = client.query("what is photosynthesis", true).await.unwrap();
        assert_eq!(reply, Reply::Text("Plants make food".to_string()));

        let captured = request.await.unwrap();
        assert!(captured.head.starts_with("POST /generate-answer "));
        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"question": "what is photosynthesis", "format": "paragraph"})
        );
    }

    #[tokio::test]
    async fn test_server_error_is_err() {
        let (url, _request) = serve_once(
            500,
            "application/json",
            br#"{"error":"Failed to get a response from Gemini API"}"#.to_vec(),
        )
        .await;
        let client = ProxyClient::new(&url);
        assert!(client.query("q", false).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_answer_is_fallback() {
        let (url, _request) = serve_once(200, "application/json", b"{}".to_vec()).await;
        let client = ProxyClient::new(&url);
        assert_eq!(client.query("q", false).await.unwrap(), Reply::Fallback);
    }
}
