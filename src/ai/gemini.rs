use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

use super::Reply;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

// Response side: every field optional, the service shape is not trusted

#[derive(Deserialize, Debug, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// First candidate's first part text, or fallback
    pub fn into_reply(self) -> Reply {
        self.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .map(Reply::Text)
            .unwrap_or(Reply::Fallback)
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(GEMINI_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn query(&self, model: &str, prompt: &str) -> Result<Reply> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        // Error statuses still carry a JSON body; it has no candidates and
        // degrades to fallback like any other unexpected shape
        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Gemini API returned non-JSON body ({}): {}", status, e))?;
        if !status.is_success() {
            tracing::warn!(%status, response = %body, "Gemini API error");
        } else {
            tracing::debug!(response = %body, "Gemini response");
        }
        let parsed: GenerateResponse = serde_json::from_value(body).unwrap_or_default();
        Ok(parsed.into_reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Reply {
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap_or_default();
        parsed.into_reply()
    }

    #[test]
    fn test_well_formed_response() {
        let reply = parse(r#"{"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]}"#);
        assert_eq!(reply, Reply::Text("Hi".to_string()));
    }

    #[test]
    fn test_missing_candidates() {
        assert_eq!(parse(r#"{"promptFeedback":{}}"#), Reply::Fallback);
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(parse(r#"{"candidates":[]}"#), Reply::Fallback);
    }

    #[test]
    fn test_candidate_without_content() {
        assert_eq!(parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), Reply::Fallback);
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#), Reply::Fallback);
    }

    #[test]
    fn test_wrong_types_degrade() {
        assert_eq!(parse(r#"{"candidates":"nope"}"#), Reply::Fallback);
    }

    #[test]
    fn test_request_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: "why?".to_string() }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "why?"}]}]})
        );
    }
}
