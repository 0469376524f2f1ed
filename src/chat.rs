//! Q&A chat session: transcript, serialized submissions, reply handling.
//!
//! Submissions are queued and sent one at a time, so replies are appended in
//! the order the questions were asked.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::ai::{ChatBackend, Reply};
use crate::reply::{self, ERROR_REPLY};
use crate::state::{ChatRole, Transcript};

struct InFlight {
    prompt: String,
    task: JoinHandle<Result<Reply>>,
}

pub struct ChatSession {
    /// Contents of the question input field
    pub input: String,
    transcript: Transcript,
    queue: VecDeque<String>,
    in_flight: Option<InFlight>,
    backend: Option<ChatBackend>,
    unavailable: Option<String>,
    persona: String,
    follow_latest: bool,
}

impl ChatSession {
    pub fn new(backend: Result<ChatBackend>, persona: &str) -> Self {
        let (backend, unavailable) = match backend {
            Ok(backend) => (Some(backend), None),
            Err(e) => {
                warn!("Chat backend unavailable: {}", e);
                (None, Some(e.to_string()))
            }
        };

        Self {
            input: String::new(),
            transcript: Transcript::new(),
            queue: VecDeque::new(),
            in_flight: None,
            backend,
            unavailable,
            persona: persona.to_string(),
            follow_latest: false,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn backend_label(&self) -> String {
        match &self.backend {
            Some(backend) => backend.label(),
            None => "Q&A not configured".to_string(),
        }
    }

    /// Why the backend could not be built, if it could not
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    /// A request is in flight or waiting in the queue
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some() || !self.queue.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns true once after each appended message
    pub fn take_follow_latest(&mut self) -> bool {
        std::mem::take(&mut self.follow_latest)
    }

    /// Take the input field as a question. Whitespace-only input is ignored
    /// entirely. Returns whether anything was submitted.
    pub fn submit(&mut self) -> bool {
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return false;
        }

        self.append(ChatRole::User, question.clone());
        self.input.clear();
        self.queue.push_back(question);
        true
    }

    /// Send the oldest queued question if nothing is in flight.
    /// Must be called from within a tokio runtime.
    pub fn dispatch_next(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(prompt) = self.queue.pop_front() else {
            return;
        };

        let Some(backend) = self.backend.clone() else {
            let reason = self.unavailable.clone().unwrap_or_default();
            self.complete(&prompt, Err(anyhow!(reason)));
            return self.dispatch_next();
        };

        info!(provider = backend.provider().as_str(), "Sending question");
        let task_prompt = prompt.clone();
        let task = tokio::spawn(async move { backend.query(&task_prompt).await });
        self.in_flight = Some(InFlight { prompt, task });
    }

    /// Collect the in-flight reply if it has finished. Returns true when a
    /// message was appended.
    pub async fn poll(&mut self) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.task.is_finished());
        if finished {
            self.wait_reply().await
        } else {
            false
        }
    }

    /// Wait for the in-flight reply, then send the next queued question
    pub async fn wait_reply(&mut self) -> bool {
        let Some(InFlight { prompt, task }) = self.in_flight.take() else {
            return false;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(anyhow!("Chat task failed: {}", e)),
        };
        self.complete(&prompt, result);
        self.dispatch_next();
        true
    }

    /// Append the bot side of an exchange. Failures are logged and shown as
    /// a fixed message, never returned.
    pub fn complete(&mut self, prompt: &str, result: Result<Reply>) {
        let content = match result {
            Ok(reply) => {
                if reply == Reply::Fallback {
                    debug!("Reply had no usable candidate");
                }
                reply::format_reply(prompt, reply.text(), &self.persona)
            }
            Err(e) => {
                error!("Error: {:#}", e);
                ERROR_REPLY.to_string()
            }
        };
        self.append(ChatRole::Assistant, content);
    }

    fn append(&mut self, role: ChatRole, content: String) {
        self.transcript.push(role, content);
        self.follow_latest = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GeminiClient;
    use crate::reply::DEFAULT_PERSONA;
    use crate::testutil::serve_once;

    fn offline() -> ChatSession {
        ChatSession::new(Err(anyhow!("no backend")), DEFAULT_PERSONA)
    }

    fn gemini_at(base_url: &str) -> ChatSession {
        let backend = ChatBackend::Gemini {
            client: GeminiClient::with_base_url(base_url, "test-key"),
            model: "gemini-1.5-flash".to_string(),
        };
        ChatSession::new(Ok(backend), DEFAULT_PERSONA)
    }

    #[test]
    fn test_whitespace_submit_is_noop() {
        for input in ["", "   ", "\n\t "] {
            let mut session = offline();
            session.input = input.to_string();
            assert!(!session.submit());
            assert!(session.transcript().is_empty());
            assert!(!session.is_pending());
            assert!(!session.take_follow_latest());
            assert_eq!(session.input, input);
        }
    }

    #[test]
    fn test_submit_appends_trimmed_and_clears_input() {
        let mut session = offline();
        session.input = "  What is osmosis?  ".to_string();
        assert!(session.submit());

        let last = session.transcript().last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert_eq!(last.content, "What is osmosis?");
        assert!(session.input.is_empty());
        assert_eq!(session.queued(), 1);
        assert!(session.take_follow_latest());
    }

    #[test]
    fn test_complete_with_fallback() {
        let mut session = offline();
        session.complete("q? i want it as a para", Ok(Reply::Fallback));
        let last = session.transcript().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "<p>Sorry, I couldn't process that.</p>");
    }

    #[test]
    fn test_complete_with_error() {
        let mut session = offline();
        session.complete("q", Err(anyhow!("connection refused")));
        assert_eq!(session.transcript().last().unwrap().content, ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_missing_backend_degrades_to_error_reply() {
        let mut session = offline();
        session.input = "first".to_string();
        session.submit();
        session.input = "second".to_string();
        session.submit();
        session.dispatch_next();

        let contents: Vec<&str> = session
            .transcript()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", ERROR_REPLY, ERROR_REPLY]);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_round_trip_against_service() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"* *Cells* divide\n* I am a large language model, trained by Google."}]}}]}"#;
        let (url, request) = serve_once(200, "application/json", body.to_vec()).await;
        let mut session = gemini_at(&url);

        session.input = "How do cells grow?".to_string();
        session.submit();
        session.dispatch_next();
        assert!(session.wait_reply().await);

        let captured = request.await.unwrap();
        assert!(captured.head.starts_with("POST /v1beta/models/gemini-1.5-flash:generateContent?key=test-key"));
        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent["contents"][0]["parts"][0]["text"], "How do cells grow?");
        assert_eq!(sent["contents"][0]["role"], "user");

        let last = session.transcript().last().unwrap();
        assert_eq!(
            last.content,
            "<ul><li><strong>Cells</strong> divide</li><li>I'm SwiftAid bot</li></ul>"
        );
    }

    #[tokio::test]
    async fn test_empty_candidates_render_fallback() {
        let (url, _request) = serve_once(200, "application/json", br#"{"candidates":[]}"#.to_vec()).await;
        let mut session = gemini_at(&url);

        session.input = "anything".to_string();
        session.submit();
        session.dispatch_next();
        session.wait_reply().await;

        assert_eq!(
            session.transcript().last().unwrap().content,
            "<ul><p>Sorry, I couldn't process that.</p></ul>"
        );
    }

    #[tokio::test]
    async fn test_http_error_body_renders_fallback() {
        let body = br#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let (url, _request) = serve_once(400, "application/json", body.to_vec()).await;
        let mut session = gemini_at(&url);

        session.input = "anything".to_string();
        session.submit();
        session.dispatch_next();
        session.wait_reply().await;

        assert_eq!(
            session.transcript().last().unwrap().content,
            "<ul><p>Sorry, I couldn't process that.</p></ul>"
        );
    }

    #[tokio::test]
    async fn test_non_json_body_renders_error_reply() {
        let (url, _request) = serve_once(502, "text/html", b"<html>Bad Gateway</html>".to_vec()).await;
        let mut session = gemini_at(&url);

        session.input = "anything".to_string();
        session.submit();
        session.dispatch_next();
        session.wait_reply().await;

        assert_eq!(session.transcript().last().unwrap().content, ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_second_question_waits_for_first() {
        let (url, _request) = serve_once(200, "application/json", br#"{"candidates":[]}"#.to_vec()).await;
        let mut session = gemini_at(&url);

        session.input = "one".to_string();
        session.submit();
        session.dispatch_next();
        session.input = "two".to_string();
        session.submit();
        session.dispatch_next();

        // First request occupies the slot, second stays queued
        assert_eq!(session.queued(), 1);
    }
}
