pub mod gemini;
pub mod proxy;

pub use gemini::GeminiClient;
pub use proxy::ProxyClient;

use anyhow::{Result, anyhow};

use crate::config::Config;
use crate::provider::Provider;
use crate::reply;

/// Outcome of parsing a service response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Response arrived but lacked the expected fields
    Fallback,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::Fallback => reply::FALLBACK_REPLY,
        }
    }
}

/// Configured chat backend, cheap to clone into spawned tasks
#[derive(Clone)]
pub enum ChatBackend {
    Gemini { client: GeminiClient, model: String },
    Proxy(ProxyClient),
}

impl ChatBackend {
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.provider() {
            Provider::Gemini => {
                let key = config.gemini_api_key().ok_or_else(|| {
                    anyhow!("Gemini API key not configured. Set GEMINI_API_KEY or use the proxy provider.")
                })?;
                Ok(ChatBackend::Gemini {
                    client: GeminiClient::new(&key),
                    model: config.model(),
                })
            }
            Provider::Proxy => {
                let url = config.proxy_url().ok_or_else(|| {
                    anyhow!("Proxy URL not configured. Set SWIFTAID_PROXY_URL.")
                })?;
                Ok(ChatBackend::Proxy(ProxyClient::new(&url)))
            }
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ChatBackend::Gemini { .. } => Provider::Gemini,
            ChatBackend::Proxy(_) => Provider::Proxy,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ChatBackend::Gemini { model, .. } => format!("Gemini: {}", model),
            ChatBackend::Proxy(_) => Provider::Proxy.display_name().to_string(),
        }
    }

    pub async fn query(&self, prompt: &str) -> Result<Reply> {
        match self {
            ChatBackend::Gemini { client, model } => client.query(model, prompt).await,
            ChatBackend::Proxy(client) => {
                client.query(prompt, reply::wants_paragraph(prompt)).await
            }
        }
    }
}
