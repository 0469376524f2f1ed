use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::provider::Provider;
use crate::reply::DEFAULT_PERSONA;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_AUDIO_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub audio_server_url: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub speech_rate: Option<f32>,
    pub persona: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some("gemini".to_string()),
            model: None,
            gemini_api_key: None,
            proxy_url: None,
            audio_server_url: None,
            download_dir: None,
            speech_rate: None,
            persona: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn save_speech_rate(rate: f32) -> Result<()> {
        Self::save_speech_rate_to(&Self::get_config_path()?, rate)
    }

    /// Rewrites only the rate. A file that does not parse is left alone.
    pub fn save_speech_rate_to(config_path: &Path, rate: f32) -> Result<()> {
        let mut config = Self::load_from(config_path)?;
        config.speech_rate = Some(rate);
        config.save_to(config_path)
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Gemini)
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn persona(&self) -> String {
        self.persona.clone().unwrap_or_else(|| DEFAULT_PERSONA.to_string())
    }

    pub fn speech_rate(&self) -> f32 {
        self.speech_rate.unwrap_or(1.0)
    }

    /// Env var first, then config file. Never compiled in.
    pub fn gemini_api_key(&self) -> Option<String> {
        env_or("GEMINI_API_KEY", self.gemini_api_key.clone())
    }

    pub fn proxy_url(&self) -> Option<String> {
        env_or("SWIFTAID_PROXY_URL", self.proxy_url.clone())
    }

    pub fn audio_server_url(&self) -> String {
        env_or("SWIFTAID_AUDIO_URL", self.audio_server_url.clone())
            .unwrap_or_else(|| DEFAULT_AUDIO_SERVER.to_string())
    }

    /// Falls back to the user's download directory, then the working directory
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("swiftaid.log"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    fn app_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("swiftaid"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or(fallback)
}
