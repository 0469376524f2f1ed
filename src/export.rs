//! Audio export of the active pane through the server's audio endpoint.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::error::Alert;
use crate::tabs::ActivePane;

#[derive(Serialize)]
struct AudioRequest<'a> {
    text: &'a str,
    filename: &'a str,
}

#[derive(Clone)]
pub struct AudioExporter {
    client: Client,
    base_url: String,
    download_dir: PathBuf,
}

impl AudioExporter {
    pub fn new(base_url: &str, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Request audio for the pane and save it as `<pane-id>-audio.mp3`.
    /// Every failure is logged and reported as an alert.
    pub async fn download(&self, pane: Result<ActivePane, Alert>) -> Result<PathBuf, Alert> {
        let pane = pane?;
        if pane.text.is_empty() {
            return Err(Alert::NoTextToDownload);
        }

        match self.fetch_and_save(&pane).await {
            Ok(path) => {
                info!(path = %path.display(), "Audio saved");
                Ok(path)
            }
            Err(e) => {
                error!("Error: {:#}", e);
                Err(Alert::DownloadFailed)
            }
        }
    }

    async fn fetch_and_save(&self, pane: &ActivePane) -> Result<PathBuf> {
        let url = format!("{}/download-audio", self.base_url);
        let stem = pane.audio_stem();

        let response = self
            .client
            .post(&url)
            .json(&AudioRequest {
                text: &pane.text,
                filename: &stem,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to generate audio file: {}", response.status()));
        }

        let audio = response.bytes().await?;
        let target = self.download_dir.join(format!("{}.mp3", stem));
        self.save(&audio, &target)?;
        Ok(target)
    }

    /// Write through a temporary file so a partial download never lands
    /// under the final name
    fn save(&self, audio: &[u8], target: &Path) -> Result<()> {
        std::fs::create_dir_all(&self.download_dir)?;
        let mut temp = tempfile::NamedTempFile::new_in(&self.download_dir)?;
        temp.write_all(audio)?;
        temp.persist(target)
            .map_err(|e| anyhow!("Failed to save {:?}: {}", target, e.error))?;
        Ok(())
    }
}
