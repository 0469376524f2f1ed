//! User-facing alerts.
//!
//! Validation and export failures never propagate as errors. They surface as
//! an [`Alert`] the UI shows in a blocking popup until dismissed.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// The active tab has no loaded pane
    #[error("No active tab found.")]
    NoActiveTab,

    #[error("No text available to play.")]
    NoTextToPlay,

    #[error("No text available to download.")]
    NoTextToDownload,

    /// The speech engine could not start an utterance
    #[error("Speech is not available on this system.")]
    SpeechUnavailable,

    /// Audio endpoint returned a non-2xx status or could not be reached
    #[error("Failed to download audio.")]
    DownloadFailed,
}
