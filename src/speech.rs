//! On-device speech playback of the active pane.
//!
//! The controller owns the single utterance handle. Starting playback always
//! cancels the previous utterance first.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::error::Alert;
use crate::tabs::ActivePane;

pub const LANGUAGE: &str = "en-US";

/// Speeds offered to the user, 1.0 is normal
pub const RATES: &[f32] = &[0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Words per minute at rate 1.0
const BASE_WPM: f32 = 175.0;

pub trait SpeechEngine {
    type Handle;

    fn speak(&mut self, text: &str, lang: &str, rate: f32) -> Result<Self::Handle>;

    fn cancel(&mut self, handle: &mut Self::Handle);

    /// Whether the utterance has stopped on its own
    fn finished(&mut self, handle: &mut Self::Handle) -> bool;
}

/// Which of the two playback buttons is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Play,
    Pause,
}

pub struct PlaybackController<E: SpeechEngine> {
    engine: E,
    current: Option<E::Handle>,
    rate: f32,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: E, rate: f32) -> Self {
        Self {
            engine,
            current: None,
            rate: nearest_rate(rate),
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn faster(&mut self) {
        self.rate = step_rate(self.rate, 1);
    }

    pub fn slower(&mut self) {
        self.rate = step_rate(self.rate, -1);
    }

    pub fn visible_control(&self) -> Control {
        if self.current.is_some() {
            Control::Pause
        } else {
            Control::Play
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Speak the active pane. Alerts leave the engine untouched.
    pub fn play(&mut self, pane: Result<ActivePane, Alert>) -> Result<(), Alert> {
        let pane = pane?;
        if pane.text.is_empty() {
            return Err(Alert::NoTextToPlay);
        }

        self.stop_current();

        match self.engine.speak(&pane.text, LANGUAGE, self.rate) {
            Ok(handle) => {
                info!(pane = pane.id, rate = self.rate, "Speech started");
                self.current = Some(handle);
                Ok(())
            }
            Err(e) => {
                warn!("Speech synthesis failed: {:#}", e);
                Err(Alert::SpeechUnavailable)
            }
        }
    }

    pub fn pause(&mut self) {
        if self.current.is_some() {
            self.stop_current();
            info!("Speech cancelled");
        }
    }

    /// Drop the handle once the engine reports the utterance done
    pub fn refresh(&mut self) {
        if let Some(handle) = self.current.as_mut() {
            if self.engine.finished(handle) {
                self.current = None;
            }
        }
    }

    fn stop_current(&mut self) {
        if let Some(mut handle) = self.current.take() {
            self.engine.cancel(&mut handle);
        }
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }
}

fn nearest_rate(rate: f32) -> f32 {
    RATES
        .iter()
        .copied()
        .min_by(|a, b| {
            (a - rate)
                .abs()
                .partial_cmp(&(b - rate).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(1.0)
}

fn step_rate(rate: f32, step: isize) -> f32 {
    let i = RATES.iter().position(|r| *r == rate).unwrap_or(2) as isize;
    let next = (i + step).clamp(0, RATES.len() as isize - 1);
    RATES[next as usize]
}

/// Speech through the platform's command-line synthesizer
pub struct CommandSpeech {
    program: &'static str,
}

impl CommandSpeech {
    pub fn new() -> Self {
        let program = if cfg!(target_os = "macos") { "say" } else { "espeak" };
        Self { program }
    }
}

impl Default for CommandSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for CommandSpeech {
    type Handle = Child;

    fn speak(&mut self, text: &str, lang: &str, rate: f32) -> Result<Child> {
        let wpm = ((BASE_WPM * rate).round() as u32).to_string();
        let mut command = Command::new(self.program);

        // Text goes in on stdin: no argv size limit, and a leading '-' is
        // never read as an option
        if self.program == "say" {
            command.args(["-r", &wpm, "-f", "-"]);
        } else {
            let voice = lang.to_lowercase();
            command.args(["-v", &voice, "-s", &wpm, "--stdin"]);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow!("Failed to start {}: {}", self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            let text = text.to_string();
            // Writer thread so a large pane never blocks the event loop
            std::thread::spawn(move || {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    warn!("Could not feed speech text: {}", e);
                }
            });
        }

        Ok(child)
    }

    fn cancel(&mut self, handle: &mut Child) {
        let _ = handle.kill();
        let _ = handle.wait();
    }

    fn finished(&mut self, handle: &mut Child) -> bool {
        !matches!(handle.try_wait(), Ok(None))
    }
}
