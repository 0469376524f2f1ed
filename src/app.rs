use std::path::PathBuf;

use swiftaid::{
    Alert, AudioExporter, ChatBackend, ChatRole, ChatSession, CommandSpeech, Config,
    PlaybackController, Tab, TabSet,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Content,
    Chat,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Result page
    pub tabs: TabSet,
    pub content_scroll: u16,
    pub content_height: u16,
    pub total_content_lines: u16,

    // Q&A state
    pub chat: ChatSession,
    pub chat_cursor: usize, // cursor position in chat.input
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Audio
    pub player: PlaybackController<CommandSpeech>,
    pub exporter: AudioExporter,
    pub export_task: Option<JoinHandle<Result<PathBuf, Alert>>>,

    // Blocking alert popup, dismissed with Enter/Esc
    pub alert: Option<String>,
    // Non-blocking status line message
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config, text: Option<String>, summary: Option<String>) -> Self {
        let backend = ChatBackend::from_config(config);
        let exporter = AudioExporter::new(&config.audio_server_url(), config.download_dir());

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Content,

            tabs: TabSet::new(text, summary),
            content_scroll: 0,
            content_height: 0,
            total_content_lines: 0,

            chat: ChatSession::new(backend, &config.persona()),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            player: PlaybackController::new(CommandSpeech::new(), config.speech_rate()),
            exporter,
            export_task: None,

            alert: None,
            status: None,

            animation_frame: 0,
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tabs.select(tab);
        self.content_scroll = 0;
    }

    pub fn next_tab(&mut self) {
        self.tabs.next();
        self.content_scroll = 0;
    }

    pub fn show_alert(&mut self, alert: Alert) {
        self.alert = Some(alert.to_string());
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // Q&A

    pub fn submit_question(&mut self) {
        if self.chat.submit() {
            self.chat_cursor = 0;
            self.chat.dispatch_next();
        }
    }

    // Speech

    /// Whichever of play/pause is currently shown
    pub fn toggle_playback(&mut self) {
        if self.player.is_playing() {
            self.player.pause();
        } else if let Err(alert) = self.player.play(self.tabs.active_pane()) {
            self.show_alert(alert);
        }
    }

    pub fn faster(&mut self) {
        self.player.faster();
        self.persist_rate();
    }

    pub fn slower(&mut self) {
        self.player.slower();
        self.persist_rate();
    }

    fn persist_rate(&mut self) {
        let rate = self.player.rate();
        match Config::save_speech_rate(rate) {
            Ok(()) => self.status = Some(format!("Speech rate {}x", rate)),
            Err(e) => {
                tracing::warn!("Could not save speech rate: {:#}", e);
                self.status = Some(format!("Speech rate {}x (not saved)", rate));
            }
        }
    }

    // Export

    pub fn download_audio(&mut self) {
        if self.export_task.is_some() {
            return;
        }
        let pane = match self.tabs.active_pane() {
            Ok(pane) if pane.text.is_empty() => {
                self.show_alert(Alert::NoTextToDownload);
                return;
            }
            Ok(pane) => pane,
            Err(alert) => {
                self.show_alert(alert);
                return;
            }
        };

        self.status = Some(format!("Generating {}.mp3...", pane.audio_stem()));
        let exporter = self.exporter.clone();
        self.export_task = Some(tokio::spawn(async move { exporter.download(Ok(pane)).await }));
    }

    /// Collect finished background work. Called on every event.
    pub async fn poll_tasks(&mut self) {
        self.player.refresh();

        if self.chat.poll().await {
            self.after_chat_message();
        }

        if self.export_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.export_task.take() {
                match task.await {
                    Ok(Ok(path)) => {
                        self.status = Some(format!("Saved {}", path.display()));
                    }
                    Ok(Err(alert)) => {
                        self.status = None;
                        self.show_alert(alert);
                    }
                    Err(_) => {
                        self.status = None;
                        self.show_alert(Alert::DownloadFailed);
                    }
                }
            }
        }
    }

    pub fn after_chat_message(&mut self) {
        if self.chat.take_follow_latest() {
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_pending() || self.export_task.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Content scrolling
    pub fn scroll_down(&mut self) {
        if self.content_scroll < self.total_content_lines.saturating_sub(self.content_height) {
            self.content_scroll = self.content_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.content_height / 2;
        let max_scroll = self.total_content_lines.saturating_sub(self.content_height);
        self.content_scroll = (self.content_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.content_height / 2;
        self.content_scroll = self.content_scroll.saturating_sub(half_page);
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.chat.transcript().messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "SwiftAid:")
            let rendered: Vec<String> = match msg.role {
                ChatRole::User => msg.content.lines().map(str::to_string).collect(),
                ChatRole::Assistant => crate::ui::markup_plain_lines(&msg.content),
            };
            for line in rendered {
                // Character count, not byte length, for UTF-8
                let char_count = line.chars().count();
                let wrapped = u16::try_from(char_count / wrap_width + 1).unwrap_or(u16::MAX);
                total_lines = total_lines.saturating_add(wrapped);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.chat.is_pending() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_scroll_to_bottom_saturates_on_huge_transcript() {
        let mut app = App::new(&Config::new(), Some("Cells".to_string()), None);
        app.chat = ChatSession::new(Err(anyhow!("offline")), "SwiftAid bot");
        app.chat.input = format!("{}end", "line\n".repeat(70_000));
        assert!(app.chat.submit());

        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX - 20);
    }
}
