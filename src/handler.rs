use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use swiftaid::Tab;
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_tasks().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Alert blocks everything until dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Tabs
        KeyCode::Char('1') => app.select_tab(Tab::Text),
        KeyCode::Char('2') => app.select_tab(Tab::Summary),
        KeyCode::Tab => app.next_tab(),

        // Focus between content and chat for scrolling
        KeyCode::Char('h') | KeyCode::Left => app.focus = FocusPane::Content,
        KeyCode::Char('l') | KeyCode::Right => app.focus = FocusPane::Chat,

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Content => app.scroll_down(),
            FocusPane::Chat => app.chat_scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Content => app.scroll_up(),
            FocusPane::Chat => app.chat_scroll_up(),
        },
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('g') => app.content_scroll = 0,
        KeyCode::Char('G') => {
            app.content_scroll = app.total_content_lines.saturating_sub(app.content_height);
        }

        // Speech
        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.faster(),
        KeyCode::Char('-') => app.slower(),

        // Export
        KeyCode::Char('d') => app.download_audio(),

        // Ask a question
        KeyCode::Char('a') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.focus = FocusPane::Chat;
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_question();
            app.after_chat_message();
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat.input, app.chat_cursor);
                app.chat.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat.input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat.input, app.chat_cursor);
                app.chat.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat.input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat.input, app.chat_cursor);
            app.chat.input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use swiftaid::{ChatRole, ChatSession, Config};

    fn app_with(text: Option<&str>, summary: Option<&str>) -> App {
        let mut app = App::new(
            &Config::new(),
            text.map(str::to_string),
            summary.map(str::to_string),
        );
        app.chat = ChatSession::new(Err(anyhow!("offline")), "SwiftAid bot");
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "añb";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 5), s.len());
    }

    #[test]
    fn test_enter_on_whitespace_leaves_transcript_empty() {
        let mut app = app_with(Some("Cells"), None);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.input_mode, InputMode::Editing);

        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(app.chat.transcript().is_empty());
        assert!(!app.chat.is_pending());
    }

    #[test]
    fn test_enter_submits_question() {
        let mut app = app_with(Some("Cells"), None);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "What is ATP?");
        press(&mut app, KeyCode::Enter);

        let messages = app.chat.transcript().messages();
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].content, "What is ATP?");
        assert!(app.chat.input.is_empty());
        assert_eq!(app.chat_cursor, 0);
    }

    #[test]
    fn test_alert_swallows_keys_until_dismissed() {
        let mut app = app_with(Some("Cells"), None);
        app.alert = Some("No text available to play.".to_string());

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.tabs.active(), Tab::Text);
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        assert!(app.alert.is_none());
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.tabs.active(), Tab::Summary);
    }

    #[test]
    fn test_download_on_unloaded_tab_alerts() {
        let mut app = app_with(Some("Cells"), None);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.alert.as_deref(), Some("No active tab found."));
        assert!(app.export_task.is_none());
    }

    #[test]
    fn test_download_on_empty_pane_alerts() {
        let mut app = app_with(Some("   "), None);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.alert.as_deref(), Some("No text available to download."));
        assert!(app.export_task.is_none());
    }

    #[test]
    fn test_play_on_unloaded_tab_alerts() {
        let mut app = app_with(Some("Cells"), None);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.alert.as_deref(), Some("No active tab found."));
        assert!(!app.player.is_playing());
    }
}
