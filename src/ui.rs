use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs, Wrap},
};
use swiftaid::{ChatRole, Control, Tab};
use crate::app::{App, FocusPane, InputMode};

/// Turn reply markup (`<ul>`, `<li>`, `<p>`, `<strong>`) into styled lines.
/// List items get a bullet; unknown tags are kept as literal text.
pub fn parse_reply_markup(markup: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    let mut rest = markup;

    fn flush(current: &mut String, spans: &mut Vec<Span<'static>>, bold: bool) {
        if current.is_empty() {
            return;
        }
        let text = unescape(&std::mem::take(current));
        if bold {
            spans.push(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)));
        } else {
            spans.push(Span::raw(text));
        }
    }

    fn end_line(lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>) {
        lines.push(Line::from(std::mem::take(spans)));
    }

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(end) = rest.find('>') {
                let tag = &rest[1..end];
                let known = matches!(
                    tag,
                    "ul" | "/ul" | "li" | "/li" | "p" | "/p" | "strong" | "/strong"
                );
                if known {
                    flush(&mut current, &mut spans, bold);
                    match tag {
                        "li" => spans.push(Span::styled("• ", Style::default().fg(Color::Yellow))),
                        "/li" | "/p" => end_line(&mut lines, &mut spans),
                        "strong" => bold = true,
                        "/strong" => bold = false,
                        _ => {}
                    }
                    rest = &rest[end + 1..];
                    continue;
                }
            }
        }

        if c == '\n' {
            flush(&mut current, &mut spans, bold);
            end_line(&mut lines, &mut spans);
        } else {
            current.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    flush(&mut current, &mut spans, bold);
    if !spans.is_empty() {
        end_line(&mut lines, &mut spans);
    }
    lines
}

/// Plain text of each rendered line, used for wrap/scroll estimates
pub fn markup_plain_lines(markup: &str) -> Vec<String> {
    parse_reply_markup(markup)
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
        .collect()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, tab bar, body, footer
    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tab_bar(app, frame, tabs_area);

    let [content_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(55),
        Constraint::Percentage(45),
    ])
    .areas(body_area);

    render_content(app, frame, content_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);

    if app.alert.is_some() {
        render_alert(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = app
        .status
        .as_ref()
        .map(|s| format!(" {} ", s))
        .unwrap_or_default();

    let title = Line::from(vec![
        Span::styled(" SwiftAid Results ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(status, Style::default().fg(Color::Green)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tab_bar(app: &App, frame: &mut Frame, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!(" {} {} ", i + 1, tab.display_name())))
        .collect();
    let selected = Tab::all()
        .iter()
        .position(|t| app.tabs.is_active(*t))
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
        .divider("|");
    frame.render_widget(tabs, area);
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect) {
    let active = app.tabs.active();
    let focused = app.focus == FocusPane::Content;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let playback = match app.player.visible_control() {
        Control::Play => "▶ play",
        Control::Pause => "⏸ pause",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", active.display_name()))
        .title_bottom(format!(" {} · {:.2}x ", playback, app.player.rate()));

    let text = match app.tabs.content(active) {
        Some(content) if !content.trim().is_empty() => Text::from(content.to_string()),
        Some(_) => Text::from(Span::styled(
            "This pane is empty.",
            Style::default().fg(Color::DarkGray),
        )),
        None => Text::from(Span::styled(
            format!("No {} loaded.", active.as_str()),
            Style::default().fg(Color::DarkGray),
        )),
    };

    // Store dimensions for scroll calculations (inner size minus borders)
    app.content_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    app.total_content_lines = text
        .lines
        .iter()
        .map(|l| (l.width() / inner_width + 1) as u16)
        .sum();

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll, 0));
    frame.render_widget(paragraph, area);

    if app.total_content_lines > app.content_height {
        let mut scrollbar_state = ScrollbarState::new(app.total_content_lines as usize)
            .position(app.content_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Q&A · {} ", app.chat.backend_label()));

    let transcript = app.chat.transcript();
    let pending = app.chat.is_pending();

    let chat_text = if transcript.is_empty() && !pending {
        let hint = app
            .chat
            .unavailable_reason()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "Ask a question about this material...".to_string());
        Text::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in transcript.messages() {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.content.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "SwiftAid:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(parse_reply_markup(&msg.content));
                }
            }
            lines.push(Line::default());
        }

        if pending {
            lines.push(Line::from(Span::styled(
                "SwiftAid:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            let queued = match app.chat.queued() {
                0 => String::new(),
                n => format!(" ({} queued)", n),
            };
            lines.push(Line::from(Span::styled(
                format!("Thinking{}{}", dots, queued),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    // Question input - highlight while editing
    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Question (Enter to send) ");

    let input = Paragraph::new(app.chat.input.as_str()).block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        let cursor_x = input_area.x + 1 + app.chat_cursor as u16;
        frame.set_cursor_position((cursor_x.min(input_area.right().saturating_sub(2)), input_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " RESULTS ",
        InputMode::Editing => " ASK ",
    };

    // Dark background with bright text for visibility on light and dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![Span::styled(mode_text, mode_style)];

    match app.input_mode {
        InputMode::Normal => {
            let play_label = match app.player.visible_control() {
                Control::Play => " play ",
                Control::Pause => " pause ",
            };
            hints.extend(vec![
                Span::styled(" 1/2 ", key_style),
                Span::styled(" tab ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" p ", key_style),
                Span::styled(play_label, label_style),
                Span::styled(" +/- ", key_style),
                Span::styled(" speed ", label_style),
                Span::styled(" d ", key_style),
                Span::styled(" download ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
        }
        InputMode::Editing => {
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
            ]);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_alert(app: &App, frame: &mut Frame, area: Rect) {
    let message = app.alert.as_deref().unwrap_or_default();
    let popup_area = centered_rect(area, (message.chars().count() as u16 + 6).max(30), 5);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Alert ")
        .title_bottom(" Enter to dismiss ");

    let text = Paragraph::new(Line::from(message.to_string()).centered())
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup_area);
    frame.render_widget(text, popup_area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
