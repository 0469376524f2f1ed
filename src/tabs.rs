//! Tab state for the result page.
//!
//! Exactly one tab is active at any time. The rendering layer reads
//! [`TabSet::active`] and never stores its own copy of the selection.

use crate::error::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Text,
    Summary,
}

impl Tab {
    pub fn all() -> Vec<Tab> {
        vec![Tab::Text, Tab::Summary]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Text => "text",
            Tab::Summary => "summary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Tab::Text),
            "summary" => Some(Tab::Summary),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tab::Text => "Extracted Text",
            Tab::Summary => "Summary",
        }
    }

    /// Identifier of the content pane this tab controls
    pub fn pane_id(&self) -> &'static str {
        match self {
            Tab::Text => "text-content",
            Tab::Summary => "summary-content",
        }
    }
}

/// Text of the visible pane, input to speech playback and audio export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePane {
    pub id: &'static str,
    pub text: String,
}

impl ActivePane {
    /// Stem used both for the export request and the saved file
    pub fn audio_stem(&self) -> String {
        format!("{}-audio", self.id)
    }
}

#[derive(Debug, Clone)]
pub struct TabSet {
    active: Tab,
    text: Option<String>,
    summary: Option<String>,
}

impl TabSet {
    pub fn new(text: Option<String>, summary: Option<String>) -> Self {
        Self {
            active: Tab::Text,
            text,
            summary,
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn is_active(&self, tab: Tab) -> bool {
        self.active == tab
    }

    /// Deactivate every tab, then activate `tab`
    pub fn select(&mut self, tab: Tab) {
        self.active = tab;
    }

    pub fn next(&mut self) {
        let tabs = Tab::all();
        let i = tabs.iter().position(|t| *t == self.active).unwrap_or(0);
        self.select(tabs[(i + 1) % tabs.len()]);
    }

    pub fn content(&self, tab: Tab) -> Option<&str> {
        match tab {
            Tab::Text => self.text.as_deref(),
            Tab::Summary => self.summary.as_deref(),
        }
    }

    /// Trimmed text of the active pane. The text may be empty; callers
    /// decide which alert an empty pane maps to.
    pub fn active_pane(&self) -> Result<ActivePane, Alert> {
        let text = self.content(self.active).ok_or(Alert::NoActiveTab)?;
        Ok(ActivePane {
            id: self.active.pane_id(),
            text: text.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> TabSet {
        TabSet::new(Some("  full text  ".to_string()), Some("short".to_string()))
    }

    #[test]
    fn test_starts_on_text_tab() {
        let tabs = loaded();
        assert_eq!(tabs.active(), Tab::Text);
    }

    #[test]
    fn test_select_same_tab_twice_is_idempotent() {
        let mut once = loaded();
        once.select(Tab::Summary);

        let mut twice = loaded();
        twice.select(Tab::Summary);
        twice.select(Tab::Summary);

        assert_eq!(once.active(), twice.active());
        let active_count = Tab::all().into_iter().filter(|t| twice.is_active(*t)).count();
        assert_eq!(active_count, 1);
    }

    #[test]
    fn test_next_cycles() {
        let mut tabs = loaded();
        tabs.next();
        assert_eq!(tabs.active(), Tab::Summary);
        tabs.next();
        assert_eq!(tabs.active(), Tab::Text);
    }

    #[test]
    fn test_active_pane_is_trimmed() {
        let tabs = loaded();
        let pane = tabs.active_pane().unwrap();
        assert_eq!(pane.id, "text-content");
        assert_eq!(pane.text, "full text");
        assert_eq!(pane.audio_stem(), "text-content-audio");
    }

    #[test]
    fn test_missing_pane_alerts() {
        let mut tabs = TabSet::new(Some("text".to_string()), None);
        tabs.select(Tab::Summary);
        assert_eq!(tabs.active_pane(), Err(Alert::NoActiveTab));
    }

    #[test]
    fn test_tab_from_str() {
        assert_eq!(Tab::from_str("Summary"), Some(Tab::Summary));
        assert_eq!(Tab::from_str("audio"), None);
    }
}
