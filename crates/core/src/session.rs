//! Per-request session state owned by the operation dispatcher.

use serde::{Deserialize, Serialize};
use crate::gateway::SlideLayout;

/// One inserted slide as the dispatcher remembers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    pub position: usize,
    pub layout: SlideLayout,
    pub title: String,
    pub body: String,
}

/// Mutable record of the deck being built during one generation request.
///
/// `slide_count` always equals `slide_history.len()`; the only mutators are
/// the methods below, each of which keeps that true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    document_id: Option<String>,
    document_title: Option<String>,
    slide_count: usize,
    slide_history: Vec<SlideRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn document_title(&self) -> Option<&str> {
        self.document_title.as_deref()
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn slide_history(&self) -> &[SlideRecord] {
        &self.slide_history
    }

    pub fn is_initialized(&self) -> bool {
        self.document_id.is_some()
    }

    /// Record the document handle. Returns `false` (and changes nothing) if
    /// one is already set.
    pub fn initialize(&mut self, document_id: String, title: String) -> bool {
        if self.document_id.is_some() {
            return false;
        }
        self.document_id = Some(document_id);
        self.document_title = Some(title);
        true
    }

    /// Append a slide at the next position and return that position.
    pub fn record_slide(&mut self, layout: SlideLayout, title: String, body: String) -> usize {
        let position = self.slide_count;
        self.slide_history.push(SlideRecord {
            position,
            layout,
            title,
            body,
        });
        self.slide_count += 1;
        position
    }

    /// Update a recorded slide in place. Returns `false` for unknown positions.
    pub fn refine_slide(&mut self, position: usize, new_body: &str, new_title: Option<&str>) -> bool {
        let Some(record) = self.slide_history.get_mut(position) else {
            return false;
        };
        if let Some(title) = new_title {
            record.title = title.to_string();
        }
        record.body = new_body.to_string();
        true
    }

    /// JSON snapshot used in diagnostics and error messages.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "<unavailable>".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_only_once() {
        let mut state = SessionState::new();
        assert!(state.initialize("D1".into(), "First".into()));
        assert!(!state.initialize("D2".into(), "Second".into()));
        assert_eq!(state.document_id(), Some("D1"));
        assert_eq!(state.document_title(), Some("First"));
    }

    #[test]
    fn record_slide_keeps_count_and_history_equal() {
        let mut state = SessionState::new();
        for i in 0..4 {
            let pos = state.record_slide(SlideLayout::TitleAndBody, format!("S{i}"), String::new());
            assert_eq!(pos, i);
            assert_eq!(state.slide_count(), state.slide_history().len());
        }
        assert_eq!(state.slide_count(), 4);
    }

    #[test]
    fn refine_touches_only_target() {
        let mut state = SessionState::new();
        state.record_slide(SlideLayout::Title, "A".into(), "a".into());
        state.record_slide(SlideLayout::TitleAndBody, "B".into(), "b".into());

        assert!(state.refine_slide(1, "b2", None));
        assert_eq!(state.slide_history()[1].title, "B");
        assert_eq!(state.slide_history()[1].body, "b2");
        assert_eq!(state.slide_history()[0].body, "a");

        assert!(!state.refine_slide(7, "x", Some("X")));
    }

    #[test]
    fn snapshot_is_json() {
        let mut state = SessionState::new();
        state.initialize("D1".into(), "Deck".into());
        let snap: serde_json::Value = serde_json::from_str(&state.snapshot()).unwrap();
        assert_eq!(snap["document_id"], "D1");
        assert_eq!(snap["slide_count"], 0);
    }
}
