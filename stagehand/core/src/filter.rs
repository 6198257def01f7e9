//! Message Filtering
//!
//! Pure functions that filter a message list by free-text search and enabled
//! log levels, plus the per-level counters the filter bar displays. The
//! engine holds no state of its own; [`FilterState`] is the filter bar's
//! editable state and lives on the screen manager.
//!
//! # Identity Short-Circuit
//!
//! With an empty search query and every level enabled there is no active
//! filter, and [`filter_messages`] returns `Cow::Borrowed` of the exact
//! input slice. Renderers rely on this to skip re-wrapping work when
//! nothing is filtered out.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::messages::{LogLevel, MessageData, MessageKind};

// ============================================================================
// Filter State
// ============================================================================

/// Which field of the filter bar has keyboard focus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    /// The free-text search input
    #[default]
    Search,
    /// The log-level toggle row
    Levels,
}

/// Editable state of the filter bar
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterState {
    /// Whether the filter bar is shown
    pub visible: bool,
    /// Free-text search query (case-insensitive substring match)
    pub search_query: String,
    /// Levels currently enabled; never empty by default
    pub enabled_levels: BTreeSet<LogLevel>,
    /// Which field has keyboard focus
    pub focused_field: FilterField,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            visible: false,
            search_query: String::new(),
            enabled_levels: LogLevel::ALL.into_iter().collect(),
            focused_field: FilterField::Search,
        }
    }
}

impl FilterState {
    /// Create the default state (hidden, empty query, all levels enabled)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the state filters nothing (empty query, full level set)
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.search_query.is_empty() && self.enabled_levels.len() == LogLevel::ALL.len()
    }

    /// Show or hide the filter bar
    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    /// Move focus to the search field
    pub fn focus_search(&mut self) {
        self.focused_field = FilterField::Search;
    }

    /// Move focus to the level toggles
    pub fn focus_levels(&mut self) {
        self.focused_field = FilterField::Levels;
    }

    /// Append a character to the search query
    pub fn push_search_char(&mut self, c: char) {
        self.search_query.push(c);
    }

    /// Delete the last character of the search query
    ///
    /// Silent no-op when the query is already empty.
    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
    }

    /// Toggle the level at `index` into [`LogLevel::ALL`]
    ///
    /// Out-of-range indices are ignored.
    pub fn toggle_level_at(&mut self, index: usize) {
        if let Some(level) = LogLevel::ALL.get(index) {
            self.toggle_level(*level);
        }
    }

    /// Toggle membership of a specific level
    pub fn toggle_level(&mut self, level: LogLevel) {
        if !self.enabled_levels.remove(&level) {
            self.enabled_levels.insert(level);
        }
    }

    /// Reset to the default state, keeping visibility
    pub fn reset(&mut self) {
        let visible = self.visible;
        *self = Self::default();
        self.visible = visible;
    }
}

// ============================================================================
// Level Counters
// ============================================================================

/// Fixed-shape per-level message counters
///
/// One counter per [`LogLevel`]; only log messages are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    /// Number of debug log messages
    pub debug: usize,
    /// Number of info log messages
    pub info: usize,
    /// Number of warn log messages
    pub warn: usize,
    /// Number of error log messages
    pub error: usize,
}

impl LevelCounts {
    /// The counter for a given level
    #[must_use]
    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
        }
    }

    /// Sum of all counters
    #[must_use]
    pub fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error
    }
}

/// Count messages per log level
///
/// Only `Log` messages increment a bucket; every other kind leaves the
/// counters untouched.
#[must_use]
pub fn count_by_level(messages: &[MessageData]) -> LevelCounts {
    let mut counts = LevelCounts::default();
    for msg in messages {
        if let MessageKind::Log { level, .. } = &msg.kind {
            match level {
                LogLevel::Debug => counts.debug += 1,
                LogLevel::Info => counts.info += 1,
                LogLevel::Warn => counts.warn += 1,
                LogLevel::Error => counts.error += 1,
            }
        }
    }
    counts
}

// ============================================================================
// Filtering
// ============================================================================

/// Filter a message list for display
///
/// Pass-through states return `Cow::Borrowed` of the input slice (see module
/// docs). Otherwise: log messages must be in the enabled-level set and, when
/// a query is present, match it; non-log messages pass unconditionally
/// unless a query is present, in which case their kind-specific fields are
/// searched. Matching is case-insensitive substring, OR-combined across a
/// kind's searchable fields.
#[must_use]
pub fn filter_messages<'a>(
    messages: &'a [MessageData],
    filter: &FilterState,
) -> Cow<'a, [MessageData]> {
    if filter.is_pass_through() {
        return Cow::Borrowed(messages);
    }

    let query = filter.search_query.to_lowercase();
    let filtered: Vec<MessageData> = messages
        .iter()
        .filter(|msg| match &msg.kind {
            MessageKind::Log { level, .. } => {
                filter.enabled_levels.contains(level)
                    && (query.is_empty() || matches_search(&msg.kind, &query))
            }
            _ => query.is_empty() || matches_search(&msg.kind, &query),
        })
        .cloned()
        .collect();

    Cow::Owned(filtered)
}

/// Whether any of the kind's searchable fields contains the query
///
/// `query` must already be lowercased.
fn matches_search(kind: &MessageKind, query: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(query);
    let contains_opt = |field: &Option<String>| field.as_deref().is_some_and(contains);

    match kind {
        MessageKind::Log { content, label, .. } => contains(content) || contains_opt(label),
        MessageKind::File { path, content } | MessageKind::FileError { path, content } => {
            contains(path) || contains(content)
        }
        MessageKind::Diff { path, diff } => contains(path) || contains(diff),
        MessageKind::Loading {
            content,
            resolved_content,
            ..
        } => contains(content) || contains_opt(resolved_content),
        MessageKind::Progress { label, .. } | MessageKind::Group { label, .. } => contains(label),
        MessageKind::Table {
            title,
            headers,
            rows,
        } => {
            contains(title)
                || headers.iter().any(|h| contains(h))
                || rows.iter().any(|row| row.iter().any(|cell| contains(cell)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageData;

    fn sample_messages() -> Vec<MessageData> {
        vec![
            MessageData::log(LogLevel::Info, "starting build"),
            MessageData::log(LogLevel::Error, "link failed"),
            MessageData::new(MessageKind::File {
                path: "src/main.rs".to_string(),
                content: "fn main() {}".to_string(),
            }),
            MessageData::new(MessageKind::Progress {
                label: "Compiling".to_string(),
                current: 3,
                total: 10,
                status: None,
            }),
        ]
    }

    #[test]
    fn test_pass_through_returns_borrowed() {
        let messages = sample_messages();
        let filter = FilterState::default();
        let result = filter_messages(&messages, &filter);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.len(), messages.len());
    }

    #[test]
    fn test_level_filter_drops_disabled_levels() {
        let messages = sample_messages();
        let mut filter = FilterState::default();
        filter.toggle_level(LogLevel::Error);

        let result = filter_messages(&messages, &filter);
        assert!(matches!(result, Cow::Owned(_)));
        // The error log is gone; non-log messages pass.
        assert_eq!(result.len(), 3);
        assert!(!result
            .iter()
            .any(|m| matches!(&m.kind, MessageKind::Log { level, .. } if *level == LogLevel::Error)));
    }

    #[test]
    fn test_search_is_case_insensitive_and_or_combined() {
        let messages = sample_messages();
        let filter = FilterState {
            search_query: "MAIN".to_string(),
            ..FilterState::default()
        };

        let result = filter_messages(&messages, &filter);
        // Matches the file message by path and content; logs/progress don't match.
        assert_eq!(result.len(), 1);
        assert!(matches!(&result[0].kind, MessageKind::File { .. }));
    }

    #[test]
    fn test_search_checks_progress_label() {
        let messages = sample_messages();
        let filter = FilterState {
            search_query: "compiling".to_string(),
            ..FilterState::default()
        };

        let result = filter_messages(&messages, &filter);
        assert_eq!(result.len(), 1);
        assert!(matches!(&result[0].kind, MessageKind::Progress { .. }));
    }

    #[test]
    fn test_table_search_covers_cells() {
        let messages = vec![MessageData::new(MessageKind::Table {
            title: "Summary".to_string(),
            headers: vec!["name".to_string(), "state".to_string()],
            rows: vec![vec!["api".to_string(), "healthy".to_string()]],
        })];
        let mut filter = FilterState {
            search_query: "healthy".to_string(),
            ..FilterState::default()
        };

        assert_eq!(filter_messages(&messages, &filter).len(), 1);

        filter.search_query = "absent".to_string();
        assert_eq!(filter_messages(&messages, &filter).len(), 0);
    }

    #[test]
    fn test_count_by_level_buckets() {
        let messages = sample_messages();
        let counts = count_by_level(&messages);
        assert_eq!(counts.info, 1);
        assert_eq!(counts.error, 1);
        assert_eq!(counts.debug, 0);
        assert_eq!(counts.warn, 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_toggle_level_at_out_of_range_is_noop() {
        let mut filter = FilterState::default();
        filter.toggle_level_at(99);
        assert!(filter.is_pass_through());

        filter.toggle_level_at(0);
        assert!(!filter.enabled_levels.contains(&LogLevel::Debug));
    }

    #[test]
    fn test_pop_search_char_on_empty_is_noop() {
        let mut filter = FilterState::default();
        filter.pop_search_char();
        assert_eq!(filter.search_query, "");
        filter.push_search_char('a');
        filter.pop_search_char();
        assert_eq!(filter.search_query, "");
    }
}
