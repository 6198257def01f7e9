//! Screen Messages
//!
//! The message log data model. Every screen owns an append-only list of
//! `MessageData` records; rendering surfaces read the list (or a filtered
//! view of it) and paint it however they like. The core never renders.
//!
//! # Design Philosophy
//!
//! Messages are a tagged union, not a bag of optional fields. Each kind
//! carries exactly the fields that kind needs, and consumers match
//! exhaustively. A renderer that doesn't understand a kind can still show
//! its searchable text; the core never probes fields that don't exist.

use serde::{Deserialize, Serialize};

/// Log severity level
///
/// The level set is fixed; [`LevelCounts`](crate::filter::LevelCounts) has
/// one bucket per level and the filter bar toggles levels by index into
/// [`LogLevel::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostic output
    Debug,
    /// Normal informational output
    Info,
    /// Something looks wrong but work continues
    Warn,
    /// Something failed
    Error,
}

impl LogLevel {
    /// All levels, in the order the filter bar presents them
    pub const ALL: [LogLevel; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Message identifier
///
/// Unique within a screen for its lifetime (the factory is in fact
/// process-global, which is stronger than required).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    ///
    /// Uses an atomic counter combined with a timestamp so ids stay unique
    /// even when many messages are created in the same millisecond.
    #[must_use]
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{}_{count}", epoch_ms()))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolution state of a loading message
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    /// The wrapped computation is still running
    #[default]
    Pending,
    /// The computation finished successfully
    Success,
    /// The computation failed
    Failed,
}

/// The kind-specific payload of a message
///
/// Consumers must match exhaustively; there is no catch-all "unknown" kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageKind {
    /// A plain log line
    Log {
        /// Severity level
        level: LogLevel,
        /// The log text
        content: String,
        /// Optional short label shown before the content
        label: Option<String>,
        /// Optional stack trace or similar detail block
        trace: Option<String>,
        /// Optional free-form rendering hint (e.g. "muted")
        variant: Option<String>,
    },
    /// A file's contents (e.g. something that was written)
    File {
        /// Path of the file
        path: String,
        /// File contents
        content: String,
    },
    /// A file operation that failed
    FileError {
        /// Path of the file
        path: String,
        /// Error text
        content: String,
    },
    /// A unified diff for a file
    Diff {
        /// Path of the file
        path: String,
        /// The diff text
        diff: String,
    },
    /// A long-running operation with deferred resolution
    Loading {
        /// What is being waited on
        content: String,
        /// Replacement text once resolved (success or failure detail)
        resolved_content: Option<String>,
        /// Current resolution state
        state: LoadingState,
    },
    /// A progress row (current/total with an optional status line)
    Progress {
        /// What is progressing
        label: String,
        /// Units completed so far
        current: u64,
        /// Total units
        total: u64,
        /// Optional status line
        status: Option<String>,
    },
    /// A group bracket
    ///
    /// Groups appear in start/end pairs: a start marker, zero or more nested
    /// messages, then an end marker with `is_end = true`. A stray end marker
    /// must be tolerated and ignored by consumers.
    Group {
        /// Group label
        label: String,
        /// Whether this is the closing marker of a group
        is_end: bool,
        /// Whether the group starts collapsed
        collapsed: bool,
    },
    /// A small table
    Table {
        /// Table title
        title: String,
        /// Column headers
        headers: Vec<String>,
        /// Rows of cell text, one inner vec per row
        rows: Vec<Vec<String>>,
    },
}

/// One entry in a screen's message log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageData {
    /// Unique message identifier
    pub id: MessageId,
    /// Creation time (Unix timestamp ms)
    pub created_at: u64,
    /// Kind-specific payload
    pub kind: MessageKind,
}

impl MessageData {
    /// Create a new message, stamping id and creation time
    #[must_use]
    pub fn new(kind: MessageKind) -> Self {
        Self {
            id: MessageId::generate(),
            created_at: epoch_ms(),
            kind,
        }
    }

    /// Shorthand for a plain log message with no label/trace/variant
    #[must_use]
    pub fn log(level: LogLevel, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Log {
            level,
            content: content.into(),
            label: None,
            trace: None,
            variant: None,
        })
    }
}

/// Partial update for a progress message
///
/// Fields left as `None` keep their current value. The original partial-merge
/// update surface is rendered as this typed patch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// New label
    pub label: Option<String>,
    /// New completed-units count
    pub current: Option<u64>,
    /// New total
    pub total: Option<u64>,
    /// New status line (`Some(None)` is not expressible; set to empty to clear)
    pub status: Option<String>,
}

/// Current time as a Unix timestamp in milliseconds
#[must_use]
pub(crate) fn epoch_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::generate();
        let id2 = MessageId::generate();
        assert_ne!(id1, id2);
        assert!(id1.0.starts_with("msg_"));
    }

    #[test]
    fn test_level_label() {
        assert_eq!(LogLevel::Warn.label(), "warn");
        assert_eq!(LogLevel::ALL.len(), 4);
    }

    #[test]
    fn test_message_new_stamps_fields() {
        let msg = MessageData::log(LogLevel::Info, "hello");
        assert!(msg.created_at > 0);
        match msg.kind {
            MessageKind::Log { level, content, .. } => {
                assert_eq!(level, LogLevel::Info);
                assert_eq!(content, "hello");
            }
            _ => panic!("expected log message"),
        }
    }
}
