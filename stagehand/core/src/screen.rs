//! Screens
//!
//! A screen is one named, independent log/output stream with its own prompt
//! queue. Application code logs into it and asks questions through it; the
//! rendering adapter subscribes to its change events and reads its state to
//! paint. Screens are created and destroyed exclusively through the
//! [`ScreenManager`](crate::manager::ScreenManager), which they hold a weak
//! back-reference to for completion and focus callbacks.
//!
//! # Prompt State Machine
//!
//! idle → queued → active → resolved. At most one prompt is active per
//! screen; the queue is strictly FIFO for activation. A prompt resolves
//! exactly once — by submit, by timeout, or immediately with its default
//! when no interactive surface is bound — and is then removed from memory.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::events::{ScreenEvent, Subscribers, Subscription};
use crate::manager::{ManagerShared, RenderMode, ScreenManager};
use crate::messages::{
    epoch_ms, LoadingState, LogLevel, MessageData, MessageId, MessageKind, ProgressUpdate,
};
use crate::prompts::{
    ChoiceRequest, ConfirmRequest, InputRequest, MultiChoiceRequest, PromptData, PromptError,
    PromptHandle, PromptId, PromptKind, PromptValue,
};

// ============================================================================
// Identity & Options
// ============================================================================

/// Screen identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenId(pub String);

impl ScreenId {
    /// Generate a new unique screen ID
    #[must_use]
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("screen_{}_{count}", epoch_ms()))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenStatus {
    /// Created, nothing running yet
    Waiting,
    /// Work in flight
    Pending,
    /// Finished successfully (terminal)
    Success,
    /// Finished with an error (terminal)
    Fail,
    /// A static output stream; never transitions through completion states
    Static,
}

impl ScreenStatus {
    /// Whether this status is terminal for a non-static screen
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Static => "static",
        }
    }
}

impl std::fmt::Display for ScreenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Validated creation options for a screen
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenOptions {
    /// Display name (required)
    pub name: String,
    /// Optional sidebar icon
    pub icon: Option<String>,
    /// Initial badge count
    pub badge_count: u64,
    /// Whether the screen is hidden from the visible list
    pub hidden: bool,
    /// Whether the screen is a static output stream
    pub is_static: bool,
}

impl ScreenOptions {
    /// Options for a named screen with all defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            badge_count: 0,
            hidden: false,
            is_static: false,
        }
    }

    /// Set the sidebar icon
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the initial badge count
    #[must_use]
    pub fn with_badge_count(mut self, count: u64) -> Self {
        self.badge_count = count;
        self
    }

    /// Hide the screen from the visible list
    #[must_use]
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Mark the screen as a static output stream
    #[must_use]
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

// ============================================================================
// Screen
// ============================================================================

struct PromptEntry {
    data: PromptData,
    tx: Option<oneshot::Sender<PromptValue>>,
    timer: Option<tokio::task::JoinHandle<()>>,
}

struct ScreenState {
    status: ScreenStatus,
    badge_count: u64,
    hidden: bool,
    messages: Vec<MessageData>,
    version: u64,
    active: Option<PromptEntry>,
    queue: VecDeque<PromptEntry>,
    flushed: bool,
    completed: bool,
}

pub(crate) struct ScreenShared {
    id: ScreenId,
    name: String,
    icon: Option<String>,
    is_static: bool,
    manager: Weak<ManagerShared>,
    state: Mutex<ScreenState>,
    subscribers: Subscribers<ScreenEvent>,
}

/// A named log/output stream with its own prompt queue
///
/// `Screen` is a cheap handle; clones share the same underlying state. All
/// mutation goes through these methods — the message list and prompt queue
/// are never exposed mutably.
#[derive(Clone)]
pub struct Screen {
    shared: Arc<ScreenShared>,
}

impl Screen {
    pub(crate) fn create(options: ScreenOptions, manager: Weak<ManagerShared>) -> Self {
        let status = if options.is_static {
            ScreenStatus::Static
        } else {
            ScreenStatus::Waiting
        };
        Self {
            shared: Arc::new(ScreenShared {
                id: ScreenId::generate(),
                name: options.name,
                icon: options.icon,
                is_static: options.is_static,
                manager,
                state: Mutex::new(ScreenState {
                    status,
                    badge_count: options.badge_count,
                    hidden: options.hidden,
                    messages: Vec::new(),
                    version: 0,
                    active: None,
                    queue: VecDeque::new(),
                    flushed: false,
                    completed: false,
                }),
                subscribers: Subscribers::default(),
            }),
        }
    }

    fn manager(&self) -> Option<ScreenManager> {
        self.shared.manager.upgrade().map(ScreenManager::from_shared)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The screen's unique id
    #[must_use]
    pub fn id(&self) -> &ScreenId {
        &self.shared.id
    }

    /// The screen's display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The sidebar icon, if any
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.shared.icon.as_deref()
    }

    /// Whether this is a static output stream
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.shared.is_static
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> ScreenStatus {
        self.shared.state.lock().status
    }

    /// Current badge count
    #[must_use]
    pub fn badge_count(&self) -> u64 {
        self.shared.state.lock().badge_count
    }

    /// Whether the screen is hidden from the visible list
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.shared.state.lock().hidden
    }

    /// Monotonic version counter, bumped on every message mutation
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.state.lock().version
    }

    /// Defensive copy of the message log
    #[must_use]
    pub fn messages(&self) -> Vec<MessageData> {
        self.shared.state.lock().messages.clone()
    }

    /// Number of messages in the log
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.shared.state.lock().messages.len()
    }

    /// Copy of the active prompt, if one exists
    #[must_use]
    pub fn active_prompt(&self) -> Option<PromptData> {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .map(|e| e.data.clone())
    }

    /// Number of prompts waiting behind the active one
    #[must_use]
    pub fn queued_prompt_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Subscribe to this screen's change events
    pub fn subscribe(&self, callback: impl Fn(&ScreenEvent) + Send + Sync + 'static) -> Subscription {
        self.shared.subscribers.subscribe(callback)
    }

    // ------------------------------------------------------------------
    // Message log
    // ------------------------------------------------------------------

    /// Append a message to the log
    pub fn add_message(&self, kind: MessageKind) -> MessageId {
        let msg = MessageData::new(kind);
        let id = msg.id.clone();
        {
            let mut st = self.shared.state.lock();
            st.messages.push(msg);
            st.version += 1;
        }
        self.shared
            .subscribers
            .emit(&ScreenEvent::MessageAdded(id.clone()));
        id
    }

    /// Append a plain log line
    pub fn log(&self, level: LogLevel, content: impl Into<String>) -> MessageId {
        self.add_message(MessageKind::Log {
            level,
            content: content.into(),
            label: None,
            trace: None,
            variant: None,
        })
    }

    /// Append a labeled log line
    pub fn log_labeled(
        &self,
        level: LogLevel,
        label: impl Into<String>,
        content: impl Into<String>,
    ) -> MessageId {
        self.add_message(MessageKind::Log {
            level,
            content: content.into(),
            label: Some(label.into()),
            trace: None,
            variant: None,
        })
    }

    /// Append a debug log line
    pub fn debug(&self, content: impl Into<String>) -> MessageId {
        self.log(LogLevel::Debug, content)
    }

    /// Append an info log line
    pub fn info(&self, content: impl Into<String>) -> MessageId {
        self.log(LogLevel::Info, content)
    }

    /// Append a warn log line
    pub fn warn(&self, content: impl Into<String>) -> MessageId {
        self.log(LogLevel::Warn, content)
    }

    /// Append an error log line
    pub fn error(&self, content: impl Into<String>) -> MessageId {
        self.log(LogLevel::Error, content)
    }

    /// Append an error log line with a trace block
    pub fn error_with_trace(
        &self,
        content: impl Into<String>,
        trace: impl Into<String>,
    ) -> MessageId {
        self.add_message(MessageKind::Log {
            level: LogLevel::Error,
            content: content.into(),
            label: None,
            trace: Some(trace.into()),
            variant: None,
        })
    }

    /// Append a file message
    pub fn add_file(&self, path: impl Into<String>, content: impl Into<String>) -> MessageId {
        self.add_message(MessageKind::File {
            path: path.into(),
            content: content.into(),
        })
    }

    /// Append a file-error message
    pub fn add_file_error(&self, path: impl Into<String>, content: impl Into<String>) -> MessageId {
        self.add_message(MessageKind::FileError {
            path: path.into(),
            content: content.into(),
        })
    }

    /// Append a diff message
    pub fn add_diff(&self, path: impl Into<String>, diff: impl Into<String>) -> MessageId {
        self.add_message(MessageKind::Diff {
            path: path.into(),
            diff: diff.into(),
        })
    }

    /// Append a pending loading message
    pub fn add_loading(&self, content: impl Into<String>) -> MessageId {
        self.add_message(MessageKind::Loading {
            content: content.into(),
            resolved_content: None,
            state: LoadingState::Pending,
        })
    }

    /// Append a progress row
    pub fn add_progress(&self, label: impl Into<String>, total: u64) -> MessageId {
        self.add_message(MessageKind::Progress {
            label: label.into(),
            current: 0,
            total,
            status: None,
        })
    }

    /// Open a message group
    pub fn group_start(&self, label: impl Into<String>, collapsed: bool) -> MessageId {
        self.add_message(MessageKind::Group {
            label: label.into(),
            is_end: false,
            collapsed,
        })
    }

    /// Close a message group
    pub fn group_end(&self, label: impl Into<String>) -> MessageId {
        self.add_message(MessageKind::Group {
            label: label.into(),
            is_end: true,
            collapsed: false,
        })
    }

    /// Append a table message
    pub fn add_table(
        &self,
        title: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> MessageId {
        self.add_message(MessageKind::Table {
            title: title.into(),
            headers,
            rows,
        })
    }

    /// Mutate an existing message in place
    ///
    /// Silent no-op when the id is unknown. The closure runs under the state
    /// lock; keep it small and never call back into the screen from it.
    pub fn update_message(&self, id: &MessageId, f: impl FnOnce(&mut MessageKind)) {
        let found = {
            let mut st = self.shared.state.lock();
            match st.messages.iter_mut().find(|m| &m.id == id) {
                Some(msg) => {
                    f(&mut msg.kind);
                    st.version += 1;
                    true
                }
                None => false,
            }
        };
        if found {
            self.shared
                .subscribers
                .emit(&ScreenEvent::MessageUpdated(id.clone()));
        }
    }

    /// Apply a typed partial update to a progress message
    ///
    /// Silent no-op when the id is unknown or the target is not a progress
    /// message.
    pub fn update_progress(&self, id: &MessageId, update: ProgressUpdate) {
        let found = {
            let mut st = self.shared.state.lock();
            match st.messages.iter_mut().find(|m| &m.id == id) {
                Some(MessageData {
                    kind:
                        MessageKind::Progress {
                            label,
                            current,
                            total,
                            status,
                        },
                    ..
                }) => {
                    if let Some(new_label) = update.label {
                        *label = new_label;
                    }
                    if let Some(new_current) = update.current {
                        *current = new_current;
                    }
                    if let Some(new_total) = update.total {
                        *total = new_total;
                    }
                    if let Some(new_status) = update.status {
                        *status = Some(new_status);
                    }
                    st.version += 1;
                    true
                }
                _ => false,
            }
        };
        if found {
            self.shared
                .subscribers
                .emit(&ScreenEvent::MessageUpdated(id.clone()));
        }
    }

    /// Empty the message log
    pub fn clear(&self) {
        {
            let mut st = self.shared.state.lock();
            st.messages.clear();
            st.version += 1;
        }
        self.shared.subscribers.emit(&ScreenEvent::MessagesCleared);
    }

    /// Run a deferred computation behind a loading message
    ///
    /// Adds a pending loading message, awaits the future, then marks the
    /// message Success or Failed (with the error text) and returns the
    /// caller's result unchanged.
    pub async fn with_loading<T, E, F>(&self, content: impl Into<String>, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let id = self.add_loading(content);
        let result = fut.await;
        match &result {
            Ok(_) => self.update_message(&id, |kind| {
                if let MessageKind::Loading { state, .. } = kind {
                    *state = LoadingState::Success;
                }
            }),
            Err(e) => {
                let text = e.to_string();
                self.update_message(&id, move |kind| {
                    if let MessageKind::Loading {
                        state,
                        resolved_content,
                        ..
                    } = kind
                    {
                        *state = LoadingState::Failed;
                        *resolved_content = Some(text);
                    }
                });
            }
        }
        result
    }

    // ------------------------------------------------------------------
    // Status & flags
    // ------------------------------------------------------------------

    /// Transition the screen's status
    ///
    /// No-op for static screens, for terminal screens (Success/Fail are
    /// final), and for attempts to set `Static` after creation. The first
    /// transition into a terminal status triggers the manager's completion
    /// reordering.
    pub fn set_status(&self, status: ScreenStatus) {
        if self.shared.is_static || status == ScreenStatus::Static {
            return;
        }
        let completed_now = {
            let mut st = self.shared.state.lock();
            if st.status.is_terminal() || st.status == status {
                return;
            }
            st.status = status;
            let first_completion = status.is_terminal() && !st.completed;
            if first_completion {
                st.completed = true;
            }
            first_completion
        };
        self.shared
            .subscribers
            .emit(&ScreenEvent::StatusChanged(status));
        if let Some(manager) = self.manager() {
            if completed_now {
                manager.on_screen_completed(&self.shared.id);
            }
            manager.on_screen_state_changed();
        }
    }

    /// Set the badge count
    pub fn set_badge_count(&self, count: u64) {
        {
            let mut st = self.shared.state.lock();
            if st.badge_count == count {
                return;
            }
            st.badge_count = count;
        }
        self.shared
            .subscribers
            .emit(&ScreenEvent::BadgeChanged(count));
    }

    /// Show or hide the screen in the visible list
    pub fn set_hidden(&self, hidden: bool) {
        {
            let mut st = self.shared.state.lock();
            if st.hidden == hidden {
                return;
            }
            st.hidden = hidden;
        }
        self.shared
            .subscribers
            .emit(&ScreenEvent::VisibilityChanged(hidden));
        if let Some(manager) = self.manager() {
            manager.on_screen_visibility_changed();
        }
    }

    // ------------------------------------------------------------------
    // Prompt creation
    // ------------------------------------------------------------------

    /// Create a choice prompt on this screen
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::NoChoices`] when the request has no choices.
    pub fn prompt_choice(&self, req: ChoiceRequest) -> Result<PromptHandle, PromptError> {
        Ok(self.add_prompt(PromptData::choice(req)?))
    }

    /// Create a confirm prompt on this screen
    pub fn prompt_confirm(&self, req: ConfirmRequest) -> PromptHandle {
        self.add_prompt(PromptData::confirm(req))
    }

    /// Create an input prompt on this screen
    pub fn prompt_input(&self, req: InputRequest) -> PromptHandle {
        self.add_prompt(PromptData::input(req))
    }

    /// Create a multi-choice prompt on this screen
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::NoChoices`] when the request has no choices.
    pub fn prompt_multi_choice(
        &self,
        req: MultiChoiceRequest,
    ) -> Result<PromptHandle, PromptError> {
        Ok(self.add_prompt(PromptData::multi_choice(req)?))
    }

    /// Queue a prompt record built by the factory
    ///
    /// Resolution strategy depends on the render mode at call time: Unbound
    /// resolves immediately with the default; the stdout modes delegate to
    /// the line prompter; TuiActive enqueues for interactive handling.
    pub fn add_prompt(&self, data: PromptData) -> PromptHandle {
        let mode = self
            .manager()
            .map_or(RenderMode::Unbound, |m| m.render_mode());
        match mode {
            RenderMode::Unbound => {
                tracing::debug!(prompt = %data.id, "no surface bound; resolving prompt with default");
                PromptHandle::resolved(data.default.clone())
            }
            RenderMode::StdoutInteractive | RenderMode::StdoutFallback => {
                self.delegate_to_line(data)
            }
            RenderMode::TuiActive => self.enqueue_prompt(data),
        }
    }

    fn delegate_to_line(&self, data: PromptData) -> PromptHandle {
        let prompter = self.manager().and_then(|m| m.line_prompter());
        let runtime = tokio::runtime::Handle::try_current();
        match (prompter, runtime) {
            (Some(prompter), Ok(rt)) => {
                let (tx, rx) = oneshot::channel();
                let screen = self.clone();
                rt.spawn(async move {
                    let value = prompter.resolve(&data).await;
                    let _ = tx.send(value);
                    screen
                        .shared
                        .subscribers
                        .emit(&ScreenEvent::PromptResolved(data.id.clone()));
                });
                PromptHandle::pending(rx)
            }
            _ => {
                tracing::warn!(prompt = %data.id, "no line prompter available; resolving with default");
                PromptHandle::resolved(data.default.clone())
            }
        }
    }

    fn enqueue_prompt(&self, mut data: PromptData) -> PromptHandle {
        let (tx, rx) = oneshot::channel();
        data.timeout_started = data.timeout.map(|_| epoch_ms());
        let id = data.id.clone();
        let timeout = data.timeout;

        let activated = {
            let mut st = self.shared.state.lock();
            let entry = PromptEntry {
                data,
                tx: Some(tx),
                timer: None,
            };
            if st.active.is_none() {
                st.active = Some(entry);
                true
            } else {
                st.queue.push_back(entry);
                false
            }
        };

        if let Some(ms) = timeout {
            self.arm_timeout(&id, ms);
        }
        if activated {
            self.shared
                .subscribers
                .emit(&ScreenEvent::PromptActivated(id));
            if let Some(manager) = self.manager() {
                manager.on_screen_prompt_activated(&self.shared.id);
            }
        }
        PromptHandle::pending(rx)
    }

    /// Arm the timeout timer for a queued or active prompt
    ///
    /// The handle is stored on the prompt entry so user resolution can abort
    /// the timer.
    fn arm_timeout(&self, id: &PromptId, ms: u64) {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(prompt = %id, "prompt timeout ignored: no async runtime");
            return;
        };
        let weak = Arc::downgrade(&self.shared);
        let prompt_id = id.clone();
        let handle = rt.spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            if let Some(shared) = weak.upgrade() {
                Screen { shared }.resolve_prompt_timeout(&prompt_id);
            }
        });

        let mut st = self.shared.state.lock();
        if let Some(active) = st.active.as_mut() {
            if active.data.id == *id {
                active.timer = Some(handle);
                return;
            }
        }
        if let Some(entry) = st.queue.iter_mut().find(|e| e.data.id == *id) {
            entry.timer = Some(handle);
            return;
        }
        // Prompt already resolved before the timer could be stored.
        handle.abort();
    }

    /// Resolve a prompt with its default because its timeout fired
    ///
    /// Fires-while-queued splices the prompt out silently; fires-while-active
    /// also advances the queue.
    pub(crate) fn resolve_prompt_timeout(&self, id: &PromptId) {
        let (entry, next_activated) = {
            let mut st = self.shared.state.lock();
            if st.active.as_ref().is_some_and(|e| e.data.id == *id) {
                let entry = st.active.take();
                let next_id = match st.queue.pop_front() {
                    Some(next) => {
                        let next_id = next.data.id.clone();
                        st.active = Some(next);
                        Some(next_id)
                    }
                    None => None,
                };
                (entry, next_id)
            } else if let Some(pos) = st.queue.iter().position(|e| e.data.id == *id) {
                (st.queue.remove(pos), None)
            } else {
                (None, None)
            }
        };

        let Some(mut entry) = entry else { return };
        tracing::debug!(prompt = %id, "prompt timed out; resolving with default");
        let default = entry.data.default.clone();
        entry.data.resolved = true;
        entry.data.resolved_value = Some(default.clone());
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        if let Some(tx) = entry.tx.take() {
            let _ = tx.send(default);
        }

        self.shared
            .subscribers
            .emit(&ScreenEvent::PromptResolved(id.clone()));
        if let Some(next_id) = next_activated {
            self.shared
                .subscribers
                .emit(&ScreenEvent::PromptActivated(next_id));
            if let Some(manager) = self.manager() {
                manager.on_screen_prompt_activated(&self.shared.id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Prompt interaction
    // ------------------------------------------------------------------

    /// Mutate the active prompt; emit `PromptUpdated` when `f` reports a change
    fn mutate_active_prompt(&self, f: impl FnOnce(&mut PromptData) -> bool) -> bool {
        let changed_id = {
            let mut st = self.shared.state.lock();
            match st.active.as_mut() {
                Some(active) => {
                    if f(&mut active.data) {
                        Some(active.data.id.clone())
                    } else {
                        None
                    }
                }
                None => None,
            }
        };
        match changed_id {
            Some(id) => {
                self.shared
                    .subscribers
                    .emit(&ScreenEvent::PromptUpdated(id));
                true
            }
            None => false,
        }
    }

    /// Move the prompt cursor up (toggles a confirm)
    pub fn prompt_navigate_up(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Choice { selected, .. } => {
                *selected = selected.saturating_sub(1);
                true
            }
            PromptKind::MultiChoice { cursor, .. } => {
                *cursor = cursor.saturating_sub(1);
                true
            }
            PromptKind::Confirm { selected } => {
                *selected = !*selected;
                true
            }
            PromptKind::Input { .. } => false,
        });
    }

    /// Move the prompt cursor down (toggles a confirm)
    pub fn prompt_navigate_down(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Choice {
                choices, selected, ..
            } => {
                *selected = (*selected + 1).min(choices.len().saturating_sub(1));
                true
            }
            PromptKind::MultiChoice {
                choices, cursor, ..
            } => {
                *cursor = (*cursor + 1).min(choices.len().saturating_sub(1));
                true
            }
            PromptKind::Confirm { selected } => {
                *selected = !*selected;
                true
            }
            PromptKind::Input { .. } => false,
        });
    }

    /// Navigate left: forces a confirm to `true`; other kinds unaffected
    pub fn prompt_navigate_left(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Confirm { selected } => {
                *selected = true;
                true
            }
            _ => false,
        });
    }

    /// Navigate right: forces a confirm to `false`; other kinds unaffected
    pub fn prompt_navigate_right(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Confirm { selected } => {
                *selected = false;
                true
            }
            _ => false,
        });
    }

    /// Toggle membership of the cursor index in a multi-choice selection
    pub fn prompt_toggle_selection(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::MultiChoice {
                cursor, selected, ..
            } => {
                if !selected.remove(cursor) {
                    selected.insert(*cursor);
                }
                true
            }
            _ => false,
        });
    }

    /// Enter free-text input mode
    ///
    /// Succeeds only for a choice prompt whose selected option allows free
    /// input, or unconditionally for an input prompt (always in input mode).
    pub fn prompt_enter_input_mode(&self) -> bool {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Choice {
                choices,
                selected,
                input_mode,
                ..
            } => {
                if choices.get(*selected).is_some_and(|c| c.allows_free_input) {
                    *input_mode = true;
                    true
                } else {
                    false
                }
            }
            PromptKind::Input { .. } => true,
            _ => false,
        })
    }

    /// Leave free-text input mode on a choice prompt
    pub fn prompt_exit_input_mode(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Choice { input_mode, .. } if *input_mode => {
                *input_mode = false;
                true
            }
            _ => false,
        });
    }

    /// Type a character into the active free-text/input buffer
    pub fn prompt_input_char(&self, c: char) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Choice {
                free_text,
                input_mode,
                ..
            } if *input_mode => {
                free_text.push(c);
                true
            }
            PromptKind::Input { value } => {
                value.push(c);
                true
            }
            _ => false,
        });
    }

    /// Delete the last character of the active free-text/input buffer
    ///
    /// Silent no-op on an empty buffer.
    pub fn prompt_input_backspace(&self) {
        self.mutate_active_prompt(|data| match &mut data.kind {
            PromptKind::Choice {
                free_text,
                input_mode,
                ..
            } if *input_mode => free_text.pop().is_some(),
            PromptKind::Input { value } => value.pop().is_some(),
            _ => false,
        });
    }

    /// Whether the active prompt can be submitted right now
    #[must_use]
    pub fn can_submit_prompt(&self) -> bool {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .is_some_and(|e| e.data.can_submit())
    }

    /// Submit the active prompt
    ///
    /// No-op while [`can_submit_prompt`](Self::can_submit_prompt) is false.
    /// Otherwise resolves the prompt with its current value, clears the
    /// active slot, and activates the next queued prompt if any.
    pub fn prompt_submit(&self) {
        let (entry, next_activated) = {
            let mut st = self.shared.state.lock();
            let can = st.active.as_ref().is_some_and(|e| e.data.can_submit());
            if !can {
                return;
            }
            let entry = st.active.take();
            let next_id = match st.queue.pop_front() {
                Some(next) => {
                    let next_id = next.data.id.clone();
                    st.active = Some(next);
                    Some(next_id)
                }
                None => None,
            };
            (entry, next_id)
        };

        let Some(mut entry) = entry else { return };
        let value = entry.data.current_value();
        entry.data.resolved = true;
        entry.data.resolved_value = Some(value.clone());
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        if let Some(tx) = entry.tx.take() {
            let _ = tx.send(value);
        }

        self.shared
            .subscribers
            .emit(&ScreenEvent::PromptResolved(entry.data.id.clone()));
        if let Some(next_id) = next_activated {
            self.shared
                .subscribers
                .emit(&ScreenEvent::PromptActivated(next_id));
            if let Some(manager) = self.manager() {
                manager.on_screen_prompt_activated(&self.shared.id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Manager hooks
    // ------------------------------------------------------------------

    /// Abandon every pending prompt (the screen is being removed)
    pub(crate) fn abandon_prompts(&self) {
        let entries: Vec<PromptEntry> = {
            let mut st = self.shared.state.lock();
            st.active.take().into_iter().chain(st.queue.drain(..)).collect()
        };
        if entries.is_empty() {
            return;
        }
        tracing::debug!(
            screen = %self.shared.id,
            count = entries.len(),
            "abandoning pending prompts"
        );
        for mut entry in entries {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
            // Dropping the sender resolves the handle with Abandoned.
            drop(entry.tx.take());
        }
    }

    /// Take the flush snapshot, marking the screen flushed
    ///
    /// Returns `None` when the screen was already flushed, or when it is
    /// static and ran under a non-TUI mode (its messages streamed
    /// incrementally as they arrived).
    pub(crate) fn take_flush_snapshot(&self, prev_mode: RenderMode) -> Option<Vec<MessageData>> {
        let mut st = self.shared.state.lock();
        if st.flushed {
            return None;
        }
        st.flushed = true;
        if self.shared.is_static && prev_mode != RenderMode::TuiActive {
            return None;
        }
        Some(st.messages.clone())
    }
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ScreenManager;
    use crate::prompts::PromptChoice;

    fn screen() -> (ScreenManager, Screen) {
        let manager = ScreenManager::new();
        let screen = manager.create_screen(ScreenOptions::new("test"));
        (manager, screen)
    }

    #[test]
    fn test_add_message_bumps_version_and_emits() {
        let (_manager, screen) = screen();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = screen.subscribe(move |event| {
            if let ScreenEvent::MessageAdded(id) = event {
                seen_clone.lock().push(id.clone());
            }
        });

        let v0 = screen.version();
        let id = screen.info("hello");
        assert_eq!(screen.version(), v0 + 1);
        assert_eq!(screen.message_count(), 1);
        assert_eq!(*seen.lock(), vec![id]);
    }

    #[test]
    fn test_update_unknown_message_is_noop() {
        let (_manager, screen) = screen();
        let v0 = screen.version();
        screen.update_message(&MessageId("msg_nope".to_string()), |_| {
            panic!("closure must not run for unknown ids")
        });
        assert_eq!(screen.version(), v0);
    }

    #[test]
    fn test_update_progress_partial_merge() {
        let (_manager, screen) = screen();
        let id = screen.add_progress("copying", 10);
        screen.update_progress(
            &id,
            ProgressUpdate {
                current: Some(7),
                status: Some("7 of 10".to_string()),
                ..ProgressUpdate::default()
            },
        );

        let messages = screen.messages();
        match &messages[0].kind {
            MessageKind::Progress {
                label,
                current,
                total,
                status,
            } => {
                assert_eq!(label, "copying");
                assert_eq!(*current, 7);
                assert_eq!(*total, 10);
                assert_eq!(status.as_deref(), Some("7 of 10"));
            }
            _ => panic!("expected progress message"),
        }
    }

    #[test]
    fn test_messages_returns_defensive_copy() {
        let (_manager, screen) = screen();
        screen.info("one");
        let mut copy = screen.messages();
        copy.clear();
        assert_eq!(screen.message_count(), 1);
    }

    #[test]
    fn test_static_screen_ignores_completion() {
        let manager = ScreenManager::new();
        let screen = manager.create_screen(ScreenOptions::new("logs").with_static(true));
        assert_eq!(screen.status(), ScreenStatus::Static);
        screen.set_status(ScreenStatus::Success);
        assert_eq!(screen.status(), ScreenStatus::Static);
    }

    #[test]
    fn test_terminal_status_is_final() {
        let (_manager, screen) = screen();
        screen.set_status(ScreenStatus::Pending);
        screen.set_status(ScreenStatus::Success);
        screen.set_status(ScreenStatus::Fail);
        assert_eq!(screen.status(), ScreenStatus::Success);
    }

    #[tokio::test]
    async fn test_unbound_prompt_resolves_with_default() {
        let (_manager, screen) = screen();
        let choices = vec![PromptChoice::new("A", "a"), PromptChoice::new("B", "b")];
        let handle = screen
            .prompt_choice(ChoiceRequest::new("pick", choices).with_default("b"))
            .unwrap();
        assert_eq!(handle.await, Ok(PromptValue::Choice("b".to_string())));
    }

    #[tokio::test]
    async fn test_prompt_ops_are_noops_without_active_prompt() {
        let (_manager, screen) = screen();
        screen.prompt_navigate_up();
        screen.prompt_navigate_down();
        screen.prompt_toggle_selection();
        screen.prompt_submit();
        assert!(!screen.can_submit_prompt());
        assert!(!screen.prompt_enter_input_mode());
    }
}
