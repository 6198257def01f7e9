//! Screen Manager
//!
//! The manager owns the screen registry, the render-mode lifecycle, and the
//! focus/selection state for a sidebar-style screen switcher. It mediates
//! between screens and the external collaborators: the rendering adapter
//! (mounted at bind time) and the line-interface fallback for
//! non-interactive terminals.
//!
//! # Design Philosophy
//!
//! The manager is UI-agnostic. It doesn't know whether a ratatui surface, a
//! web view, or a test harness is attached; it only tracks which render mode
//! is in force and emits change events. Surfaces read state through
//! accessors and never mutate the registry directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StagehandConfig;
use crate::events::{ManagerEvent, Subscribers, Subscription};
use crate::filter::FilterState;
use crate::keyboard::KeyContext;
use crate::line::LinePrompter;
use crate::screen::{Screen, ScreenId, ScreenOptions, ScreenStatus};

/// Default auto-close delay when enabled without an explicit duration
pub const DEFAULT_AUTO_CLOSE_DELAY_MS: u64 = 5000;

// ============================================================================
// Modes, Focus & Options
// ============================================================================

/// How output is currently being presented
///
/// `Unbound` is the only mode in which no screen is ever visually presented.
/// The mode value decides prompt-resolution strategy and flush timing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
    /// No presentation at all; prompts resolve with their defaults
    #[default]
    Unbound,
    /// Non-interactive stdout streaming, requested explicitly
    StdoutInteractive,
    /// Non-interactive stdout streaming, after a failed TUI mount
    StdoutFallback,
    /// An interactive terminal surface is mounted
    TuiActive,
}

/// Which area of the switcher UI has keyboard focus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    /// The sidebar screen list
    #[default]
    Sidebar,
    /// The active screen's content
    Content,
}

/// Auto-close behavior
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoClose {
    /// Never close automatically
    #[default]
    Off,
    /// Close after [`DEFAULT_AUTO_CLOSE_DELAY_MS`] once all screens succeed
    Enabled,
    /// Close after a custom delay (milliseconds)
    DelayMs(u64),
}

impl AutoClose {
    /// The effective delay, or `None` when auto-close is off
    #[must_use]
    pub fn delay_ms(&self) -> Option<u64> {
        match self {
            Self::Off => None,
            Self::Enabled => Some(DEFAULT_AUTO_CLOSE_DELAY_MS),
            Self::DelayMs(ms) => Some(*ms),
        }
    }
}

/// Bind-time configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BindOptions {
    /// Theme name, passed through to the surface (styling is not core's job)
    pub theme: Option<String>,
    /// Auto-close behavior
    pub auto_close: AutoClose,
    /// Sidebar width in columns
    pub sidebar_width: u16,
    /// Sidebar title
    pub sidebar_title: String,
    /// Whether to attempt the interactive-terminal path
    pub use_tui: bool,
    /// Whether Ctrl+C should end the session
    pub exit_on_ctrl_c: bool,
    /// Whether the surface should enable mouse capture
    pub use_mouse: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            theme: None,
            auto_close: AutoClose::Off,
            sidebar_width: 32,
            sidebar_title: "Screens".to_string(),
            use_tui: true,
            exit_on_ctrl_c: true,
            use_mouse: false,
        }
    }
}

impl BindOptions {
    /// Build bind options from a loaded configuration file
    #[must_use]
    pub fn from_config(config: &StagehandConfig) -> Self {
        Self {
            theme: config.ui.theme.clone(),
            auto_close: if config.behavior.auto_close {
                AutoClose::DelayMs(config.behavior.auto_close_delay_ms)
            } else {
                AutoClose::Off
            },
            sidebar_width: config.ui.sidebar_width,
            sidebar_title: config.ui.sidebar_title.clone(),
            use_tui: config.behavior.use_tui,
            exit_on_ctrl_c: config.behavior.exit_on_ctrl_c,
            use_mouse: config.ui.use_mouse,
        }
    }
}

// ============================================================================
// Rendering Adapter Contract
// ============================================================================

/// Errors a render surface can report at mount time
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The terminal cannot host this surface
    #[error("surface unsupported: {0}")]
    Unsupported(String),
    /// An I/O error while taking over the terminal
    #[error("surface I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The rendering adapter, mounted at bind time
///
/// Implementations subscribe to manager/screen events inside `mount` and
/// read core state to paint. Any mount failure makes the manager fall back
/// to the stdout path.
pub trait RenderSurface: Send + Sync {
    /// Take over presentation
    ///
    /// # Errors
    ///
    /// Returns a [`SurfaceError`] when the surface cannot be established;
    /// the manager then falls back to [`RenderMode::StdoutFallback`].
    fn mount(&self, manager: &ScreenManager) -> Result<(), SurfaceError>;

    /// Release the terminal (called on unbind)
    fn unmount(&self);
}

/// Diagnostic snapshot of the manager's state
#[derive(Clone, Debug, Serialize)]
pub struct ManagerSummary {
    /// Total number of screens (including hidden)
    pub screen_count: usize,
    /// Number of visible screens
    pub visible_count: usize,
    /// The active screen, if any
    pub active: Option<ScreenId>,
    /// Current render mode
    pub render_mode: RenderMode,
    /// Current focus area
    pub focus: FocusArea,
    /// Current sidebar selection index
    pub selected_index: usize,
}

// ============================================================================
// Manager
// ============================================================================

struct ManagerState {
    screens: HashMap<ScreenId, Screen>,
    order: Vec<ScreenId>,
    active: Option<ScreenId>,
    render_mode: RenderMode,
    focus: FocusArea,
    selected_index: usize,
    filter: FilterState,
    options: BindOptions,
    surface: Option<Arc<dyn RenderSurface>>,
    line: Option<Arc<dyn LinePrompter>>,
    auto_close_timer: Option<tokio::task::JoinHandle<()>>,
}

impl ManagerState {
    /// Visible screen ids in current order
    fn visible_ids(&self) -> Vec<ScreenId> {
        self.order
            .iter()
            .filter(|id| self.screens.get(id).is_some_and(|s| !s.is_hidden()))
            .cloned()
            .collect()
    }
}

pub(crate) struct ManagerShared {
    state: Mutex<ManagerState>,
    subscribers: Subscribers<ManagerEvent>,
}

/// The screen registry and session orchestrator
///
/// `ScreenManager` is a cheap handle; clones share the same underlying
/// state. Screens are created and destroyed exclusively through it.
#[derive(Clone)]
pub struct ScreenManager {
    shared: Arc<ManagerShared>,
}

impl Default for ScreenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenManager {
    /// Create a manager with no screens, in [`RenderMode::Unbound`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                state: Mutex::new(ManagerState {
                    screens: HashMap::new(),
                    order: Vec::new(),
                    active: None,
                    render_mode: RenderMode::Unbound,
                    focus: FocusArea::Sidebar,
                    selected_index: 0,
                    filter: FilterState::default(),
                    options: BindOptions::default(),
                    surface: None,
                    line: None,
                    auto_close_timer: None,
                }),
                subscribers: Subscribers::default(),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<ManagerShared>) -> Self {
        Self { shared }
    }

    /// Install the line-interface fallback used by the stdout render modes
    pub fn set_line_prompter(&self, prompter: Arc<dyn LinePrompter>) {
        self.shared.state.lock().line = Some(prompter);
    }

    pub(crate) fn line_prompter(&self) -> Option<Arc<dyn LinePrompter>> {
        self.shared.state.lock().line.clone()
    }

    /// Subscribe to manager change events
    pub fn subscribe(
        &self,
        callback: impl Fn(&ManagerEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.subscribers.subscribe(callback)
    }

    fn emit_all(&self, events: &[ManagerEvent]) {
        for event in events {
            self.shared.subscribers.emit(event);
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Create a screen and register it
    ///
    /// The new screen becomes active when no active screen exists yet and
    /// the screen is not hidden.
    pub fn create_screen(&self, options: ScreenOptions) -> Screen {
        let hidden = options.hidden;
        let screen = Screen::create(options, Arc::downgrade(&self.shared));
        let id = screen.id().clone();

        let mut events = vec![ManagerEvent::ScreenAdded(id.clone())];
        {
            let mut st = self.shared.state.lock();
            st.screens.insert(id.clone(), screen.clone());
            st.order.push(id.clone());
            if st.active.is_none() && !hidden {
                st.active = Some(id.clone());
                events.push(ManagerEvent::ActiveChanged(Some(id)));
            }
        }
        self.emit_all(&events);
        // A new waiting screen can disqualify a pending auto-close.
        self.recompute_auto_close();
        screen
    }

    /// Remove a screen from the registry
    ///
    /// Abandons any pending prompts on it. If it was active, the first
    /// remaining visible screen becomes active. Silent no-op for unknown
    /// ids.
    pub fn remove_screen(&self, id: &ScreenId) {
        let (removed, events) = {
            let mut st = self.shared.state.lock();
            let Some(screen) = st.screens.remove(id) else {
                return;
            };
            st.order.retain(|s| s != id);
            let mut events = vec![ManagerEvent::ScreenRemoved(id.clone())];

            if st.active.as_ref() == Some(id) {
                let next = st.visible_ids().first().cloned();
                st.active.clone_from(&next);
                events.push(ManagerEvent::ActiveChanged(next));
            }

            let visible_len = st.visible_ids().len();
            let clamped = st.selected_index.min(visible_len.saturating_sub(1));
            if clamped != st.selected_index {
                st.selected_index = clamped;
                events.push(ManagerEvent::SelectionChanged(clamped));
            }
            (screen, events)
        };

        removed.abandon_prompts();
        self.emit_all(&events);
        self.recompute_auto_close();
    }

    /// Visible screens, in current order
    #[must_use]
    pub fn screens(&self) -> Vec<Screen> {
        let st = self.shared.state.lock();
        st.visible_ids()
            .iter()
            .filter_map(|id| st.screens.get(id).cloned())
            .collect()
    }

    /// Every screen (hidden included), in current order
    #[must_use]
    pub fn all_screens(&self) -> Vec<Screen> {
        let st = self.shared.state.lock();
        st.order
            .iter()
            .filter_map(|id| st.screens.get(id).cloned())
            .collect()
    }

    /// Look up a screen by id
    #[must_use]
    pub fn screen(&self, id: &ScreenId) -> Option<Screen> {
        self.shared.state.lock().screens.get(id).cloned()
    }

    /// The active screen's id
    #[must_use]
    pub fn active_screen_id(&self) -> Option<ScreenId> {
        self.shared.state.lock().active.clone()
    }

    /// The active screen
    #[must_use]
    pub fn active_screen(&self) -> Option<Screen> {
        let st = self.shared.state.lock();
        st.active.as_ref().and_then(|id| st.screens.get(id).cloned())
    }

    /// Diagnostic snapshot
    #[must_use]
    pub fn summary(&self) -> ManagerSummary {
        let st = self.shared.state.lock();
        ManagerSummary {
            screen_count: st.order.len(),
            visible_count: st.visible_ids().len(),
            active: st.active.clone(),
            render_mode: st.render_mode,
            focus: st.focus,
            selected_index: st.selected_index,
        }
    }

    // ------------------------------------------------------------------
    // Render mode lifecycle
    // ------------------------------------------------------------------

    /// Current render mode
    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.shared.state.lock().render_mode
    }

    /// Current bind options
    #[must_use]
    pub fn bind_options(&self) -> BindOptions {
        self.shared.state.lock().options.clone()
    }

    /// Bind a presentation path
    ///
    /// An explicit non-interactive request (`use_tui = false`) yields
    /// [`RenderMode::StdoutInteractive`]. Otherwise the surface is mounted;
    /// success yields [`RenderMode::TuiActive`] and any failure (or a
    /// missing surface) falls back to [`RenderMode::StdoutFallback`].
    pub fn bind(
        &self,
        options: BindOptions,
        surface: Option<Arc<dyn RenderSurface>>,
    ) -> RenderMode {
        let (mode, mounted) = if options.use_tui {
            match surface {
                Some(surface) => match surface.mount(self) {
                    Ok(()) => (RenderMode::TuiActive, Some(surface)),
                    Err(e) => {
                        tracing::warn!(error = %e, "TUI mount failed; falling back to stdout");
                        (RenderMode::StdoutFallback, None)
                    }
                },
                None => {
                    tracing::warn!("no render surface provided; falling back to stdout");
                    (RenderMode::StdoutFallback, None)
                }
            }
        } else {
            (RenderMode::StdoutInteractive, None)
        };

        {
            let mut st = self.shared.state.lock();
            st.options = options;
            st.render_mode = mode;
            st.surface = mounted;
        }
        self.shared
            .subscribers
            .emit(&ManagerEvent::RenderModeChanged(mode));
        self.recompute_auto_close();
        mode
    }

    /// Unbind and return to [`RenderMode::Unbound`]
    ///
    /// Unmounts any surface and flushes every screen that has not been
    /// flushed yet (each at most once; see
    /// [`ManagerEvent::ScreenFlushed`]).
    pub fn unbind(&self) {
        let (prev, surface, timer, screens) = {
            let mut st = self.shared.state.lock();
            let prev = st.render_mode;
            if prev == RenderMode::Unbound {
                return;
            }
            st.render_mode = RenderMode::Unbound;
            let surface = st.surface.take();
            let timer = st.auto_close_timer.take();
            let screens: Vec<Screen> = st
                .order
                .iter()
                .filter_map(|id| st.screens.get(id).cloned())
                .collect();
            (prev, surface, timer, screens)
        };

        if let Some(timer) = timer {
            timer.abort();
        }
        if let Some(surface) = surface {
            surface.unmount();
        }
        for screen in &screens {
            if let Some(messages) = screen.take_flush_snapshot(prev) {
                self.shared.subscribers.emit(&ManagerEvent::ScreenFlushed {
                    id: screen.id().clone(),
                    messages,
                });
            }
        }
        self.shared
            .subscribers
            .emit(&ManagerEvent::RenderModeChanged(RenderMode::Unbound));
    }

    /// Unbind and announce the end of the session
    pub fn shutdown(&self) {
        self.unbind();
        self.shared
            .subscribers
            .emit(&ManagerEvent::ShutdownRequested);
    }

    // ------------------------------------------------------------------
    // Focus & selection
    // ------------------------------------------------------------------

    /// Current focus area
    #[must_use]
    pub fn focus_area(&self) -> FocusArea {
        self.shared.state.lock().focus
    }

    /// Current sidebar selection index (into the visible list)
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.shared.state.lock().selected_index
    }

    /// Flip focus between sidebar and content
    pub fn toggle_focus(&self) {
        let focus = {
            let mut st = self.shared.state.lock();
            st.focus = match st.focus {
                FocusArea::Sidebar => FocusArea::Content,
                FocusArea::Content => FocusArea::Sidebar,
            };
            st.focus
        };
        self.shared
            .subscribers
            .emit(&ManagerEvent::FocusChanged(focus));
    }

    /// Move the sidebar selection up
    pub fn navigate_up(&self) {
        self.move_selection(-1);
    }

    /// Move the sidebar selection down
    pub fn navigate_down(&self) {
        self.move_selection(1);
    }

    fn move_selection(&self, delta: i32) {
        let changed = {
            let mut st = self.shared.state.lock();
            let visible = st.visible_ids();
            if visible.is_empty() {
                return;
            }
            let max = visible.len() - 1;
            let current = st.selected_index.min(max);
            let next = if delta < 0 {
                current.saturating_sub(1)
            } else {
                (current + 1).min(max)
            };
            if next == st.selected_index {
                None
            } else {
                st.selected_index = next;
                Some(next)
            }
        };
        if let Some(index) = changed {
            self.shared
                .subscribers
                .emit(&ManagerEvent::SelectionChanged(index));
        }
    }

    /// Make the selected sidebar entry the active screen and focus content
    pub fn select_current(&self) {
        let events = {
            let mut st = self.shared.state.lock();
            let visible = st.visible_ids();
            let Some(id) = visible.get(st.selected_index).cloned() else {
                return;
            };
            let mut events = Vec::new();
            if st.active.as_ref() != Some(&id) {
                st.active = Some(id.clone());
                events.push(ManagerEvent::ActiveChanged(Some(id)));
            }
            if st.focus != FocusArea::Content {
                st.focus = FocusArea::Content;
                events.push(ManagerEvent::FocusChanged(FocusArea::Content));
            }
            events
        };
        self.emit_all(&events);
    }

    // ------------------------------------------------------------------
    // Filter bar
    // ------------------------------------------------------------------

    /// Copy of the filter bar state
    #[must_use]
    pub fn filter(&self) -> FilterState {
        self.shared.state.lock().filter.clone()
    }

    /// Mutate the filter bar state
    pub fn with_filter(&self, f: impl FnOnce(&mut FilterState)) {
        {
            let mut st = self.shared.state.lock();
            f(&mut st.filter);
        }
        self.shared.subscribers.emit(&ManagerEvent::FilterChanged);
    }

    // ------------------------------------------------------------------
    // Keyboard context
    // ------------------------------------------------------------------

    /// Snapshot of the state keyboard bindings condition on
    #[must_use]
    pub fn key_context(&self) -> KeyContext {
        let (focus, filter_visible, active) = {
            let st = self.shared.state.lock();
            let active = st.active.as_ref().and_then(|id| st.screens.get(id).cloned());
            (st.focus, st.filter.visible, active)
        };
        let prompt = active.and_then(|screen| screen.active_prompt());
        KeyContext {
            focus,
            has_active_prompt: prompt.is_some(),
            prompt_kind: prompt.as_ref().map(crate::prompts::PromptData::kind_tag),
            input_mode: prompt.as_ref().is_some_and(crate::prompts::PromptData::in_input_mode),
            filter_visible,
        }
    }

    // ------------------------------------------------------------------
    // Screen hooks
    // ------------------------------------------------------------------

    /// A screen completed for the first time: move it behind in-flight ones
    pub(crate) fn on_screen_completed(&self, id: &ScreenId) {
        let changed = {
            let mut st = self.shared.state.lock();
            match st.order.iter().position(|s| s == id) {
                Some(pos) => {
                    let sid = st.order.remove(pos);
                    st.order.push(sid);
                    true
                }
                None => false,
            }
        };
        if changed {
            self.shared.subscribers.emit(&ManagerEvent::OrderChanged);
        }
    }

    /// Any screen status change: re-evaluate auto-close
    pub(crate) fn on_screen_state_changed(&self) {
        self.recompute_auto_close();
    }

    /// A screen's hidden flag changed: keep the selection in range
    pub(crate) fn on_screen_visibility_changed(&self) {
        let changed = {
            let mut st = self.shared.state.lock();
            let visible_len = st.visible_ids().len();
            let clamped = st.selected_index.min(visible_len.saturating_sub(1));
            if clamped == st.selected_index {
                None
            } else {
                st.selected_index = clamped;
                Some(clamped)
            }
        };
        if let Some(index) = changed {
            self.shared
                .subscribers
                .emit(&ManagerEvent::SelectionChanged(index));
        }
    }

    /// A prompt became active on a screen: focus follows the prompt
    pub(crate) fn on_screen_prompt_activated(&self, id: &ScreenId) {
        let events = {
            let mut st = self.shared.state.lock();
            if !st.screens.contains_key(id) {
                return;
            }
            let mut events = Vec::new();
            if st.focus != FocusArea::Content {
                st.focus = FocusArea::Content;
                events.push(ManagerEvent::FocusChanged(FocusArea::Content));
            }
            if st.active.as_ref() != Some(id) {
                st.active = Some(id.clone());
                events.push(ManagerEvent::ActiveChanged(Some(id.clone())));
            }
            if let Some(pos) = st.visible_ids().iter().position(|s| s == id) {
                if st.selected_index != pos {
                    st.selected_index = pos;
                    events.push(ManagerEvent::SelectionChanged(pos));
                }
            }
            events
        };
        self.emit_all(&events);
    }

    // ------------------------------------------------------------------
    // Auto-close
    // ------------------------------------------------------------------

    /// Re-evaluate the auto-close condition and (re)arm or cancel the timer
    ///
    /// The condition: every non-static screen is in `Success` (trivially
    /// satisfied when no non-static screens exist). The delay restarts on
    /// every qualifying state change.
    fn recompute_auto_close(&self) {
        let (delay, screens) = {
            let st = self.shared.state.lock();
            (
                st.options.auto_close.delay_ms(),
                st.screens.values().cloned().collect::<Vec<_>>(),
            )
        };
        let Some(delay) = delay else {
            self.abort_auto_close();
            return;
        };

        let satisfied = screens
            .iter()
            .filter(|s| !s.is_static())
            .all(|s| s.status() == ScreenStatus::Success);
        if satisfied {
            self.restart_auto_close(delay);
        } else {
            self.abort_auto_close();
        }
    }

    fn abort_auto_close(&self) {
        if let Some(timer) = self.shared.state.lock().auto_close_timer.take() {
            timer.abort();
        }
    }

    fn restart_auto_close(&self, delay: u64) {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("auto-close ignored: no async runtime");
            return;
        };
        let weak = Arc::downgrade(&self.shared);
        let handle = rt.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if let Some(shared) = weak.upgrade() {
                tracing::debug!("auto-close delay elapsed; shutting down");
                ScreenManager::from_shared(shared).shutdown();
            }
        });
        if let Some(old) = self.shared.state.lock().auto_close_timer.replace(handle) {
            old.abort();
        }
    }
}

impl std::fmt::Debug for ScreenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary();
        f.debug_struct("ScreenManager")
            .field("screen_count", &summary.screen_count)
            .field("render_mode", &summary.render_mode)
            .field("active", &summary.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::ScreenOptions;

    fn names(screens: &[Screen]) -> Vec<String> {
        screens.iter().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn test_first_visible_screen_becomes_active() {
        let manager = ScreenManager::new();
        manager.create_screen(ScreenOptions::new("hidden").with_hidden(true));
        assert_eq!(manager.active_screen_id(), None);

        let build = manager.create_screen(ScreenOptions::new("Build"));
        assert_eq!(manager.active_screen_id(), Some(build.id().clone()));

        // A later screen does not steal the active slot.
        manager.create_screen(ScreenOptions::new("Tests"));
        assert_eq!(manager.active_screen_id(), Some(build.id().clone()));
    }

    #[test]
    fn test_screens_excludes_hidden() {
        let manager = ScreenManager::new();
        manager.create_screen(ScreenOptions::new("a"));
        manager.create_screen(ScreenOptions::new("b").with_hidden(true));
        assert_eq!(names(&manager.screens()), vec!["a"]);
        assert_eq!(names(&manager.all_screens()), vec!["a", "b"]);
    }

    #[test]
    fn test_completion_reorders_behind_pending() {
        let manager = ScreenManager::new();
        let build = manager.create_screen(ScreenOptions::new("Build"));
        let tests = manager.create_screen(ScreenOptions::new("Tests"));

        build.set_status(ScreenStatus::Pending);
        tests.set_status(ScreenStatus::Pending);
        build.set_status(ScreenStatus::Success);

        assert_eq!(names(&manager.screens()), vec!["Tests", "Build"]);
    }

    #[test]
    fn test_completions_preserve_group_order() {
        let manager = ScreenManager::new();
        let a = manager.create_screen(ScreenOptions::new("a"));
        let b = manager.create_screen(ScreenOptions::new("b"));
        manager.create_screen(ScreenOptions::new("c"));

        a.set_status(ScreenStatus::Success);
        assert_eq!(names(&manager.screens()), vec!["b", "c", "a"]);

        b.set_status(ScreenStatus::Fail);
        assert_eq!(names(&manager.screens()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_remove_active_reassigns_first_visible() {
        let manager = ScreenManager::new();
        let a = manager.create_screen(ScreenOptions::new("a"));
        let b = manager.create_screen(ScreenOptions::new("b"));

        assert_eq!(manager.active_screen_id(), Some(a.id().clone()));
        manager.remove_screen(a.id());
        assert_eq!(manager.active_screen_id(), Some(b.id().clone()));

        manager.remove_screen(b.id());
        assert_eq!(manager.active_screen_id(), None);

        // Unknown ids are a silent no-op.
        manager.remove_screen(&ScreenId("screen_nope".to_string()));
    }

    #[test]
    fn test_selection_clamps_when_visible_list_shrinks() {
        let manager = ScreenManager::new();
        manager.create_screen(ScreenOptions::new("a"));
        manager.create_screen(ScreenOptions::new("b"));
        let c = manager.create_screen(ScreenOptions::new("c"));

        manager.navigate_down();
        manager.navigate_down();
        assert_eq!(manager.selected_index(), 2);

        manager.remove_screen(c.id());
        assert_eq!(manager.selected_index(), 1);
    }

    #[test]
    fn test_navigation_clamps_at_ends() {
        let manager = ScreenManager::new();
        manager.create_screen(ScreenOptions::new("a"));
        manager.create_screen(ScreenOptions::new("b"));

        manager.navigate_up();
        assert_eq!(manager.selected_index(), 0);
        manager.navigate_down();
        manager.navigate_down();
        manager.navigate_down();
        assert_eq!(manager.selected_index(), 1);
    }

    #[test]
    fn test_select_current_activates_and_focuses_content() {
        let manager = ScreenManager::new();
        manager.create_screen(ScreenOptions::new("a"));
        let b = manager.create_screen(ScreenOptions::new("b"));

        manager.navigate_down();
        manager.select_current();
        assert_eq!(manager.active_screen_id(), Some(b.id().clone()));
        assert_eq!(manager.focus_area(), FocusArea::Content);
    }

    #[test]
    fn test_bind_without_surface_falls_back() {
        let manager = ScreenManager::new();
        let mode = manager.bind(BindOptions::default(), None);
        assert_eq!(mode, RenderMode::StdoutFallback);
        assert_eq!(manager.render_mode(), RenderMode::StdoutFallback);
    }

    #[test]
    fn test_bind_non_interactive_is_stdout_interactive() {
        let manager = ScreenManager::new();
        let options = BindOptions {
            use_tui: false,
            ..BindOptions::default()
        };
        assert_eq!(manager.bind(options, None), RenderMode::StdoutInteractive);
    }

    struct FailingSurface;

    impl RenderSurface for FailingSurface {
        fn mount(&self, _manager: &ScreenManager) -> Result<(), SurfaceError> {
            Err(SurfaceError::Unsupported("not a tty".to_string()))
        }

        fn unmount(&self) {}
    }

    #[test]
    fn test_bind_mount_failure_falls_back() {
        let manager = ScreenManager::new();
        let mode = manager.bind(BindOptions::default(), Some(Arc::new(FailingSurface)));
        assert_eq!(mode, RenderMode::StdoutFallback);
    }

    struct OkSurface;

    impl RenderSurface for OkSurface {
        fn mount(&self, _manager: &ScreenManager) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn unmount(&self) {}
    }

    #[test]
    fn test_bind_and_unbind_round_trip() {
        let manager = ScreenManager::new();
        assert_eq!(
            manager.bind(BindOptions::default(), Some(Arc::new(OkSurface))),
            RenderMode::TuiActive
        );
        manager.unbind();
        assert_eq!(manager.render_mode(), RenderMode::Unbound);
    }
}
