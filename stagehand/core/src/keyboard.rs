//! Keyboard Dispatch
//!
//! A prioritized table of key bindings. The rendering adapter normalizes raw
//! terminal input into [`KeyEvent`]s and feeds them to
//! [`KeyboardManager::handle_key`] together with a [`KeyContext`] snapshot;
//! the manager resolves at most one matching binding and invokes it.
//!
//! # Dispatch Rules
//!
//! Bindings are scanned in descending priority order (ties keep insertion
//! order). The first binding wins whose key spec matches the event's name or
//! raw sequence, whose modifier flags match exactly (an absent modifier
//! means "not held", never "don't care"), whose `when` condition record is
//! satisfied by the context, and none of whose keys is currently disabled.
//! Dispatch is deterministic; two bindings never race for one event.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::manager::FocusArea;
use crate::prompts::PromptKindTag;

// ============================================================================
// Events & Context
// ============================================================================

/// A normalized key event
///
/// `name` is the logical key name ("up", "enter", "c"); `sequence` is the
/// raw byte sequence when the terminal produced one that bindings may want
/// to match directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Logical key name
    pub name: String,
    /// Raw input sequence, when available
    pub sequence: Option<String>,
    /// Whether Ctrl was held
    pub ctrl: bool,
    /// Whether Meta/Alt was held
    pub meta: bool,
    /// Whether Shift was held
    pub shift: bool,
}

impl KeyEvent {
    /// A plain key press with no modifiers
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add the Ctrl modifier
    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Add the Meta modifier
    #[must_use]
    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Add the Shift modifier
    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Attach the raw input sequence
    #[must_use]
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }
}

/// Snapshot of the interactive state bindings condition on
///
/// Built by [`ScreenManager::key_context`](crate::manager::ScreenManager::key_context)
/// at dispatch time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyContext {
    /// Where keyboard focus currently is
    pub focus: FocusArea,
    /// Whether the active screen has an active prompt
    pub has_active_prompt: bool,
    /// Kind of the active prompt, when one exists
    pub prompt_kind: Option<PromptKindTag>,
    /// Whether the active prompt is capturing free-text input
    pub input_mode: bool,
    /// Whether the filter bar is visible
    pub filter_visible: bool,
}

/// Partial condition record over [`KeyContext`]
///
/// Every specified field must equal the corresponding context field;
/// unspecified fields are wildcards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCondition {
    /// Required focus area
    pub focus: Option<FocusArea>,
    /// Required active-prompt presence
    pub has_active_prompt: Option<bool>,
    /// Required active-prompt kind
    pub prompt_kind: Option<PromptKindTag>,
    /// Required input-mode state
    pub input_mode: Option<bool>,
    /// Required filter-bar visibility
    pub filter_visible: Option<bool>,
}

impl KeyCondition {
    /// The wildcard condition (matches every context)
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Require a focus area
    #[must_use]
    pub fn focus(mut self, focus: FocusArea) -> Self {
        self.focus = Some(focus);
        self
    }

    /// Require active-prompt presence
    #[must_use]
    pub fn has_active_prompt(mut self, value: bool) -> Self {
        self.has_active_prompt = Some(value);
        self
    }

    /// Require a specific active-prompt kind
    #[must_use]
    pub fn prompt_kind(mut self, kind: PromptKindTag) -> Self {
        self.prompt_kind = Some(kind);
        self
    }

    /// Require input-mode state
    #[must_use]
    pub fn input_mode(mut self, value: bool) -> Self {
        self.input_mode = Some(value);
        self
    }

    /// Require filter-bar visibility
    #[must_use]
    pub fn filter_visible(mut self, value: bool) -> Self {
        self.filter_visible = Some(value);
        self
    }

    /// Whether the context satisfies every specified field
    #[must_use]
    pub fn matches(&self, ctx: &KeyContext) -> bool {
        self.focus.is_none_or(|v| v == ctx.focus)
            && self
                .has_active_prompt
                .is_none_or(|v| v == ctx.has_active_prompt)
            && self.prompt_kind.is_none_or(|v| Some(v) == ctx.prompt_kind)
            && self.input_mode.is_none_or(|v| v == ctx.input_mode)
            && self.filter_visible.is_none_or(|v| v == ctx.filter_visible)
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// Handler invoked when a binding fires
///
/// Returns whether the event was consumed.
pub type KeyHandler = Arc<dyn Fn(&KeyEvent, &KeyContext) -> bool + Send + Sync>;

/// One entry in the binding table
///
/// Immutable once registered, except through the manager's
/// enable/disable-by-key operations.
#[derive(Clone)]
pub struct KeyBinding {
    /// Key names (or raw sequences) this binding matches; one match suffices
    pub keys: Vec<String>,
    /// Required Ctrl state
    pub ctrl: bool,
    /// Required Meta state
    pub meta: bool,
    /// Required Shift state
    pub shift: bool,
    /// Handler invoked on dispatch
    pub handler: KeyHandler,
    /// Human-readable description; empty means internal (hidden from help)
    pub description: String,
    /// Help category
    pub category: String,
    /// Context condition
    pub when: KeyCondition,
    /// Dispatch priority (higher fires first)
    pub priority: i32,
}

impl KeyBinding {
    /// Create a binding on a single key with a consuming handler
    pub fn new(
        key: impl Into<String>,
        handler: impl Fn(&KeyEvent, &KeyContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            keys: vec![key.into()],
            ctrl: false,
            meta: false,
            shift: false,
            handler: Arc::new(handler),
            description: String::new(),
            category: String::new(),
            when: KeyCondition::any(),
            priority: 0,
        }
    }

    /// Add an alias key
    #[must_use]
    pub fn alias(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Require Ctrl
    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Require Meta
    #[must_use]
    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Require Shift
    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Set the help description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the help category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the context condition
    #[must_use]
    pub fn when(mut self, when: KeyCondition) -> Self {
        self.when = when;
        self
    }

    /// Set the dispatch priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the event's key and modifiers match this binding
    fn matches_event(&self, event: &KeyEvent) -> bool {
        let key_match = self.keys.iter().any(|k| {
            k == &event.name || event.sequence.as_deref() == Some(k.as_str())
        });
        key_match
            && self.ctrl == event.ctrl
            && self.meta == event.meta
            && self.shift == event.shift
    }
}

impl std::fmt::Debug for KeyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBinding")
            .field("keys", &self.keys)
            .field("ctrl", &self.ctrl)
            .field("meta", &self.meta)
            .field("shift", &self.shift)
            .field("description", &self.description)
            .field("category", &self.category)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Manager
// ============================================================================

/// The binding table and dispatcher
///
/// Owned by whatever assembles the interactive session; bindings hold
/// callbacks into the screen manager and screens, never the other way
/// around.
#[derive(Debug, Default)]
pub struct KeyboardManager {
    /// Bindings sorted descending by priority, ties in insertion order
    bindings: Vec<KeyBinding>,
    /// Keys whose bindings are currently suppressed
    disabled_keys: HashSet<String>,
}

impl KeyboardManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding
    ///
    /// The table is re-sorted stably, so equal priorities keep their
    /// registration order.
    pub fn register(&mut self, binding: KeyBinding) {
        self.bindings.push(binding);
        self.bindings.sort_by_key(|b| std::cmp::Reverse(b.priority));
    }

    /// Remove every binding referencing `key`
    ///
    /// Silent no-op when no binding references it.
    pub fn remove_key(&mut self, key: &str) {
        self.bindings.retain(|b| !b.keys.iter().any(|k| k == key));
    }

    /// Suppress all bindings referencing `key` without removing them
    pub fn disable_key(&mut self, key: impl Into<String>) {
        self.disabled_keys.insert(key.into());
    }

    /// Lift a previous [`disable_key`](Self::disable_key)
    pub fn enable_key(&mut self, key: &str) {
        self.disabled_keys.remove(key);
    }

    /// Whether a key is currently disabled
    #[must_use]
    pub fn is_key_disabled(&self, key: &str) -> bool {
        self.disabled_keys.contains(key)
    }

    /// Dispatch a key event
    ///
    /// Scans bindings in priority order and invokes the first qualifying
    /// handler; returns that handler's consumed result, or `false` when no
    /// binding matched.
    pub fn handle_key(&self, event: &KeyEvent, ctx: &KeyContext) -> bool {
        for binding in &self.bindings {
            if !binding.matches_event(event) {
                continue;
            }
            if !binding.when.matches(ctx) {
                continue;
            }
            if binding
                .keys
                .iter()
                .any(|k| self.disabled_keys.contains(k))
            {
                continue;
            }
            return (binding.handler)(event, ctx);
        }
        false
    }

    /// User-facing bindings, in dispatch order
    ///
    /// Bindings with an empty description are internal shortcuts and are
    /// excluded.
    #[must_use]
    pub fn bindings_for_help(&self) -> Vec<&KeyBinding> {
        self.bindings
            .iter()
            .filter(|b| !b.description.is_empty())
            .collect()
    }

    /// User-facing bindings grouped by category
    #[must_use]
    pub fn bindings_by_category(&self) -> BTreeMap<&str, Vec<&KeyBinding>> {
        let mut map: BTreeMap<&str, Vec<&KeyBinding>> = BTreeMap::new();
        for binding in self.bindings_for_help() {
            map.entry(binding.category.as_str()).or_default().push(binding);
        }
        map
    }

    /// Number of registered bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter_binding(key: &str, hits: &Arc<AtomicUsize>) -> KeyBinding {
        let hits = Arc::clone(hits);
        KeyBinding::new(key, move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[test]
    fn test_modifiers_match_exactly() {
        let plain_hits = Arc::new(AtomicUsize::new(0));
        let ctrl_hits = Arc::new(AtomicUsize::new(0));

        let mut kb = KeyboardManager::new();
        kb.register(counter_binding("c", &plain_hits));
        kb.register(counter_binding("c", &ctrl_hits).with_ctrl());

        assert!(kb.handle_key(&KeyEvent::named("c").with_ctrl(), &KeyContext::default()));
        assert_eq!(ctrl_hits.load(Ordering::SeqCst), 1);
        assert_eq!(plain_hits.load(Ordering::SeqCst), 0);

        assert!(kb.handle_key(&KeyEvent::named("c"), &KeyContext::default()));
        assert_eq!(plain_hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctrl_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_priority_wins_over_registration_order() {
        let low_hits = Arc::new(AtomicUsize::new(0));
        let high_hits = Arc::new(AtomicUsize::new(0));

        let mut kb = KeyboardManager::new();
        kb.register(counter_binding("x", &low_hits).with_priority(1));
        kb.register(counter_binding("x", &high_hits).with_priority(10));

        assert!(kb.handle_key(&KeyEvent::named("x"), &KeyContext::default()));
        assert_eq!(high_hits.load(Ordering::SeqCst), 1);
        assert_eq!(low_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let first_hits = Arc::new(AtomicUsize::new(0));
        let second_hits = Arc::new(AtomicUsize::new(0));

        let mut kb = KeyboardManager::new();
        kb.register(counter_binding("x", &first_hits));
        kb.register(counter_binding("x", &second_hits));

        kb.handle_key(&KeyEvent::named("x"), &KeyContext::default());
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_when_condition_filters_context() {
        let hits = Arc::new(AtomicUsize::new(0));

        let mut kb = KeyboardManager::new();
        kb.register(
            counter_binding("enter", &hits).when(KeyCondition::any().has_active_prompt(true)),
        );

        let no_prompt = KeyContext::default();
        assert!(!kb.handle_key(&KeyEvent::named("enter"), &no_prompt));

        let with_prompt = KeyContext {
            has_active_prompt: true,
            ..KeyContext::default()
        };
        assert!(kb.handle_key(&KeyEvent::named("enter"), &with_prompt));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sequence_match_suffices() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut kb = KeyboardManager::new();
        kb.register(counter_binding("\u{1b}[A", &hits));

        let event = KeyEvent::named("up").with_sequence("\u{1b}[A");
        assert!(kb.handle_key(&event, &KeyContext::default()));
    }

    #[test]
    fn test_disable_key_suppresses_without_removing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut kb = KeyboardManager::new();
        kb.register(counter_binding("q", &hits));

        kb.disable_key("q");
        assert!(!kb.handle_key(&KeyEvent::named("q"), &KeyContext::default()));
        assert_eq!(kb.len(), 1);

        kb.enable_key("q");
        assert!(kb.handle_key(&KeyEvent::named("q"), &KeyContext::default()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_help_excludes_undocumented_bindings() {
        let mut kb = KeyboardManager::new();
        kb.register(KeyBinding::new("a", |_, _| true));
        kb.register(
            KeyBinding::new("b", |_, _| true)
                .with_description("do b")
                .with_category("General"),
        );

        let help = kb.bindings_for_help();
        assert_eq!(help.len(), 1);
        assert_eq!(help[0].keys, vec!["b".to_string()]);

        let by_category = kb.bindings_by_category();
        assert_eq!(by_category.len(), 1);
        assert!(by_category.contains_key("General"));
    }

    #[test]
    fn test_unmatched_event_returns_false() {
        let kb = KeyboardManager::new();
        assert!(!kb.handle_key(&KeyEvent::named("z"), &KeyContext::default()));
    }
}
