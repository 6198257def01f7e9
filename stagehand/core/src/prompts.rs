//! Prompts
//!
//! Typed prompt records and the factory that builds them from caller-supplied
//! options. A prompt is created against a screen, queued behind any prompt
//! already active there, and resolves exactly once — by user action, by
//! timeout, or immediately with its default when no interaction is possible.
//!
//! # Design Philosophy
//!
//! Prompt shapes are a tagged union with per-kind selection state, matched
//! exhaustively everywhere. The awaitable side is a [`PromptHandle`]: a
//! plain `Future` backed by a oneshot channel, so callers `await` a value
//! without caring which path resolved it.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::messages::epoch_ms;

// ============================================================================
// Identifiers & Errors
// ============================================================================

/// Prompt identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptId(pub String);

impl PromptId {
    /// Generate a new unique prompt ID
    #[must_use]
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("prompt_{}_{count}", epoch_ms()))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors surfaced by prompt creation and resolution
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PromptError {
    /// A choice or multi-choice prompt was created with zero choices
    #[error("prompt requires at least one choice")]
    NoChoices,
    /// The owning screen was removed before the prompt resolved
    #[error("prompt abandoned before resolution")]
    Abandoned,
}

// ============================================================================
// Prompt Data
// ============================================================================

/// One selectable option of a choice or multi-choice prompt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptChoice {
    /// Text shown to the user
    pub label: String,
    /// Value resolved when this option is chosen
    pub value: String,
    /// Whether selecting this option allows free-text input instead
    pub allows_free_input: bool,
}

impl PromptChoice {
    /// Create a plain choice
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            allows_free_input: false,
        }
    }

    /// Mark this choice as accepting free-text input
    #[must_use]
    pub fn with_free_input(mut self) -> Self {
        self.allows_free_input = true;
        self
    }
}

/// Discriminant of a prompt kind (used by keyboard conditions)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptKindTag {
    /// Single choice from a list
    Choice,
    /// Yes/no confirmation
    Confirm,
    /// Free-text input
    Input,
    /// Multiple choices from a list
    MultiChoice,
}

/// Kind-specific prompt payload and selection state
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PromptKind {
    /// Pick one option (optionally entering free text on permissive options)
    Choice {
        /// The options, in display order
        choices: Vec<PromptChoice>,
        /// Currently highlighted option index
        selected: usize,
        /// Free-text buffer (used when the selected option allows input)
        free_text: String,
        /// Whether the user is currently typing free text
        input_mode: bool,
    },
    /// Yes/no confirmation
    Confirm {
        /// Currently selected answer
        selected: bool,
    },
    /// Free-text input
    Input {
        /// Current text buffer
        value: String,
    },
    /// Pick any number of options, subject to a minimum
    MultiChoice {
        /// The options, in display order
        choices: Vec<PromptChoice>,
        /// Currently highlighted option index
        cursor: usize,
        /// Indices of selected options
        selected: BTreeSet<usize>,
        /// Minimum selections required to submit
        min_select: usize,
    },
}

/// The value a prompt resolved to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PromptValue {
    /// Resolution of a choice prompt (option value or free text)
    Choice(String),
    /// Resolution of a confirm prompt
    Confirm(bool),
    /// Resolution of an input prompt
    Input(String),
    /// Resolution of a multi-choice prompt, in list order
    MultiChoice(Vec<String>),
}

/// A prompt record
///
/// Built by the factory constructors below, then handed to a screen's
/// prompt queue. Resolved exactly once; once `resolved` is set the record
/// is immutable and removed from the active slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptData {
    /// Unique prompt identifier
    pub id: PromptId,
    /// Creation time (Unix timestamp ms)
    pub created_at: u64,
    /// The question shown to the user
    pub question: String,
    /// Optional timeout in milliseconds
    pub timeout: Option<u64>,
    /// When the timeout clock started (Unix timestamp ms, set at enqueue)
    pub timeout_started: Option<u64>,
    /// Whether the prompt has resolved
    pub resolved: bool,
    /// The resolution value, set exactly once
    pub resolved_value: Option<PromptValue>,
    /// Resolution used when the prompt times out or cannot be presented
    pub default: PromptValue,
    /// Kind-specific payload
    pub kind: PromptKind,
}

impl PromptData {
    /// Discriminant of this prompt's kind
    #[must_use]
    pub fn kind_tag(&self) -> PromptKindTag {
        match self.kind {
            PromptKind::Choice { .. } => PromptKindTag::Choice,
            PromptKind::Confirm { .. } => PromptKindTag::Confirm,
            PromptKind::Input { .. } => PromptKindTag::Input,
            PromptKind::MultiChoice { .. } => PromptKindTag::MultiChoice,
        }
    }

    /// Whether the prompt can be submitted in its current state
    ///
    /// Every kind can always submit except multi-choice, which requires at
    /// least `min_select` selections.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        match &self.kind {
            PromptKind::MultiChoice {
                selected,
                min_select,
                ..
            } => selected.len() >= *min_select,
            _ => true,
        }
    }

    /// The value a submit would resolve to right now
    ///
    /// Choice prompts resolve to the selected option's value, or to the
    /// free-text buffer when the selected option allows input and the
    /// buffer is non-empty.
    #[must_use]
    pub fn current_value(&self) -> PromptValue {
        match &self.kind {
            PromptKind::Choice {
                choices,
                selected,
                free_text,
                ..
            } => {
                let allows_input = choices
                    .get(*selected)
                    .is_some_and(|c| c.allows_free_input);
                if allows_input && !free_text.is_empty() {
                    PromptValue::Choice(free_text.clone())
                } else {
                    let value = choices
                        .get(*selected)
                        .map(|c| c.value.clone())
                        .unwrap_or_default();
                    PromptValue::Choice(value)
                }
            }
            PromptKind::Confirm { selected } => PromptValue::Confirm(*selected),
            PromptKind::Input { value } => PromptValue::Input(value.clone()),
            PromptKind::MultiChoice {
                choices, selected, ..
            } => PromptValue::MultiChoice(
                choices
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| selected.contains(i))
                    .map(|(_, c)| c.value.clone())
                    .collect(),
            ),
        }
    }

    /// Whether the prompt is currently capturing free-text keystrokes
    ///
    /// Input prompts are always in input mode; choice prompts only after
    /// entering it on a permissive option.
    #[must_use]
    pub fn in_input_mode(&self) -> bool {
        match &self.kind {
            PromptKind::Choice { input_mode, .. } => *input_mode,
            PromptKind::Input { .. } => true,
            _ => false,
        }
    }

    /// Whether the currently selected option accepts free-text input
    ///
    /// Input prompts are always considered in input mode.
    #[must_use]
    pub fn selected_allows_free_input(&self) -> bool {
        match &self.kind {
            PromptKind::Choice {
                choices, selected, ..
            } => choices.get(*selected).is_some_and(|c| c.allows_free_input),
            PromptKind::Input { .. } => true,
            _ => false,
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Options for a choice prompt
#[derive(Clone, Debug)]
pub struct ChoiceRequest {
    /// The question shown to the user
    pub question: String,
    /// The options, in display order; must be non-empty
    pub choices: Vec<PromptChoice>,
    /// Value of the option selected by default; unmatched values are
    /// dropped and the first option is used instead
    pub default_choice: Option<String>,
    /// Optional timeout in milliseconds
    pub timeout: Option<u64>,
}

impl ChoiceRequest {
    /// Create a request with defaults (no default choice, no timeout)
    pub fn new(question: impl Into<String>, choices: Vec<PromptChoice>) -> Self {
        Self {
            question: question.into(),
            choices,
            default_choice: None,
            timeout: None,
        }
    }

    /// Set the default choice by option value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_choice = Some(value.into());
        self
    }

    /// Set a timeout in milliseconds
    #[must_use]
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }
}

/// Options for a confirm prompt
#[derive(Clone, Debug)]
pub struct ConfirmRequest {
    /// The question shown to the user
    pub question: String,
    /// Default answer (true unless overridden)
    pub default: bool,
    /// Optional timeout in milliseconds
    pub timeout: Option<u64>,
}

impl ConfirmRequest {
    /// Create a request defaulting to `true`
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            default: true,
            timeout: None,
        }
    }

    /// Set the default answer
    #[must_use]
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// Set a timeout in milliseconds
    #[must_use]
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }
}

/// Options for an input prompt
#[derive(Clone, Debug)]
pub struct InputRequest {
    /// The question shown to the user
    pub question: String,
    /// Initial text buffer (and the default resolution)
    pub default_value: String,
    /// Optional timeout in milliseconds
    pub timeout: Option<u64>,
}

impl InputRequest {
    /// Create a request with an empty initial buffer
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            default_value: String::new(),
            timeout: None,
        }
    }

    /// Set the initial buffer / default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Set a timeout in milliseconds
    #[must_use]
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }
}

/// Options for a multi-choice prompt
#[derive(Clone, Debug)]
pub struct MultiChoiceRequest {
    /// The question shown to the user
    pub question: String,
    /// The options, in display order; must be non-empty
    pub choices: Vec<PromptChoice>,
    /// Values pre-selected by default; unmatched values are dropped
    pub default_choices: Vec<String>,
    /// Minimum selections required to submit
    pub min_select: usize,
    /// Optional timeout in milliseconds
    pub timeout: Option<u64>,
}

impl MultiChoiceRequest {
    /// Create a request with no pre-selection and `min_select = 0`
    pub fn new(question: impl Into<String>, choices: Vec<PromptChoice>) -> Self {
        Self {
            question: question.into(),
            choices,
            default_choices: Vec::new(),
            min_select: 0,
            timeout: None,
        }
    }

    /// Pre-select options by value
    #[must_use]
    pub fn with_defaults(mut self, values: Vec<String>) -> Self {
        self.default_choices = values;
        self
    }

    /// Require at least `n` selections before submit
    #[must_use]
    pub fn with_min_select(mut self, n: usize) -> Self {
        self.min_select = n;
        self
    }

    /// Set a timeout in milliseconds
    #[must_use]
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }
}

impl PromptData {
    /// Build a choice prompt record
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::NoChoices`] when `choices` is empty.
    pub fn choice(req: ChoiceRequest) -> Result<Self, PromptError> {
        if req.choices.is_empty() {
            return Err(PromptError::NoChoices);
        }

        // Unmatched default values fall back to the first option.
        let selected = req
            .default_choice
            .as_deref()
            .and_then(|value| req.choices.iter().position(|c| c.value == value))
            .unwrap_or(0);
        let default = PromptValue::Choice(req.choices[selected].value.clone());

        Ok(Self::assemble(
            req.question,
            req.timeout,
            default,
            PromptKind::Choice {
                choices: req.choices,
                selected,
                free_text: String::new(),
                input_mode: false,
            },
        ))
    }

    /// Build a confirm prompt record
    #[must_use]
    pub fn confirm(req: ConfirmRequest) -> Self {
        Self::assemble(
            req.question,
            req.timeout,
            PromptValue::Confirm(req.default),
            PromptKind::Confirm {
                selected: req.default,
            },
        )
    }

    /// Build an input prompt record
    #[must_use]
    pub fn input(req: InputRequest) -> Self {
        Self::assemble(
            req.question,
            req.timeout,
            PromptValue::Input(req.default_value.clone()),
            PromptKind::Input {
                value: req.default_value,
            },
        )
    }

    /// Build a multi-choice prompt record
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::NoChoices`] when `choices` is empty.
    pub fn multi_choice(req: MultiChoiceRequest) -> Result<Self, PromptError> {
        if req.choices.is_empty() {
            return Err(PromptError::NoChoices);
        }

        // Unmatched default values are simply omitted.
        let selected: BTreeSet<usize> = req
            .default_choices
            .iter()
            .filter_map(|value| req.choices.iter().position(|c| &c.value == value))
            .collect();
        let default = PromptValue::MultiChoice(
            req.choices
                .iter()
                .enumerate()
                .filter(|(i, _)| selected.contains(i))
                .map(|(_, c)| c.value.clone())
                .collect(),
        );

        Ok(Self::assemble(
            req.question,
            req.timeout,
            default,
            PromptKind::MultiChoice {
                choices: req.choices,
                cursor: 0,
                selected,
                min_select: req.min_select,
            },
        ))
    }

    fn assemble(question: String, timeout: Option<u64>, default: PromptValue, kind: PromptKind) -> Self {
        Self {
            id: PromptId::generate(),
            created_at: epoch_ms(),
            question,
            timeout,
            timeout_started: None,
            resolved: false,
            resolved_value: None,
            default,
            kind,
        }
    }
}

// ============================================================================
// Awaitable Handle
// ============================================================================

pin_project_lite::pin_project! {
    /// The awaitable side of a prompt
    ///
    /// Resolves exactly once with the prompt's value, or with
    /// [`PromptError::Abandoned`] when the owning screen was removed while
    /// the prompt was still pending.
    pub struct PromptHandle {
        #[pin]
        rx: oneshot::Receiver<PromptValue>,
    }
}

impl PromptHandle {
    /// Wrap a pending receiver
    pub(crate) fn pending(rx: oneshot::Receiver<PromptValue>) -> Self {
        Self { rx }
    }

    /// Create a handle that is already resolved
    pub(crate) fn resolved(value: PromptValue) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is held right here; the send cannot fail.
        let _ = tx.send(value);
        Self { rx }
    }
}

impl Future for PromptHandle {
    type Output = Result<PromptValue, PromptError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match futures::ready!(this.rx.poll(cx)) {
            Ok(value) => Poll::Ready(Ok(value)),
            Err(_) => Poll::Ready(Err(PromptError::Abandoned)),
        }
    }
}

impl std::fmt::Debug for PromptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ab_choices() -> Vec<PromptChoice> {
        vec![PromptChoice::new("A", "a"), PromptChoice::new("B", "b")]
    }

    #[test]
    fn test_choice_requires_choices() {
        let err = PromptData::choice(ChoiceRequest::new("pick", Vec::new())).unwrap_err();
        assert_eq!(err, PromptError::NoChoices);

        let err =
            PromptData::multi_choice(MultiChoiceRequest::new("pick", Vec::new())).unwrap_err();
        assert_eq!(err, PromptError::NoChoices);
    }

    #[test]
    fn test_choice_default_matches_by_value() {
        let prompt =
            PromptData::choice(ChoiceRequest::new("pick", ab_choices()).with_default("b")).unwrap();
        assert_eq!(prompt.default, PromptValue::Choice("b".to_string()));
        match prompt.kind {
            PromptKind::Choice { selected, .. } => assert_eq!(selected, 1),
            _ => panic!("expected choice kind"),
        }
    }

    #[test]
    fn test_choice_unmatched_default_falls_back_to_first() {
        let prompt = PromptData::choice(ChoiceRequest::new("pick", ab_choices()).with_default("zzz"))
            .unwrap();
        assert_eq!(prompt.default, PromptValue::Choice("a".to_string()));
    }

    #[test]
    fn test_multi_choice_unmatched_defaults_dropped() {
        let req = MultiChoiceRequest::new("pick", ab_choices())
            .with_defaults(vec!["b".to_string(), "zzz".to_string()]);
        let prompt = PromptData::multi_choice(req).unwrap();
        assert_eq!(
            prompt.default,
            PromptValue::MultiChoice(vec!["b".to_string()])
        );
    }

    #[test]
    fn test_multi_choice_min_select_gates_submit() {
        let req = MultiChoiceRequest::new("pick", ab_choices()).with_min_select(2);
        let mut prompt = PromptData::multi_choice(req).unwrap();
        assert!(!prompt.can_submit());

        if let PromptKind::MultiChoice { selected, .. } = &mut prompt.kind {
            selected.insert(0);
        }
        assert!(!prompt.can_submit());

        if let PromptKind::MultiChoice { selected, .. } = &mut prompt.kind {
            selected.insert(1);
        }
        assert!(prompt.can_submit());
    }

    #[test]
    fn test_current_value_prefers_free_text() {
        let choices = vec![
            PromptChoice::new("A", "a"),
            PromptChoice::new("Other", "other").with_free_input(),
        ];
        let mut prompt = PromptData::choice(ChoiceRequest::new("pick", choices)).unwrap();
        if let PromptKind::Choice {
            selected,
            free_text,
            ..
        } = &mut prompt.kind
        {
            *selected = 1;
            *free_text = "custom".to_string();
        }
        assert_eq!(prompt.current_value(), PromptValue::Choice("custom".to_string()));
    }

    #[test]
    fn test_confirm_defaults_true() {
        let prompt = PromptData::confirm(ConfirmRequest::new("sure?"));
        assert_eq!(prompt.default, PromptValue::Confirm(true));
        assert_eq!(prompt.kind_tag(), PromptKindTag::Confirm);
    }

    #[tokio::test]
    async fn test_resolved_handle_yields_value() {
        let handle = PromptHandle::resolved(PromptValue::Input("x".to_string()));
        assert_eq!(handle.await, Ok(PromptValue::Input("x".to_string())));
    }

    #[tokio::test]
    async fn test_dropped_sender_is_abandoned() {
        let (tx, rx) = oneshot::channel::<PromptValue>();
        drop(tx);
        let handle = PromptHandle::pending(rx);
        assert_eq!(handle.await, Err(PromptError::Abandoned));
    }
}
