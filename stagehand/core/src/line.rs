//! Line-Interface Fallback
//!
//! When the render mode is one of the stdout paths, prompts cannot be
//! presented as interactive widgets. The core instead serializes each prompt
//! through this collaborator: a readline-style implementation owned by the
//! embedding application. The core calls exactly one method and awaits the
//! type-appropriate value; how the implementation asks (plain `stdin`,
//! rustyline, a test double) is its own business.

use async_trait::async_trait;

use crate::prompts::{PromptData, PromptValue};

/// Blocking-textual prompt resolution
///
/// Implementations must return a value whose variant matches the prompt's
/// kind (e.g. [`PromptValue::Confirm`] for a confirm prompt). Returning the
/// prompt's `default` is always acceptable.
#[async_trait]
pub trait LinePrompter: Send + Sync {
    /// Resolve the prompt by textual interaction
    async fn resolve(&self, prompt: &PromptData) -> PromptValue;
}

/// A prompter that immediately answers every prompt with its default
///
/// Useful for non-interactive runs and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAnswers;

#[async_trait]
impl LinePrompter for DefaultAnswers {
    async fn resolve(&self, prompt: &PromptData) -> PromptValue {
        prompt.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{ConfirmRequest, PromptData};

    #[tokio::test]
    async fn test_default_answers_returns_default() {
        let prompt = PromptData::confirm(ConfirmRequest::new("ok?").with_default(false));
        let value = DefaultAnswers.resolve(&prompt).await;
        assert_eq!(value, PromptValue::Confirm(false));
    }
}
