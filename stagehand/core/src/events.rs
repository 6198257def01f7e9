//! Change Notification
//!
//! Explicit observer lists for core entities. Rendering adapters subscribe
//! to a screen or to the manager and are called back synchronously, in the
//! order mutations are applied. There is no event-emitter base type to
//! inherit from; each entity owns its own subscriber list and teardown is
//! explicit through the returned [`Subscription`] guard.
//!
//! Callbacks run on the mutating call stack, after the entity's state lock
//! has been released, so a callback may freely read core state (or mutate
//! it, at its own recursion risk).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::manager::{FocusArea, RenderMode};
use crate::messages::{MessageData, MessageId};
use crate::prompts::PromptId;
use crate::screen::{ScreenId, ScreenStatus};

/// Subscriber callback
type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Entry<E> {
    id: u64,
    callback: Callback<E>,
}

/// An observer list for one entity
///
/// Cheap to emit into when empty; emission snapshots the callback list so
/// subscribers may unsubscribe from within a callback.
pub(crate) struct Subscribers<E> {
    entries: Arc<Mutex<Vec<Entry<E>>>>,
    next_id: AtomicU64,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E: 'static> Subscribers<E> {
    /// Register a callback; the returned guard unsubscribes on drop
    pub(crate) fn subscribe(
        &self,
        callback: impl Fn(&E) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().push(Entry {
            id,
            callback: Arc::new(callback),
        });

        let entries: Weak<Mutex<Vec<Entry<E>>>> = Arc::downgrade(&self.entries);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(entries) = entries.upgrade() {
                    entries.lock().retain(|e| e.id != id);
                }
            })),
        }
    }

    /// Invoke every callback with the event, in subscription order
    pub(crate) fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .entries
            .lock()
            .iter()
            .map(|e| Arc::clone(&e.callback))
            .collect();
        for cb in callbacks {
            cb(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Guard for an active subscription
///
/// Dropping the guard unsubscribes. Call [`Subscription::detach`] to keep
/// the subscription alive for the lifetime of the entity instead.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Unsubscribe now
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the subscription alive without holding the guard
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// Screen Events
// ============================================================================

/// Change notification from one screen
///
/// Events carry ids, not payload copies; subscribers read current state
/// through the screen's accessors.
#[derive(Clone, Debug)]
pub enum ScreenEvent {
    /// A message was appended to the log
    MessageAdded(MessageId),
    /// An existing message was mutated
    MessageUpdated(MessageId),
    /// The log was emptied
    MessagesCleared,
    /// A prompt moved into the active slot
    PromptActivated(PromptId),
    /// The active prompt's selection state changed
    PromptUpdated(PromptId),
    /// A prompt resolved (by user action or timeout)
    PromptResolved(PromptId),
    /// The screen's status changed
    StatusChanged(ScreenStatus),
    /// The badge count changed
    BadgeChanged(u64),
    /// The hidden flag changed
    VisibilityChanged(bool),
}

// ============================================================================
// Manager Events
// ============================================================================

/// Change notification from the screen manager
#[derive(Clone, Debug)]
pub enum ManagerEvent {
    /// A screen was created
    ScreenAdded(ScreenId),
    /// A screen was removed
    ScreenRemoved(ScreenId),
    /// The screen order changed (completion reordering)
    OrderChanged,
    /// The active screen changed
    ActiveChanged(Option<ScreenId>),
    /// Keyboard focus moved between sidebar and content
    FocusChanged(FocusArea),
    /// The sidebar selection index changed
    SelectionChanged(usize),
    /// The render mode changed
    RenderModeChanged(RenderMode),
    /// The filter bar state changed
    FilterChanged,
    /// A screen's log is being flushed to the non-interactive output
    ///
    /// Carries a snapshot so the text presenter can print without racing
    /// later mutations. Emitted at most once per screen.
    ScreenFlushed {
        /// The screen being flushed
        id: ScreenId,
        /// Snapshot of the screen's log at flush time
        messages: Vec<MessageData>,
    },
    /// Auto-close elapsed (or shutdown was requested); the session should end
    ShutdownRequested,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let subs: Subscribers<u32> = Subscribers::default();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        let sub = subs.subscribe(move |n| {
            seen_clone.fetch_add(*n as usize, Ordering::SeqCst);
        });

        subs.emit(&2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        sub.cancel();
        subs.emit(&3);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(subs.count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let subs: Subscribers<u32> = Subscribers::default();
        {
            let _sub = subs.subscribe(|_| {});
            assert_eq!(subs.count(), 1);
        }
        assert_eq!(subs.count(), 0);
    }

    #[test]
    fn test_detach_keeps_subscription() {
        let subs: Subscribers<u32> = Subscribers::default();
        subs.subscribe(|_| {}).detach();
        assert_eq!(subs.count(), 1);
    }

    #[test]
    fn test_emit_order_is_subscription_order() {
        let subs: Subscribers<u32> = Subscribers::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            subs.subscribe(move |_| log.lock().push(tag)).detach();
        }

        subs.emit(&0);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }
}
