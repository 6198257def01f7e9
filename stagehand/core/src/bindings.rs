//! Default Binding Table
//!
//! The standard interactive key set, wired against a [`ScreenManager`].
//! Embedders call [`install_default_bindings`] once at session assembly and
//! then add their own bindings on top; everything here goes through the
//! ordinary [`KeyboardManager`] table, so priorities and `when` conditions
//! compose with application bindings.
//!
//! Free-text keystrokes are not routed through bindings: the rendering
//! adapter forwards printable characters straight to
//! [`Screen::prompt_input_char`](crate::screen::Screen::prompt_input_char)
//! while the context reports input mode.

use crate::keyboard::{KeyBinding, KeyCondition, KeyboardManager};
use crate::manager::{FocusArea, ScreenManager};
use crate::prompts::PromptKindTag;

/// Priority bands for the default table
///
/// Prompt handling outranks the filter bar, which outranks sidebar
/// navigation; session-level keys outrank everything.
mod priority {
    pub const SYSTEM: i32 = 100;
    pub const INPUT: i32 = 30;
    pub const PROMPT: i32 = 20;
    pub const FILTER: i32 = 10;
    pub const NAVIGATION: i32 = 0;
}

/// Install the standard interactive bindings
pub fn install_default_bindings(kb: &mut KeyboardManager, manager: &ScreenManager) {
    install_system_bindings(kb, manager);
    install_input_bindings(kb, manager);
    install_prompt_bindings(kb, manager);
    install_filter_bindings(kb, manager);
    install_navigation_bindings(kb, manager);
}

fn install_system_bindings(kb: &mut KeyboardManager, manager: &ScreenManager) {
    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("c", move |_, _| {
            if mgr.bind_options().exit_on_ctrl_c {
                mgr.shutdown();
                true
            } else {
                false
            }
        })
        .with_ctrl()
        .with_description("Quit")
        .with_category("System")
        .with_priority(priority::SYSTEM),
    );
}

fn install_input_bindings(kb: &mut KeyboardManager, manager: &ScreenManager) {
    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("escape", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_exit_input_mode();
            }
            true
        })
        .when(KeyCondition::any().input_mode(true))
        .with_priority(priority::INPUT),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("backspace", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_input_backspace();
            }
            true
        })
        .when(KeyCondition::any().input_mode(true))
        .with_priority(priority::INPUT),
    );
}

fn install_prompt_bindings(kb: &mut KeyboardManager, manager: &ScreenManager) {
    let in_prompt = || {
        KeyCondition::any()
            .focus(FocusArea::Content)
            .has_active_prompt(true)
            .input_mode(false)
    };

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("up", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_navigate_up();
            }
            true
        })
        .alias("k")
        .when(in_prompt())
        .with_description("Previous option")
        .with_category("Prompt")
        .with_priority(priority::PROMPT),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("down", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_navigate_down();
            }
            true
        })
        .alias("j")
        .when(in_prompt())
        .with_description("Next option")
        .with_category("Prompt")
        .with_priority(priority::PROMPT),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("left", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_navigate_left();
            }
            true
        })
        .when(in_prompt())
        .with_priority(priority::PROMPT),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("right", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_navigate_right();
            }
            true
        })
        .when(in_prompt())
        .with_priority(priority::PROMPT),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("space", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_toggle_selection();
            }
            true
        })
        .when(in_prompt().prompt_kind(PromptKindTag::MultiChoice))
        .with_description("Toggle selection")
        .with_category("Prompt")
        .with_priority(priority::PROMPT),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("i", move |_, _| {
            mgr.active_screen()
                .is_some_and(|screen| screen.prompt_enter_input_mode())
        })
        .when(in_prompt().prompt_kind(PromptKindTag::Choice))
        .with_description("Enter custom value")
        .with_category("Prompt")
        .with_priority(priority::PROMPT),
    );

    // Enter submits whether or not the prompt is capturing free text.
    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("enter", move |_, _| {
            if let Some(screen) = mgr.active_screen() {
                screen.prompt_submit();
            }
            true
        })
        .when(
            KeyCondition::any()
                .focus(FocusArea::Content)
                .has_active_prompt(true),
        )
        .with_description("Submit")
        .with_category("Prompt")
        .with_priority(priority::PROMPT),
    );
}

fn install_filter_bindings(kb: &mut KeyboardManager, manager: &ScreenManager) {
    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("/", move |_, _| {
            mgr.with_filter(crate::filter::FilterState::toggle_visible);
            true
        })
        .when(
            KeyCondition::any()
                .focus(FocusArea::Content)
                .has_active_prompt(false),
        )
        .with_description("Toggle filter bar")
        .with_category("Filter")
        .with_priority(priority::FILTER),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("escape", move |_, _| {
            mgr.with_filter(|f| f.visible = false);
            true
        })
        .when(
            KeyCondition::any()
                .filter_visible(true)
                .input_mode(false)
                .has_active_prompt(false),
        )
        .with_description("Close filter bar")
        .with_category("Filter")
        .with_priority(priority::FILTER),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("1", move |event, _| {
            if let Some(index) = event.name.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                mgr.with_filter(|f| f.toggle_level_at(index));
            }
            true
        })
        .alias("2")
        .alias("3")
        .alias("4")
        .when(KeyCondition::any().filter_visible(true).has_active_prompt(false))
        .with_description("Toggle log level")
        .with_category("Filter")
        .with_priority(priority::FILTER),
    );
}

fn install_navigation_bindings(kb: &mut KeyboardManager, manager: &ScreenManager) {
    let in_sidebar = || {
        KeyCondition::any()
            .focus(FocusArea::Sidebar)
            .input_mode(false)
    };

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("tab", move |_, _| {
            mgr.toggle_focus();
            true
        })
        .when(KeyCondition::any().input_mode(false))
        .with_description("Switch focus")
        .with_category("Navigation")
        .with_priority(priority::NAVIGATION),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("up", move |_, _| {
            mgr.navigate_up();
            true
        })
        .alias("k")
        .when(in_sidebar())
        .with_description("Previous screen")
        .with_category("Navigation")
        .with_priority(priority::NAVIGATION),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("down", move |_, _| {
            mgr.navigate_down();
            true
        })
        .alias("j")
        .when(in_sidebar())
        .with_description("Next screen")
        .with_category("Navigation")
        .with_priority(priority::NAVIGATION),
    );

    let mgr = manager.clone();
    kb.register(
        KeyBinding::new("enter", move |_, _| {
            mgr.select_current();
            true
        })
        .when(in_sidebar())
        .with_description("Open screen")
        .with_category("Navigation")
        .with_priority(priority::NAVIGATION),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::keyboard::KeyEvent;
    use crate::manager::{BindOptions, RenderMode, RenderSurface, SurfaceError};
    use crate::prompts::{ChoiceRequest, PromptChoice, PromptValue};
    use crate::screen::ScreenOptions;

    struct NullSurface;

    impl RenderSurface for NullSurface {
        fn mount(&self, _manager: &ScreenManager) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn unmount(&self) {}
    }

    fn interactive_manager() -> ScreenManager {
        let manager = ScreenManager::new();
        let mode = manager.bind(BindOptions::default(), Some(Arc::new(NullSurface)));
        assert_eq!(mode, RenderMode::TuiActive);
        manager
    }

    fn dispatch(kb: &KeyboardManager, manager: &ScreenManager, key: &str) -> bool {
        kb.handle_key(&KeyEvent::named(key), &manager.key_context())
    }

    #[test]
    fn test_sidebar_navigation() {
        let manager = interactive_manager();
        manager.create_screen(ScreenOptions::new("a"));
        manager.create_screen(ScreenOptions::new("b"));

        let mut kb = KeyboardManager::new();
        install_default_bindings(&mut kb, &manager);

        assert!(dispatch(&kb, &manager, "down"));
        assert_eq!(manager.selected_index(), 1);
        assert!(dispatch(&kb, &manager, "k"));
        assert_eq!(manager.selected_index(), 0);
    }

    #[tokio::test]
    async fn test_prompt_keys_outrank_sidebar_navigation() {
        let manager = interactive_manager();
        let screen = manager.create_screen(ScreenOptions::new("a"));

        let mut kb = KeyboardManager::new();
        install_default_bindings(&mut kb, &manager);

        let choices = vec![PromptChoice::new("A", "a"), PromptChoice::new("B", "b")];
        let handle = screen
            .prompt_choice(ChoiceRequest::new("pick", choices))
            .unwrap();
        // Prompt activation moved focus to content.
        assert_eq!(manager.focus_area(), FocusArea::Content);

        assert!(dispatch(&kb, &manager, "down"));
        assert!(dispatch(&kb, &manager, "enter"));
        assert_eq!(handle.await, Ok(PromptValue::Choice("b".to_string())));
        // Sidebar selection was never touched.
        assert_eq!(manager.selected_index(), 0);
    }

    #[test]
    fn test_ctrl_c_requests_shutdown() {
        let manager = interactive_manager();
        let shutdowns = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&shutdowns);
        manager
            .subscribe(move |event| {
                if matches!(event, crate::events::ManagerEvent::ShutdownRequested) {
                    seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                }
            })
            .detach();

        let mut kb = KeyboardManager::new();
        install_default_bindings(&mut kb, &manager);

        assert!(kb.handle_key(
            &KeyEvent::named("c").with_ctrl(),
            &manager.key_context()
        ));
        assert_eq!(shutdowns.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_toggle_and_level_keys() {
        let manager = interactive_manager();
        manager.create_screen(ScreenOptions::new("a"));
        manager.toggle_focus();

        let mut kb = KeyboardManager::new();
        install_default_bindings(&mut kb, &manager);

        assert!(dispatch(&kb, &manager, "/"));
        assert!(manager.filter().visible);

        assert!(dispatch(&kb, &manager, "2"));
        assert!(!manager
            .filter()
            .enabled_levels
            .contains(&crate::messages::LogLevel::Info));

        assert!(dispatch(&kb, &manager, "escape"));
        assert!(!manager.filter().visible);
    }
}
