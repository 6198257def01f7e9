//! Stagehand Core - Headless Screen Orchestration
//!
//! This crate provides the orchestration core for multi-screen interactive
//! terminal programs, completely independent of any UI framework. It tracks
//! named screens (independent log/output streams), queues and resolves user
//! prompts, dispatches keyboard input through a prioritized binding table,
//! and filters message logs for display.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Rendering Front-Ends                         │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────────┐ │
//! │  │ TUI surface  │  │ Line interface │  │  Headless / testing  │ │
//! │  └──────┬───────┘  └───────┬────────┘  └──────────┬───────────┘ │
//! │         │   key events /   │  prompt              │             │
//! │         │   subscriptions  │  delegation          │             │
//! └─────────┼──────────────────┼─────────────────────┼──────────────┘
//!           │                  │                     │
//! ┌─────────┼──────────────────┼─────────────────────┼──────────────┐
//! │         ▼          STAGEHAND CORE                ▼              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                     ScreenManager                           │ │
//! │  │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌───────────┐  │ │
//! │  │  │ Screens  │  │ Prompts  │  │ Keyboard  │  │  Filter   │  │ │
//! │  │  │ registry │  │  queue   │  │  table    │  │  engine   │  │ │
//! │  │  └──────────┘  └──────────┘  └───────────┘  └───────────┘  │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ScreenManager`]: screen registry, render-mode lifecycle, focus state
//! - [`Screen`]: one screen's message log and prompt queue
//! - [`KeyboardManager`]: prioritized key-binding table and dispatcher
//! - [`FilterState`] + [`filter_messages`]: the message filter engine
//! - [`PromptData`] / [`PromptHandle`]: typed prompts and their awaitables
//!
//! # Quick Start
//!
//! ```ignore
//! use stagehand_core::{
//!     BindOptions, ChoiceRequest, PromptChoice, ScreenManager, ScreenOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = ScreenManager::new();
//!     let build = manager.create_screen(ScreenOptions::new("Build"));
//!
//!     // Attach a rendering surface (or fall back to stdout).
//!     manager.bind(BindOptions::default(), Some(my_surface()));
//!
//!     build.info("compiling 42 crates");
//!     let answer = build
//!         .prompt_choice(ChoiceRequest::new(
//!             "Continue?",
//!             vec![PromptChoice::new("Yes", "yes"), PromptChoice::new("No", "no")],
//!         ))
//!         .unwrap()
//!         .await;
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`manager`]: screen registry, render modes, focus/selection, auto-close
//! - [`screen`]: the per-screen message log and prompt state machine
//! - [`prompts`]: typed prompt records, factory, and awaitable handles
//! - [`keyboard`]: key events, binding table, dispatch
//! - [`bindings`]: the default interactive binding set
//! - [`filter`]: message filtering and per-level counts
//! - [`messages`]: the message log data model
//! - [`events`]: change-notification subscriptions
//! - [`line`]: the readline-style fallback contract
//! - [`config`]: TOML configuration file support
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework, and never writes to stdout itself. It's pure orchestration
//! logic that any front-end can drive.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bindings;
pub mod config;
pub mod events;
pub mod filter;
pub mod keyboard;
pub mod line;
pub mod manager;
pub mod messages;
pub mod prompts;
pub mod screen;

// Re-exports for convenience
pub use bindings::install_default_bindings;
pub use config::{
    default_config_path, load_config, load_config_from_path, BehaviorConfig, ConfigError,
    StagehandConfig, UiConfig,
};
pub use events::{ManagerEvent, ScreenEvent, Subscription};
pub use filter::{count_by_level, filter_messages, FilterField, FilterState, LevelCounts};
pub use keyboard::{KeyBinding, KeyCondition, KeyContext, KeyEvent, KeyHandler, KeyboardManager};
pub use line::{DefaultAnswers, LinePrompter};
pub use manager::{
    AutoClose, BindOptions, FocusArea, ManagerSummary, RenderMode, RenderSurface, ScreenManager,
    SurfaceError, DEFAULT_AUTO_CLOSE_DELAY_MS,
};
pub use messages::{
    LoadingState, LogLevel, MessageData, MessageId, MessageKind, ProgressUpdate,
};
pub use prompts::{
    ChoiceRequest, ConfirmRequest, InputRequest, MultiChoiceRequest, PromptChoice, PromptData,
    PromptError, PromptHandle, PromptId, PromptKind, PromptKindTag, PromptValue,
};
pub use screen::{Screen, ScreenId, ScreenOptions, ScreenStatus};
