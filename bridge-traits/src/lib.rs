//! # Host Bridge Traits
//!
//! Abstraction traits for the collaborators that live outside the core.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline content core and the
//! host application. Each trait represents a capability that the core requires
//! but that the host implements on top of its own network, database and UI
//! stack.
//!
//! ## Traits
//!
//! ### Content
//! - [`ContentService`](content::ContentService) - Fetch content payloads and setlist songs
//!
//! ### UI
//! - [`ExitSignal`](ui::ExitSignal) - Receive the navigator's exit request
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for
//! consistent error handling. Host implementations should convert their own
//! errors to `BridgeError` and keep the messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared across async tasks behind an `Arc`.

pub mod content;
pub mod error;
pub mod time;
pub mod ui;

pub use error::BridgeError;

// Re-export commonly used types
pub use content::{ContentKind, ContentService, FetchedContent, SongRef};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
pub use ui::{ExitSignal, NoopExitSignal};
