//! # Core Performance
//!
//! Live-performance navigation through a setlist.
//!
//! [`PerformanceNavigator`] is a small synchronous state machine over the
//! current song list. Every transition is pure computation so that page turns
//! stay immediate regardless of what the cache is doing in the background.

pub mod config;
pub mod keys;
pub mod navigator;

pub use config::NavigatorConfig;
pub use keys::NavKey;
pub use navigator::PerformanceNavigator;
