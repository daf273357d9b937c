//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-content`, `core-performance`, `core-library`).
//! Host applications can depend on `gigbook-workspace` and enable the
//! documented features without needing to wire each crate individually.

#[cfg(feature = "offline-cache")]
pub use core_content as content;

#[cfg(feature = "setlists")]
pub use core_library as library;

#[cfg(feature = "performance")]
pub use core_performance as performance;
