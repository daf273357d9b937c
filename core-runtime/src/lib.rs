//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the content cache, the
//! performance navigator and the setlist store:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus};
