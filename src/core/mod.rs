//! Core library modules for butterfly-net
//!
//! Errors and the configuration tables shared by every pipeline stage.

pub mod config;
pub mod error;

// Re-export main types for internal use
pub use config::{HighwayType, LinkTypeDefaults, ModeRules, NetworkConfig, TagRule};
pub use error::{Error, Result};
