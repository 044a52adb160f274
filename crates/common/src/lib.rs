//! deskrec Common Utilities
//!
//! Shared infrastructure for all deskrec crates:
//! - Error types and result aliases
//! - Recording clock for per-track offset measurement
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
