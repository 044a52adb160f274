//! deskrec Capture Engine
//!
//! Orchestrates the external encoder binary for desktop recording: spawns
//! and watches capture subprocesses, signals graceful stops, reassembles
//! segmented captures, and enumerates audio input devices.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │               SessionRegistry                     │
//! │  ┌───────────────┐      ┌───────────────┐         │
//! │  │ Video session │      │ Audio session │  tracks │
//! │  │  encoder proc │      │  encoder proc │  map    │
//! │  │  watcher task │      │  watcher task │         │
//! │  └───────┬───────┘      └───────┬───────┘         │
//! │          ▼                      ▼                 │
//! │   shards ─► reassemble   mic.wav + offset         │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The registry owns at most one video and one audio session. Each session
//! owns its subprocess; a detached watcher task observes exit and drives the
//! state machine, and a fire-and-forget stop task delivers the graceful-quit
//! byte. Completion is observed by polling session state, never by blocking
//! the caller.

pub mod command;
pub mod devices;
pub mod reassemble;
pub mod registry;
pub mod session;

pub use registry::*;
pub use session::*;
