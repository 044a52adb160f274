//! deskrec Merge Engine
//!
//! Builds and executes the merge plan for a finished recording cycle: the
//! base video's own audio plus every recorded microphone track, each shifted
//! by its start offset, mixed into one normalized stream while the video is
//! stream-copied untouched. Inputs are consumed (deleted) only after the
//! encoder reports success.

pub mod merge;
pub mod plan;

pub use merge::*;
pub use plan::*;
