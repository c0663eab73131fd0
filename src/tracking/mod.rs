//! Supplemental hand-tracking and eye-gaze metrics
//!
//! These streams come from offline perception services rather than the head
//! pose stream, so they are optional inputs: each analyzer returns `None` when
//! its stream is absent or too sparse.

pub mod gaze;
pub mod hand;

pub use gaze::GazeAnalyzer;
pub use hand::HandAnalyzer;
