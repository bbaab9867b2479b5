//! radio_repeat: repetition and overlap analysis of radio "now playing" logs.
//!
//! Loading, normalization and the analyses live here.
//! The `radio-repeat` CLI consumes this crate.

pub mod config;
pub mod error;
pub mod normalize;
pub mod overlap;
pub mod play;
pub mod playlog;
pub mod repetition;
pub mod report;
pub mod station;

pub use error::{Error, Result};
