//! Common helpers for engine clocks and parameter value smoothing.

pub mod smoothed;
pub mod time;
