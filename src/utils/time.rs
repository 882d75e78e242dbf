use std::time::Instant;

// -------------------------------------------------------------------------------------------------

/// Engine clock timestamp or span in seconds.
pub type ClockTime = f64;

// -------------------------------------------------------------------------------------------------

/// A monotonic clock which drives the engine's scheduling loop.
///
/// The engine never reads time by itself: the external driver queries the clock and passes the
/// current time into each tick, so hosts can run the engine against an audio context's transport
/// time, wall-clock time or a synthetic clock in tests.
pub trait EngineClock {
    /// Get the current time in seconds. Must be monotonically increasing.
    fn now(&self) -> ClockTime;
}

// -------------------------------------------------------------------------------------------------

/// [`EngineClock`] impl which measures wall-clock seconds since the clock got created.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start_time: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineClock for SystemClock {
    fn now(&self) -> ClockTime {
        self.start_time.elapsed().as_secs_f64()
    }
}

// -------------------------------------------------------------------------------------------------
