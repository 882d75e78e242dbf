//! Grain placement: resolves randomized source offsets, durations and playback rates.

use rand::Rng;

use super::parameters::{ClipWindow, EngineParameters};
use crate::utils::time::ClockTime;

// -------------------------------------------------------------------------------------------------

/// Lowest keyboard note. Playing it maps to the unmodified pitch parameter.
pub const BASE_NOTE: u8 = 48;

/// Floor for grain playback rates, preventing zero or negative rates after pitch deflection.
pub const MIN_PLAYBACK_RATE: f32 = 0.1;

/// Normalized width of the grain window's fade-in and fade-out ramps.
const WINDOW_RAMP_WIDTH: f32 = 0.2;

// -------------------------------------------------------------------------------------------------

/// A fully resolved command to play back a single grain.
///
/// Produced fresh by the scheduler for every grain and handed to the rendering sink right away.
/// The engine never retains trigger commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainTrigger {
    /// Offset into the loaded sample in seconds where grain playback starts.
    pub source_offset: f64,
    /// Length of the grain in seconds.
    pub duration: f32,
    /// Playback rate multiplier (1.0 plays the excerpt at its original pitch).
    pub playback_rate: f32,
    /// Peak amplitude of the grain. The per-grain window shapes the actual amplitude
    /// over time, see [`window_gain`].
    pub peak_gain: f32,
    /// Engine clock time at which the grain is scheduled to start.
    pub start_time: ClockTime,
}

// -------------------------------------------------------------------------------------------------

/// Evaluate the per-grain amplitude window at a normalized phase in \[0.0, 1.0\] of the
/// grain's duration.
///
/// The window is a trapezoid: a linear ramp from zero to full level over the first 20% of the
/// grain, full level through 80%, and a linear ramp back to zero over the last 20%. Rendering
/// sinks apply this shape to every triggered grain.
#[inline]
pub fn window_gain(phase: f32) -> f32 {
    debug_assert!((0.0..=1.0).contains(&phase), "Invalid window phase");
    if phase < WINDOW_RAMP_WIDTH {
        phase / WINDOW_RAMP_WIDTH
    } else if phase > 1.0 - WINDOW_RAMP_WIDTH {
        (1.0 - phase) / WINDOW_RAMP_WIDTH
    } else {
        1.0
    }
}

/// Playback rate for a keyboard note with the given pitch parameter: every semitone above
/// [`BASE_NOTE`] raises the rate by a factor of 2^(1/12), so one octave doubles it.
#[inline]
pub fn playback_rate_for_note(note: u8, pitch: f32) -> f32 {
    pitch * 2.0f32.powf((note as f32 - BASE_NOTE as f32) / 12.0)
}

// -------------------------------------------------------------------------------------------------

/// Uniform random draws in \[-1.0, 1.0\], fixing the randomized part of a grain's placement.
///
/// Separating the draws from [`resolve_placement`] keeps placement itself a pure function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementDraw {
    /// Position deflection, scaled by the spread parameter.
    pub offset: f32,
    /// Playback rate deflection, scaled by the pitch spread parameter.
    pub pitch: f32,
}

impl PlacementDraw {
    /// A draw without any random deflection.
    pub const CENTERED: Self = Self {
        offset: 0.0,
        pitch: 0.0,
    };

    /// Draw fresh placement randomization from the given generator.
    #[inline]
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            offset: rng.random::<f32>() * 2.0 - 1.0,
            pitch: rng.random::<f32>() * 2.0 - 1.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Resolved source offset and playback rate for a single grain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainPlacement {
    /// Offset into the sample in seconds.
    pub source_offset: f64,
    /// Final playback rate after pitch deflection.
    pub playback_rate: f32,
}

/// Resolve where in the sample a grain reads from and at which rate it plays.
///
/// The grain's position is the position parameter deflected by `draw.offset` times the spread,
/// wrapped into \[0.0, 1.0\] and mapped through the clip window into an absolute sample offset.
/// Grains which would overrun the sample end get shifted back so they fit. The playback rate
/// is deflected by `draw.pitch` times the pitch spread, floored at [`MIN_PLAYBACK_RATE`].
pub fn resolve_placement(
    parameters: &EngineParameters,
    clip: &ClipWindow,
    playback_rate: f32,
    sample_duration: f64,
    draw: PlacementDraw,
) -> GrainPlacement {
    debug_assert!(sample_duration > 0.0, "Invalid sample duration");
    debug_assert!(
        (-1.0..=1.0).contains(&draw.offset) && (-1.0..=1.0).contains(&draw.pitch),
        "Invalid placement draw"
    );

    // Deflect the position parameter and wrap into [0.0, 1.0]. A single wrap is enough:
    // with position and spread in [0.0, 1.0] the deflected position stays within [-1.0, 2.0].
    let mut relative_pos = parameters.position + draw.offset * parameters.spread;
    if relative_pos < 0.0 {
        relative_pos += 1.0;
    } else if relative_pos > 1.0 {
        relative_pos -= 1.0;
    }

    // Map into the clip window, then into an absolute offset within the sample.
    // The clamp guards against float edge cases after wrapping.
    let absolute_pos = (clip.start() + relative_pos * clip.len()).clamp(0.0, 1.0);
    let mut source_offset = absolute_pos as f64 * sample_duration;

    // Shift the grain back when it would overrun the sample end
    if source_offset + parameters.grain_size as f64 > sample_duration {
        source_offset = (sample_duration - parameters.grain_size as f64).max(0.0);
    }

    let playback_rate =
        (playback_rate * (1.0 + draw.pitch * parameters.pitch_spread)).max(MIN_PLAYBACK_RATE);

    GrainPlacement {
        source_offset,
        playback_rate,
    }
}

// -------------------------------------------------------------------------------------------------
