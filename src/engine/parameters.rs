//! Engine parameter snapshot, clip window and sample description types.

use four_cc::FourCC;

use super::envelope::AdsrParameters;
use crate::{parameter::FloatParameter, Error};

// -------------------------------------------------------------------------------------------------

/// A flat snapshot of all engine parameters.
///
/// The engine consults one snapshot per scheduling tick and replaces it wholesale when hosts
/// push an update, so a tick never observes a partially applied change. Values outside the
/// descriptor ranges get clamped at the input boundary, see [`EngineParameters::clamped`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParameters {
    /// Normalized center position within the clip window grains are drawn from (0.0 - 1.0).
    pub position: f32,
    /// Randomization width around the position (0.0 - 1.0). Each grain's position gets
    /// deflected by up to ± spread before wrapping.
    pub spread: f32,
    /// Length of each grain in seconds (0.01 - 0.5).
    pub grain_size: f32,
    /// Time between grain triggers in seconds (0.01 - 0.5). The scheduler additionally
    /// floors the spacing at 5 ms.
    pub density: f32,
    /// Base playback rate multiplier (0.1 - 4.0). Keyboard notes transpose this rate in
    /// semitones and the drone voice plays it unmodified.
    pub pitch: f32,
    /// Randomized playback rate deflection per grain (0.0 - 1.0).
    pub pitch_spread: f32,
    /// Master volume applied to every emitted grain (0.0 - 1.0).
    pub volume: f32,
    /// Envelope attack time in seconds.
    pub attack: f32,
    /// Envelope decay time in seconds.
    pub decay: f32,
    /// Envelope sustain level (0.0 - 1.0).
    pub sustain: f32,
    /// Envelope release time in seconds.
    pub release: f32,
    /// Delay send: delay time in seconds.
    pub delay_time: f32,
    /// Delay send: feedback amount (0.0 - 0.95).
    pub delay_feedback: f32,
    /// Delay send: wet mix (0.0 - 1.0).
    pub delay_wet: f32,
    /// Reverb send: wet mix (0.0 - 1.0).
    pub reverb_wet: f32,
}

impl EngineParameters {
    // Grain parameters
    pub const POSITION: FloatParameter =
        FloatParameter::new(FourCC(*b"GPOS"), "Position", 0.0..=1.0, 0.5);

    pub const SPREAD: FloatParameter =
        FloatParameter::new(FourCC(*b"GSPR"), "Spread", 0.0..=1.0, 0.1);

    pub const GRAIN_SIZE: FloatParameter =
        FloatParameter::new(FourCC(*b"GSIZ"), "Grain Size", 0.01..=0.5, 0.1).with_unit("s");

    pub const DENSITY: FloatParameter =
        FloatParameter::new(FourCC(*b"GDNS"), "Density", 0.01..=0.5, 0.05).with_unit("s");

    pub const PITCH: FloatParameter =
        FloatParameter::new(FourCC(*b"GPIT"), "Pitch", 0.1..=4.0, 1.0);

    pub const PITCH_SPREAD: FloatParameter =
        FloatParameter::new(FourCC(*b"GPSP"), "Pitch Spread", 0.0..=1.0, 0.0);

    pub const VOLUME: FloatParameter =
        FloatParameter::new(FourCC(*b"GVOL"), "Volume", 0.0..=1.0, 0.8);

    // Envelope parameters
    pub const ATTACK: FloatParameter =
        FloatParameter::new(FourCC(*b"EATK"), "Attack", 0.0..=2.0, 0.01).with_unit("s");

    pub const DECAY: FloatParameter =
        FloatParameter::new(FourCC(*b"EDCY"), "Decay", 0.0..=2.0, 0.1).with_unit("s");

    pub const SUSTAIN: FloatParameter =
        FloatParameter::new(FourCC(*b"ESUS"), "Sustain", 0.0..=1.0, 0.8);

    pub const RELEASE: FloatParameter =
        FloatParameter::new(FourCC(*b"EREL"), "Release", 0.0..=5.0, 0.3).with_unit("s");

    // Effect send parameters
    pub const DELAY_TIME: FloatParameter =
        FloatParameter::new(FourCC(*b"DTIM"), "Delay Time", 0.01..=1.0, 0.3).with_unit("s");

    pub const DELAY_FEEDBACK: FloatParameter =
        FloatParameter::new(FourCC(*b"DFBK"), "Delay Feedback", 0.0..=0.95, 0.4);

    pub const DELAY_WET: FloatParameter =
        FloatParameter::new(FourCC(*b"DWET"), "Delay Wet", 0.0..=1.0, 0.3);

    pub const REVERB_WET: FloatParameter =
        FloatParameter::new(FourCC(*b"RWET"), "Reverb Wet", 0.0..=1.0, 0.3);

    /// All parameter descriptors, e.g. to enumerate controls in hosts.
    pub fn descriptors() -> Vec<FloatParameter> {
        vec![
            Self::POSITION,
            Self::SPREAD,
            Self::GRAIN_SIZE,
            Self::DENSITY,
            Self::PITCH,
            Self::PITCH_SPREAD,
            Self::VOLUME,
            Self::ATTACK,
            Self::DECAY,
            Self::SUSTAIN,
            Self::RELEASE,
            Self::DELAY_TIME,
            Self::DELAY_FEEDBACK,
            Self::DELAY_WET,
            Self::REVERB_WET,
        ]
    }

    /// Copy of this snapshot with every value clamped into its descriptor's valid range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            position: Self::POSITION.clamp_value(self.position),
            spread: Self::SPREAD.clamp_value(self.spread),
            grain_size: Self::GRAIN_SIZE.clamp_value(self.grain_size),
            density: Self::DENSITY.clamp_value(self.density),
            pitch: Self::PITCH.clamp_value(self.pitch),
            pitch_spread: Self::PITCH_SPREAD.clamp_value(self.pitch_spread),
            volume: Self::VOLUME.clamp_value(self.volume),
            attack: Self::ATTACK.clamp_value(self.attack),
            decay: Self::DECAY.clamp_value(self.decay),
            sustain: Self::SUSTAIN.clamp_value(self.sustain),
            release: Self::RELEASE.clamp_value(self.release),
            delay_time: Self::DELAY_TIME.clamp_value(self.delay_time),
            delay_feedback: Self::DELAY_FEEDBACK.clamp_value(self.delay_feedback),
            delay_wet: Self::DELAY_WET.clamp_value(self.delay_wet),
            reverb_wet: Self::REVERB_WET.clamp_value(self.reverb_wet),
        }
    }

    /// The envelope subset of this snapshot.
    pub fn adsr(&self) -> AdsrParameters {
        AdsrParameters {
            attack: self.attack,
            decay: self.decay,
            sustain: self.sustain,
            release: self.release,
        }
    }
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            position: Self::POSITION.default_value(),
            spread: Self::SPREAD.default_value(),
            grain_size: Self::GRAIN_SIZE.default_value(),
            density: Self::DENSITY.default_value(),
            pitch: Self::PITCH.default_value(),
            pitch_spread: Self::PITCH_SPREAD.default_value(),
            volume: Self::VOLUME.default_value(),
            attack: Self::ATTACK.default_value(),
            decay: Self::DECAY.default_value(),
            sustain: Self::SUSTAIN.default_value(),
            release: Self::RELEASE.default_value(),
            delay_time: Self::DELAY_TIME.default_value(),
            delay_feedback: Self::DELAY_FEEDBACK.default_value(),
            delay_wet: Self::DELAY_WET.default_value(),
            reverb_wet: Self::REVERB_WET.default_value(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Normalized sub-region of the loaded sample grains are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    start: f32,
    end: f32,
}

impl ClipWindow {
    /// Create a new clip window from normalized positions within the sample.
    /// Expects `0.0 <= start < end <= 1.0`.
    pub fn new(start: f32, end: f32) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start >= end {
            return Err(Error::ParameterError(format!(
                "Invalid clip window {start}..{end}: expecting 0.0 <= start < end <= 1.0"
            )));
        }
        Ok(Self { start, end })
    }

    /// The window's normalized start position.
    #[inline(always)]
    pub fn start(&self) -> f32 {
        self.start
    }

    /// The window's normalized end position.
    #[inline(always)]
    pub fn end(&self) -> f32 {
        self.end
    }

    /// The window's normalized length.
    #[inline(always)]
    pub fn len(&self) -> f32 {
        self.end - self.start
    }
}

impl Default for ClipWindow {
    /// The full sample.
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Describes the decoded sample the engine slices grains from.
///
/// The engine never touches audio data: hosts decode and own the actual buffer and only hand
/// its duration and frame count here. Emitted grain triggers refer to offsets within it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleInfo {
    duration: f64,
    frame_count: usize,
}

impl SampleInfo {
    /// Create a new sample description from a total duration in seconds and frame count.
    pub fn new(duration: f64, frame_count: usize) -> Result<Self, Error> {
        if !duration.is_finite() || duration <= 0.0 || frame_count == 0 {
            return Err(Error::ParameterError(format!(
                "Invalid sample info: duration {duration} s, {frame_count} frames"
            )));
        }
        Ok(Self {
            duration,
            frame_count,
        })
    }

    /// The sample's total duration in seconds.
    #[inline(always)]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The sample's total length in frames.
    #[inline(always)]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The sample rate implied by duration and frame count.
    pub fn sample_rate(&self) -> f64 {
        self.frame_count as f64 / self.duration
    }
}

// -------------------------------------------------------------------------------------------------
