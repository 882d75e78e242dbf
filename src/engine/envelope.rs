//! Linear ADSR amplitude envelope, evaluated as a pure function of note timing.

use crate::utils::time::ClockTime;

// -------------------------------------------------------------------------------------------------

/// Minimum duration floor in seconds, preventing divisions by zero when an envelope time
/// parameter is set to zero.
pub const EPSILON: f32 = 1e-3;

/// Envelope gains below this threshold count as silent: the scheduler skips grain emission
/// for such voices. Removing silent voices is the registry's sweep responsibility, not the
/// envelope's.
pub const SILENCE_THRESHOLD: f32 = 1e-3; // -60dB

// -------------------------------------------------------------------------------------------------

/// Processing stage of a voice's envelope at some point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    /// After the release phase fully elapsed (zero gain).
    #[default]
    Idle,
}

// -------------------------------------------------------------------------------------------------

/// ADSR envelope parameters which define the envelope shape.
///
/// All times are in seconds, the sustain level is a gain in range \[0.0, 1.0\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParameters {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for AdsrParameters {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.8,
            release: 0.3,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Compute a voice's envelope gain at time `now` from its note-on time and optional
/// note-off time.
///
/// While the note is held, gain ramps linearly from 0.0 to 1.0 over the attack time, then
/// linearly down to the sustain level over the decay time, then holds the sustain level.
///
/// After note-off, gain fades linearly from the sustain level to zero over the release time.
/// The fade always starts at the sustain level, not at the gain the envelope had when the note
/// got released: releasing during attack or decay steps to the sustain based fade, which is an
/// audible discontinuity the engine deliberately keeps.
///
/// The returned gain is always in range \[0.0, 1.0\].
pub fn envelope_gain(
    start_time: ClockTime,
    release_time: Option<ClockTime>,
    now: ClockTime,
    adsr: &AdsrParameters,
) -> f32 {
    let gain = if let Some(release_time) = release_time {
        let tr = (now - release_time) as f32;
        if tr < adsr.release {
            adsr.sustain * (1.0 - tr / adsr.release.max(EPSILON))
        } else {
            0.0
        }
    } else {
        let t = (now - start_time).max(0.0) as f32;
        if t < adsr.attack {
            t / adsr.attack.max(EPSILON)
        } else if t < adsr.attack + adsr.decay {
            1.0 - (1.0 - adsr.sustain) * (t - adsr.attack) / adsr.decay.max(EPSILON)
        } else {
            adsr.sustain
        }
    };
    gain.clamp(0.0, 1.0)
}

/// Classify which [`EnvelopeStage`] a voice is in at time `now`.
pub fn envelope_stage(
    start_time: ClockTime,
    release_time: Option<ClockTime>,
    now: ClockTime,
    adsr: &AdsrParameters,
) -> EnvelopeStage {
    if let Some(release_time) = release_time {
        if ((now - release_time) as f32) < adsr.release {
            EnvelopeStage::Release
        } else {
            EnvelopeStage::Idle
        }
    } else {
        let t = (now - start_time).max(0.0) as f32;
        if t < adsr.attack {
            EnvelopeStage::Attack
        } else if t < adsr.attack + adsr.decay {
            EnvelopeStage::Decay
        } else {
            EnvelopeStage::Sustain
        }
    }
}

// -------------------------------------------------------------------------------------------------
