//! Registry of active note voices and their envelope timing state.

use std::collections::BTreeMap;

use super::envelope::{envelope_gain, envelope_stage, AdsrParameters, EnvelopeStage};
use crate::utils::time::ClockTime;

// -------------------------------------------------------------------------------------------------

/// Timing state of a single active note, captured at note-on and note-off.
///
/// The envelope itself is stateless: gains are computed on demand from these timestamps
/// via [`envelope_gain`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteState {
    velocity: f32,
    start_time: ClockTime,
    release_time: Option<ClockTime>,
}

impl NoteState {
    /// The note's velocity in range \[0.0, 1.0\], captured at note-on.
    #[inline(always)]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Engine clock time at note-on.
    #[inline(always)]
    pub fn start_time(&self) -> ClockTime {
        self.start_time
    }

    /// Engine clock time at note-off, or `None` while the note is still held.
    #[inline(always)]
    pub fn release_time(&self) -> Option<ClockTime> {
        self.release_time
    }

    /// Check if the note got released.
    #[inline(always)]
    pub fn is_released(&self) -> bool {
        self.release_time.is_some()
    }

    /// The note's envelope gain at time `now` with the given envelope parameters.
    #[inline]
    pub fn envelope_gain(&self, now: ClockTime, adsr: &AdsrParameters) -> f32 {
        envelope_gain(self.start_time, self.release_time, now, adsr)
    }

    /// The note's envelope stage at time `now` with the given envelope parameters.
    pub fn envelope_stage(&self, now: ClockTime, adsr: &AdsrParameters) -> EnvelopeStage {
        envelope_stage(self.start_time, self.release_time, now, adsr)
    }
}

// -------------------------------------------------------------------------------------------------

/// Owns the set of currently active notes (held or releasing), keyed by note number.
///
/// The registry only tracks timing state: it never computes gains on its own and holds no
/// reference to parameters, so note events can be applied at any time while the scheduler
/// consults the entries once per tick. Released notes stay in the registry until their release
/// phase fully elapsed and [`VoiceRegistry::sweep_expired`] reclaims them, so memory is bounded
/// by the instantaneous polyphony.
#[derive(Debug, Default, Clone)]
pub struct VoiceRegistry {
    notes: BTreeMap<u8, NoteState>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self {
            notes: BTreeMap::new(),
        }
    }

    /// Number of active (held or releasing) notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Check if there are no active notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Access a single note's state, if the note is active.
    pub fn get(&self, note: u8) -> Option<&NoteState> {
        self.notes.get(&note)
    }

    /// Iterate over all active notes and their states. Iteration order carries no meaning.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &NoteState)> {
        self.notes.iter().map(|(note, state)| (*note, state))
    }

    /// Start a voice for the given note, capturing velocity and start time.
    ///
    /// Re-triggering an already held or releasing note restarts its envelope from the attack
    /// phase. There is no legato blending.
    pub fn note_on(&mut self, note: u8, velocity: f32, now: ClockTime) {
        self.notes.insert(
            note,
            NoteState {
                velocity: velocity.clamp(0.0, 1.0),
                start_time: now,
                release_time: None,
            },
        );
    }

    /// Release the given note, keeping it in the registry so the release tail still sounds.
    ///
    /// Releasing an already released note does not move its release time, and releasing an
    /// unknown note is a no-op.
    pub fn note_off(&mut self, note: u8, now: ClockTime) {
        if let Some(state) = self.notes.get_mut(&note) {
            if state.release_time.is_none() {
                state.release_time = Some(now);
            }
        }
    }

    /// Immediately drop all notes, including releasing ones.
    pub fn all_notes_off(&mut self) {
        self.notes.clear();
    }

    /// Remove all notes whose release phase fully elapsed at time `now`.
    ///
    /// Must run once per scheduling tick before emission, so released and decayed voices stop
    /// generating grains and get reclaimed.
    pub fn sweep_expired(&mut self, now: ClockTime, release: f32) {
        self.notes.retain(|_, state| match state.release_time {
            Some(release_time) => now <= release_time + release as ClockTime,
            None => true,
        });
    }
}

// -------------------------------------------------------------------------------------------------
