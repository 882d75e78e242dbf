//! The granular engine core: a lookahead grain scheduler driving note voices and a drone.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crossbeam_queue::ArrayQueue;
use rand::{rngs::SmallRng, SeedableRng};

use crate::{utils::time::ClockTime, Error};

// -------------------------------------------------------------------------------------------------

mod envelope;
mod grain;
mod parameters;
mod sends;
mod voice;

pub use envelope::{
    envelope_gain, envelope_stage, AdsrParameters, EnvelopeStage, SILENCE_THRESHOLD,
};
pub use grain::{
    playback_rate_for_note, resolve_placement, window_gain, GrainPlacement, GrainTrigger,
    PlacementDraw, BASE_NOTE, MIN_PLAYBACK_RATE,
};
pub use parameters::{ClipWindow, EngineParameters, SampleInfo};
pub use sends::{FxControl, FxControlSink, FxSendState, SmoothedFxControls};
pub use voice::{NoteState, VoiceRegistry};

// -------------------------------------------------------------------------------------------------

/// How far ahead of the clock grains get scheduled, in seconds.
///
/// Drivers must tick the engine at least this often to keep emission gapless. The intended
/// tick rate is considerably higher, around 60 ticks per second.
pub const SCHEDULE_LOOKAHEAD: ClockTime = 0.1;

/// Lower bound for the spacing between two grain slots, in seconds.
pub const MIN_GRAIN_INTERVAL: ClockTime = 0.005;

/// When the grain cursor falls further than this behind the clock, it snaps forward to the
/// current time instead of emitting a catch up burst of grains.
pub const MAX_SCHEDULE_LAG: ClockTime = 0.2;

// -------------------------------------------------------------------------------------------------

/// Control events for a [`GranularEngine`], sent from other threads via [`EngineHandle`]s.
///
/// Events get drained and applied at the start of the next [`GranularEngine::tick`] call,
/// using that tick's clock time.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Start a new note voice.
    NoteOn { note: u8, velocity: f32 },
    /// Release a playing note voice.
    NoteOff { note: u8 },
    /// Immediately remove all playing note voices.
    AllNotesOff,
    /// Replace the engine's parameter snapshot.
    SetParameters(EngineParameters),
    /// Change the clip window grains are drawn from.
    SetClipWindow(ClipWindow),
    /// Arm or disarm the continuously sounding drone voice.
    SetDroneArmed(bool),
    /// Load or unload the sample description grains refer to.
    SetSample(Option<SampleInfo>),
}

// -------------------------------------------------------------------------------------------------

/// Status of a [`GranularEngine`] after a scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Grains are scheduled or voices are held: keep ticking.
    Running,
    /// All voices ended and the drone is disarmed. Drivers may pause ticking until the
    /// engine gets started again with a note on or by arming the drone.
    Stopped,
}

// -------------------------------------------------------------------------------------------------

/// Receiver for grains resolved by a [`GranularEngine`].
///
/// The engine decides when and how grains play, sinks turn them into sound. Triggers arrive
/// up to [`SCHEDULE_LOOKAHEAD`] seconds ahead of their start time, ordered by start time
/// within each tick.
pub trait GrainSink {
    /// Take over a single resolved grain for rendering.
    fn trigger_grain(&mut self, grain: GrainTrigger);
}

// -------------------------------------------------------------------------------------------------

/// A cloneable handle to control a [`GranularEngine`] from other threads.
///
/// All events are queued and take effect at the start of the engine's next tick. Out of range
/// note numbers, velocities and parameter values get clamped when the event is applied.
#[derive(Clone)]
pub struct EngineHandle {
    running: Arc<AtomicBool>,
    event_queue: Arc<ArrayQueue<EngineEvent>>,
}

impl EngineHandle {
    /// Check if the engine currently schedules grains.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start a new note voice.
    pub fn note_on(&self, note: u8, velocity: f32) -> Result<(), Error> {
        self.send_event(EngineEvent::NoteOn { note, velocity }, "note_on")
    }

    /// Release a playing note voice.
    pub fn note_off(&self, note: u8) -> Result<(), Error> {
        self.send_event(EngineEvent::NoteOff { note }, "note_off")
    }

    /// Immediately remove all playing note voices.
    pub fn all_notes_off(&self) -> Result<(), Error> {
        self.send_event(EngineEvent::AllNotesOff, "all_notes_off")
    }

    /// Replace the engine's parameter snapshot.
    pub fn set_parameters(&self, parameters: EngineParameters) -> Result<(), Error> {
        self.send_event(EngineEvent::SetParameters(parameters), "set_parameters")
    }

    /// Change the clip window grains are drawn from.
    pub fn set_clip_window(&self, clip: ClipWindow) -> Result<(), Error> {
        self.send_event(EngineEvent::SetClipWindow(clip), "set_clip_window")
    }

    /// Arm or disarm the continuously sounding drone voice.
    pub fn set_drone_armed(&self, armed: bool) -> Result<(), Error> {
        self.send_event(EngineEvent::SetDroneArmed(armed), "set_drone_armed")
    }

    /// Load or unload the sample description grains refer to.
    pub fn set_sample(&self, sample: Option<SampleInfo>) -> Result<(), Error> {
        self.send_event(EngineEvent::SetSample(sample), "set_sample")
    }

    fn send_event(&self, event: EngineEvent, event_name: &str) -> Result<(), Error> {
        if self.event_queue.push(event).is_err() {
            log::warn!("Engine event queue is full. Failed to send a {event_name} event.");
            return Err(Error::SendError("Engine event queue is full".to_string()));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Schedules grains for all active voices ahead of a monotonic clock.
///
/// The engine holds no audio data and renders no audio itself: it consumes note and parameter
/// changes, keeps per note envelope state and resolves randomized grain placements, then emits
/// [`GrainTrigger`]s into a [`GrainSink`] up to [`SCHEDULE_LOOKAHEAD`] seconds ahead of time.
///
/// Drive it by calling [`tick`](Self::tick) at a regular rate from a timer or audio callback.
/// Control it either directly through its `&mut self` functions or from other threads through
/// cloneable [`EngineHandle`]s.
pub struct GranularEngine {
    parameters: EngineParameters,
    clip: ClipWindow,
    sample: Option<SampleInfo>,
    voices: VoiceRegistry,
    drone_armed: bool,
    next_grain_time: ClockTime,
    running: Arc<AtomicBool>,
    event_queue: Arc<ArrayQueue<EngineEvent>>,
    fx_sends: FxSendState,
    rng: SmallRng,
}

impl GranularEngine {
    /// Size of the handle event queue.
    const EVENT_QUEUE_SIZE: usize = 1024;

    /// Create a new engine with the given initial parameters and no sample loaded.
    pub fn new(parameters: EngineParameters) -> Self {
        Self {
            parameters: parameters.clamped(),
            clip: ClipWindow::default(),
            sample: None,
            voices: VoiceRegistry::new(),
            drone_armed: false,
            next_grain_time: 0.0,
            running: Arc::new(AtomicBool::new(false)),
            event_queue: Arc::new(ArrayQueue::new(Self::EVENT_QUEUE_SIZE)),
            fx_sends: FxSendState::new(),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Create a new cloneable handle to control this engine from other threads.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            running: Arc::clone(&self.running),
            event_queue: Arc::clone(&self.event_queue),
        }
    }

    /// The engine's current parameter snapshot.
    pub fn parameters(&self) -> &EngineParameters {
        &self.parameters
    }

    /// The clip window grains are drawn from.
    pub fn clip_window(&self) -> ClipWindow {
        self.clip
    }

    /// The currently loaded sample description, if any.
    pub fn sample(&self) -> Option<SampleInfo> {
        self.sample
    }

    /// The currently playing note voices.
    pub fn voices(&self) -> &VoiceRegistry {
        &self.voices
    }

    /// Check if the drone voice is armed.
    pub fn drone_armed(&self) -> bool {
        self.drone_armed
    }

    /// Check if the engine currently schedules grains.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start a new note voice. Starting an already playing note restarts its envelope.
    ///
    /// Velocities get clamped into range 0.0..=1.0 and notes above the MIDI range play as 127.
    pub fn note_on(&mut self, note: u8, velocity: f32, now: ClockTime) {
        self.start_scheduling(now);
        self.voices.note_on(note.min(127), velocity, now);
    }

    /// Release a playing note voice, starting its envelope release fade at time `now`.
    /// Releasing an unknown or already released note is a no-op.
    pub fn note_off(&mut self, note: u8, now: ClockTime) {
        self.voices.note_off(note.min(127), now);
    }

    /// Immediately remove all playing note voices, without release fades.
    pub fn all_notes_off(&mut self) {
        self.voices.all_notes_off();
    }

    /// Replace the engine's parameter snapshot. Out of range values get clamped.
    pub fn set_parameters(&mut self, parameters: EngineParameters) {
        self.parameters = parameters.clamped();
    }

    /// Change the clip window grains are drawn from.
    pub fn set_clip_window(&mut self, clip: ClipWindow) {
        self.clip = clip;
    }

    /// Arm or disarm the continuously sounding drone voice.
    pub fn set_drone_armed(&mut self, armed: bool, now: ClockTime) {
        if armed {
            self.start_scheduling(now);
        }
        self.drone_armed = armed;
    }

    /// Load or unload the sample description grains refer to. Without a sample the engine
    /// keeps running but emits no grains.
    pub fn set_sample(&mut self, sample: Option<SampleInfo>) {
        self.sample = sample;
    }

    /// Forward changed effect send values to the given sink. The first call after engine
    /// creation pushes every control, later calls only actual changes.
    pub fn sync_fx_sends(&mut self, sink: &mut impl FxControlSink) {
        self.fx_sends.sync(&self.parameters, sink);
    }

    /// Run one scheduler tick at clock time `now`, emitting all grains due within the
    /// lookahead horizon into the given sink.
    ///
    /// Pending handle events get applied first, then expired voices are swept. Grain slots
    /// are spaced by the density parameter, floored at [`MIN_GRAIN_INTERVAL`]. When ticking
    /// stalled for more than [`MAX_SCHEDULE_LAG`] seconds, the grain cursor resyncs to `now`
    /// instead of bursting out all missed grains.
    ///
    /// Returns [`SchedulerStatus::Stopped`] when all voices ended and the drone is disarmed.
    pub fn tick(&mut self, now: ClockTime, sink: &mut impl GrainSink) -> SchedulerStatus {
        self.process_events(now);
        self.voices.sweep_expired(now, self.parameters.release);

        if !self.running.load(Ordering::Relaxed) {
            return SchedulerStatus::Stopped;
        }

        let lag = now - self.next_grain_time;
        if lag > MAX_SCHEDULE_LAG {
            log::debug!("Grain scheduling fell {lag:.3} seconds behind. Resyncing...");
            self.next_grain_time = now;
        }

        let horizon = now + SCHEDULE_LOOKAHEAD;
        while self.next_grain_time < horizon {
            self.emit_grain_slot(self.next_grain_time, sink);
            self.next_grain_time += (self.parameters.density as ClockTime).max(MIN_GRAIN_INTERVAL);
        }

        if self.voices.is_empty() && !self.drone_armed {
            self.running.store(false, Ordering::Relaxed);
            return SchedulerStatus::Stopped;
        }
        SchedulerStatus::Running
    }

    /// Drain and apply all pending handle events.
    fn process_events(&mut self, now: ClockTime) {
        while let Some(event) = self.event_queue.pop() {
            match event {
                EngineEvent::NoteOn { note, velocity } => {
                    self.note_on(note, velocity, now);
                }
                EngineEvent::NoteOff { note } => {
                    self.note_off(note, now);
                }
                EngineEvent::AllNotesOff => {
                    self.all_notes_off();
                }
                EngineEvent::SetParameters(parameters) => {
                    self.set_parameters(parameters);
                }
                EngineEvent::SetClipWindow(clip) => {
                    self.set_clip_window(clip);
                }
                EngineEvent::SetDroneArmed(armed) => {
                    self.set_drone_armed(armed, now);
                }
                EngineEvent::SetSample(sample) => {
                    self.set_sample(sample);
                }
            }
        }
    }

    /// Mark the engine as running and reset the grain cursor when it was stopped before.
    fn start_scheduling(&mut self, now: ClockTime) {
        if !self.running.swap(true, Ordering::Relaxed) {
            self.next_grain_time = now;
        }
    }

    /// Resolve and emit all grains due at a single scheduling slot.
    fn emit_grain_slot(&mut self, slot_time: ClockTime, sink: &mut impl GrainSink) {
        let Some(sample) = self.sample else {
            // No sample loaded: emit nothing but keep the cursor moving
            return;
        };

        let parameters = self.parameters;
        let clip = self.clip;
        let adsr = parameters.adsr();

        if self.drone_armed {
            let draw = PlacementDraw::random(&mut self.rng);
            let placement =
                resolve_placement(&parameters, &clip, parameters.pitch, sample.duration(), draw);
            sink.trigger_grain(GrainTrigger {
                source_offset: placement.source_offset,
                duration: parameters.grain_size,
                playback_rate: placement.playback_rate,
                peak_gain: parameters.volume,
                start_time: slot_time,
            });
        }

        for (note, state) in self.voices.iter() {
            let envelope = state.envelope_gain(slot_time, &adsr);
            if envelope <= SILENCE_THRESHOLD {
                continue;
            }
            let draw = PlacementDraw::random(&mut self.rng);
            let note_rate = playback_rate_for_note(note, parameters.pitch);
            let placement =
                resolve_placement(&parameters, &clip, note_rate, sample.duration(), draw);
            sink.trigger_grain(GrainTrigger {
                source_offset: placement.source_offset,
                duration: parameters.grain_size,
                playback_rate: placement.playback_rate,
                peak_gain: state.velocity() * envelope * parameters.volume,
                start_time: slot_time,
            });
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        grains: Vec<GrainTrigger>,
    }

    impl GrainSink for RecordingSink {
        fn trigger_grain(&mut self, grain: GrainTrigger) {
            self.grains.push(grain);
        }
    }

    fn test_parameters() -> EngineParameters {
        EngineParameters {
            spread: 0.0,
            pitch_spread: 0.0,
            attack: 0.0,
            sustain: 1.0,
            volume: 1.0,
            ..EngineParameters::default()
        }
    }

    fn test_engine() -> GranularEngine {
        let mut engine = GranularEngine::new(test_parameters());
        engine.set_sample(Some(SampleInfo::new(10.0, 441_000).unwrap()));
        engine
    }

    #[test]
    fn test_tick_schedules_grains_ahead() {
        let mut engine = test_engine();
        let mut sink = RecordingSink::default();

        engine.note_on(60, 1.0, 0.0);
        assert!(engine.is_running());

        // First tick fills the lookahead horizon with slots spaced by the density
        assert_eq!(engine.tick(0.0, &mut sink), SchedulerStatus::Running);
        assert_eq!(sink.grains.len(), 2);
        assert_eq!(sink.grains[0].start_time, 0.0);
        assert!((sink.grains[1].start_time - 0.05).abs() < 1e-6);
        for grain in &sink.grains {
            assert!(grain.start_time < SCHEDULE_LOOKAHEAD);
            assert_eq!(grain.peak_gain, 1.0);
            assert_eq!(grain.duration, engine.parameters().grain_size);
        }

        // The next tick only schedules what newly entered the horizon
        sink.grains.clear();
        assert_eq!(engine.tick(1.0 / 60.0, &mut sink), SchedulerStatus::Running);
        assert_eq!(sink.grains.len(), 1);
        assert!((sink.grains[0].start_time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_grain_spacing_is_floored() {
        let mut engine = test_engine();
        let mut sink = RecordingSink::default();

        // Zero density, set directly behind the clamped setter, must not stall the cursor
        engine.parameters.density = 0.0;
        engine.note_on(60, 1.0, 0.0);
        engine.tick(0.0, &mut sink);

        let mut expected = 0;
        let mut slot_time = 0.0;
        while slot_time < SCHEDULE_LOOKAHEAD {
            expected += 1;
            slot_time += MIN_GRAIN_INTERVAL;
        }
        assert_eq!(sink.grains.len(), expected);
        for pair in sink.grains.windows(2) {
            assert!(pair[1].start_time - pair[0].start_time >= MIN_GRAIN_INTERVAL - 1e-9);
        }
    }

    #[test]
    fn test_resync_after_stall() {
        let mut engine = test_engine();
        let mut sink = RecordingSink::default();

        engine.note_on(60, 1.0, 0.0);
        engine.tick(0.0, &mut sink);
        assert_eq!(sink.grains.len(), 2);

        // After a long stall the cursor snaps to the current time instead of
        // emitting a burst of all missed grains
        sink.grains.clear();
        engine.tick(1.0, &mut sink);
        assert_eq!(sink.grains.len(), 2);
        for grain in &sink.grains {
            assert!(grain.start_time >= 1.0);
        }
    }

    #[test]
    fn test_catch_up_below_resync_threshold() {
        let mut engine = test_engine();
        let mut sink = RecordingSink::default();

        engine.note_on(60, 1.0, 0.0);
        engine.tick(0.0, &mut sink);
        sink.grains.clear();

        // A small scheduling gap gets caught up on, late grains included
        engine.tick(0.25, &mut sink);
        assert_eq!(sink.grains.len(), 5);
        assert!((sink.grains[0].start_time - 0.1).abs() < 1e-6);
        assert!(sink.grains.last().unwrap().start_time < 0.25 + SCHEDULE_LOOKAHEAD);
    }

    #[test]
    fn test_stops_after_last_voice_expires() {
        let mut engine = test_engine();
        let mut sink = RecordingSink::default();

        engine.note_on(60, 1.0, 0.0);
        engine.tick(0.0, &mut sink);
        engine.note_off(60, 0.1);

        // Default release is 0.3 seconds: the voice expires at 0.4
        assert_eq!(engine.tick(0.41, &mut sink), SchedulerStatus::Stopped);
        assert!(engine.voices().is_empty());
        assert!(!engine.is_running());

        // Stopped engines emit nothing
        let emitted = sink.grains.len();
        assert_eq!(engine.tick(0.5, &mut sink), SchedulerStatus::Stopped);
        assert_eq!(sink.grains.len(), emitted);
    }

    #[test]
    fn test_drone_keeps_engine_running() {
        let mut engine = test_engine();
        let mut sink = RecordingSink::default();

        engine.set_drone_armed(true, 0.0);
        assert!(engine.is_running());
        assert_eq!(engine.tick(0.0, &mut sink), SchedulerStatus::Running);
        assert_eq!(sink.grains.len(), 2);
        for grain in &sink.grains {
            // Drone grains play the unmodified pitch parameter at full gain
            assert_eq!(grain.playback_rate, engine.parameters().pitch);
            assert_eq!(grain.peak_gain, engine.parameters().volume);
        }

        // A held note doubles the emission per slot
        sink.grains.clear();
        engine.note_on(48, 1.0, 1.0 / 60.0);
        engine.tick(1.0 / 60.0, &mut sink);
        assert_eq!(sink.grains.len(), 2);

        // Disarming with no held notes stops the engine
        engine.all_notes_off();
        engine.set_drone_armed(false, 0.1);
        assert_eq!(engine.tick(0.1, &mut sink), SchedulerStatus::Stopped);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_envelope_shapes_grain_gain() {
        let mut engine = GranularEngine::new(EngineParameters {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.8,
            ..test_parameters()
        });
        engine.set_sample(Some(SampleInfo::new(10.0, 441_000).unwrap()));
        let mut sink = RecordingSink::default();

        engine.note_on(60, 1.0, 0.0);
        engine.tick(0.0, &mut sink);

        // At note start the envelope is still silent, so only the second slot emits,
        // halfway into the attack
        assert_eq!(sink.grains.len(), 1);
        assert!((sink.grains[0].start_time - 0.05).abs() < 1e-6);
        assert!((sink.grains[0].peak_gain - 0.5).abs() < 1e-4);
        assert_eq!(
            sink.grains[0].playback_rate,
            playback_rate_for_note(60, engine.parameters().pitch)
        );
    }

    #[test]
    fn test_release_fades_and_sweeps_voice() {
        let mut engine = GranularEngine::new(EngineParameters {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.8,
            release: 0.5,
            ..test_parameters()
        });
        engine.set_sample(Some(SampleInfo::new(10.0, 441_000).unwrap()));
        let mut sink = RecordingSink::default();

        engine.note_on(48, 1.0, 0.0);
        engine.tick(0.0, &mut sink);
        engine.tick(1.0, &mut sink);
        sink.grains.clear();

        // Release at 1.0: grains fade from the sustain level down to zero over 0.5 seconds
        engine.note_off(48, 1.0);
        assert_eq!(engine.tick(1.25, &mut sink), SchedulerStatus::Running);
        assert_eq!(sink.grains.len(), 5);
        for pair in sink.grains.windows(2) {
            assert!(pair[1].peak_gain < pair[0].peak_gain);
        }
        let grain = sink
            .grains
            .iter()
            .find(|grain| (grain.start_time - 1.25).abs() < 1e-3)
            .unwrap();
        assert!((grain.peak_gain - 0.4).abs() < 1e-4);

        // Past the release end the voice gets swept and the engine stops
        assert_eq!(engine.tick(1.6, &mut sink), SchedulerStatus::Stopped);
        assert!(engine.voices().is_empty());
    }

    #[test]
    fn test_missing_sample_advances_cursor() {
        let mut engine = GranularEngine::new(test_parameters());
        let mut sink = RecordingSink::default();

        engine.note_on(60, 1.0, 0.0);
        assert_eq!(engine.tick(0.0, &mut sink), SchedulerStatus::Running);
        assert!(sink.grains.is_empty());

        // Loading a sample later resumes emission where the cursor left off
        engine.set_sample(Some(SampleInfo::new(10.0, 441_000).unwrap()));
        engine.tick(1.0 / 60.0, &mut sink);
        assert_eq!(sink.grains.len(), 1);
        assert!((sink.grains[0].start_time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_handle_controls_engine() {
        let mut engine = test_engine();
        let handle = engine.handle();
        let mut sink = RecordingSink::default();

        handle.note_on(60, 2.0).unwrap();
        handle.set_drone_armed(true).unwrap();
        handle
            .set_parameters(EngineParameters {
                volume: 0.5,
                ..test_parameters()
            })
            .unwrap();
        handle
            .set_clip_window(ClipWindow::new(0.25, 0.75).unwrap())
            .unwrap();
        assert!(!handle.is_running());

        // All queued events apply at the start of the next tick
        engine.tick(0.0, &mut sink);
        assert!(handle.is_running());
        assert_eq!(engine.voices().len(), 1);
        assert_eq!(engine.voices().get(60).unwrap().velocity(), 1.0);
        assert!(engine.drone_armed());
        assert_eq!(engine.parameters().volume, 0.5);
        assert_eq!(engine.clip_window(), ClipWindow::new(0.25, 0.75).unwrap());

        handle.all_notes_off().unwrap();
        handle.set_drone_armed(false).unwrap();
        assert_eq!(engine.tick(1.0 / 60.0, &mut sink), SchedulerStatus::Stopped);
        assert!(engine.voices().is_empty());
        assert!(!handle.is_running());
    }

    #[test]
    fn test_handle_queue_full() {
        let engine = test_engine();
        let handle = engine.handle();

        for _ in 0..GranularEngine::EVENT_QUEUE_SIZE {
            handle.note_off(60).unwrap();
        }
        assert!(matches!(handle.note_off(60), Err(Error::SendError(_))));
    }

    #[test]
    fn test_fx_sends_sync_through_engine() {
        #[derive(Default)]
        struct RecordingFxSink {
            calls: Vec<(FxControl, f32)>,
        }
        impl FxControlSink for RecordingFxSink {
            fn set_smoothed(&mut self, control: FxControl, target: f32, _time_constant: f32) {
                self.calls.push((control, target));
            }
        }

        let mut engine = test_engine();
        let mut sink = RecordingFxSink::default();

        engine.sync_fx_sends(&mut sink);
        assert_eq!(sink.calls.len(), 4);

        sink.calls.clear();
        engine.sync_fx_sends(&mut sink);
        assert!(sink.calls.is_empty());

        engine.set_parameters(EngineParameters {
            reverb_wet: 0.9,
            ..test_parameters()
        });
        engine.sync_fx_sends(&mut sink);
        assert_eq!(sink.calls, vec![(FxControl::ReverbWet, 0.9)]);
    }
}
