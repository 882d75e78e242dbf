#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod engine;
mod error;
mod parameter;

// public, flat re-exports
pub use error::Error;

pub use engine::{
    envelope_gain, envelope_stage, playback_rate_for_note, resolve_placement, window_gain,
    AdsrParameters, ClipWindow, EngineEvent, EngineHandle, EngineParameters, EnvelopeStage,
    FxControl, FxControlSink, FxSendState, GrainPlacement, GrainSink, GrainTrigger,
    GranularEngine, NoteState, PlacementDraw, SampleInfo, SchedulerStatus, SmoothedFxControls,
    VoiceRegistry, BASE_NOTE, MAX_SCHEDULE_LAG, MIN_GRAIN_INTERVAL, MIN_PLAYBACK_RATE,
    SCHEDULE_LOOKAHEAD, SILENCE_THRESHOLD,
};

pub use parameter::FloatParameter;

// public mods
pub mod utils;
