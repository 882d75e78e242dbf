//! An offline example rendering a scripted granular performance into a WAV file.

use std::f32::consts::{PI, TAU};

use granulate::{
    utils::time::ClockTime, window_gain, ClipWindow, EngineParameters, Error, FxControl,
    GrainSink, GrainTrigger, GranularEngine, SampleInfo, SchedulerStatus, SmoothedFxControls,
};

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

// -------------------------------------------------------------------------------------------------

// Render parameters (tweak as needed!)

/// Path of the rendered output file.
const OUTPUT_PATH: &str = "render-grains.wav";
/// Source and output sample rate.
const SAMPLE_RATE: u32 = 44100;
/// Scheduler tick rate in ticks per second.
const TICK_RATE: f64 = 60.0;
/// Total length of the rendered performance in seconds.
const RENDER_SECONDS: f64 = 8.0;
/// Length of the generated source tone in seconds.
const SOURCE_SECONDS: f64 = 2.0;

// Granular parameters
const GRAIN_SIZE: f32 = 0.15; // 0.01s - 0.5s
const GRAIN_DENSITY: f32 = 0.03; // 0.01s - 0.5s between grains
const GRAIN_POSITION: f32 = 0.35; // 0.0 = clip start, 1.0 = clip end
const GRAIN_SPREAD: f32 = 0.2; // 0.0 = fixed position, 1.0 = full random
const GRAIN_PITCH_SPREAD: f32 = 0.1; // 0.0 = no deflection, 1.0 = full random

// Envelope parameters
const ATTACK: f32 = 0.4;
const DECAY: f32 = 0.3;
const SUSTAIN: f32 = 0.7;
const RELEASE: f32 = 1.2;

// Effect send parameters
const DELAY_TIME: f32 = 0.35;
const DELAY_FEEDBACK: f32 = 0.45;
const DELAY_WET: f32 = 0.35;

/// Scripted notes: start time, hold duration, note number and velocity.
const NOTES: [(f64, f64, u8, f32); 4] = [
    (0.0, 3.0, 48, 0.9), // C3
    (0.5, 3.0, 55, 0.7), // G3
    (1.0, 3.5, 60, 0.8), // C4
    (2.0, 2.5, 64, 0.6), // E4
];

/// When to drift the grain position and pitch down.
const POSITION_SHIFT_TIME: f64 = 4.0;
/// When to arm and disarm the drone voice.
const DRONE_ARM_TIME: f64 = 4.5;
const DRONE_DISARM_TIME: f64 = 6.5;

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    simple_logger::SimpleLogger::new()
        .with_level(DEFAULT_LOG_LEVEL.to_level_filter())
        .init()
        .expect("Failed to set logger");

    // Generate a pad like source tone to granulate
    let source = generate_source_tone(SOURCE_SECONDS);

    // Create the engine with the performance parameters and the source description
    let mut engine = GranularEngine::new(performance_parameters());
    engine.set_sample(Some(SampleInfo::new(SOURCE_SECONDS, source.len())?));
    engine.set_clip_window(ClipWindow::new(0.1, 0.9)?);
    let handle = engine.handle();

    // Start with muted sends, so the delay fades in instead of clicking on
    let mut fx_controls = SmoothedFxControls::new(&EngineParameters {
        delay_wet: 0.0,
        reverb_wet: 0.0,
        ..performance_parameters()
    });

    // Flatten the note script into a sorted event list
    let mut note_events = Vec::new();
    for (start, duration, note, velocity) in NOTES {
        note_events.push((start, note, Some(velocity)));
        note_events.push((start + duration, note, None));
    }
    note_events.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Mix buffer with headroom for release and delay tails
    let mut mix = vec![0.0_f32; ((RENDER_SECONDS + 2.0) * SAMPLE_RATE as f64) as usize];
    let mut sink = BufferRenderSink {
        source: &source,
        mix: &mut mix,
        rendered_grains: 0,
    };

    // Drive the scheduler over the scripted performance
    let tick_duration = 1.0 / TICK_RATE;
    let mut now: ClockTime = 0.0;
    let mut next_note_event = 0;
    let mut position_shifted = false;
    let mut drone_armed = false;
    let mut drone_disarmed = false;
    while now <= RENDER_SECONDS {
        while next_note_event < note_events.len() && note_events[next_note_event].0 <= now {
            let (_, note, velocity) = note_events[next_note_event];
            match velocity {
                Some(velocity) => {
                    handle.note_on(note, velocity)?;
                    println!("Note {note} on (velocity {velocity:.1}) at +{now:.2}s");
                }
                None => handle.note_off(note)?,
            }
            next_note_event += 1;
        }
        if !position_shifted && now >= POSITION_SHIFT_TIME {
            position_shifted = true;
            handle.set_parameters(EngineParameters {
                position: 0.7,
                pitch: 0.5,
                ..performance_parameters()
            })?;
            println!("Shifting grain position and pitch down at +{now:.2}s");
        }
        if !drone_armed && now >= DRONE_ARM_TIME {
            drone_armed = true;
            handle.set_drone_armed(true)?;
            println!("Arming drone at +{now:.2}s");
        }
        if drone_armed && !drone_disarmed && now >= DRONE_DISARM_TIME {
            drone_disarmed = true;
            handle.set_drone_armed(false)?;
            println!("Disarming drone at +{now:.2}s");
        }

        let status = engine.tick(now, &mut sink);
        engine.sync_fx_sends(&mut fx_controls);
        if status == SchedulerStatus::Stopped && next_note_event > 0 {
            println!("All voices finished at +{now:.2}s");
            break;
        }
        now += tick_duration;
    }
    let rendered_grains = sink.rendered_grains;

    // Apply the delay send and normalize
    apply_delay_send(&mut mix, &mut fx_controls);
    let peak = mix.iter().fold(0.0_f32, |peak, value| peak.max(value.abs()));
    if peak > 1.0 {
        for value in &mut mix {
            *value /= peak;
        }
    }

    // Write the mix as a 32 bit float WAV file
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(OUTPUT_PATH, spec).expect("Failed to create output file");
    for value in &mix {
        writer.write_sample(*value).expect("Failed to write output file");
    }
    writer.finalize().expect("Failed to finalize output file");

    println!(
        "Rendered {} grains into '{}' ({:.1}s)",
        rendered_grains,
        OUTPUT_PATH,
        mix.len() as f64 / SAMPLE_RATE as f64
    );

    Ok(())
}

// -------------------------------------------------------------------------------------------------

/// The engine parameters of the scripted performance.
fn performance_parameters() -> EngineParameters {
    EngineParameters {
        position: GRAIN_POSITION,
        spread: GRAIN_SPREAD,
        grain_size: GRAIN_SIZE,
        density: GRAIN_DENSITY,
        pitch_spread: GRAIN_PITCH_SPREAD,
        attack: ATTACK,
        decay: DECAY,
        sustain: SUSTAIN,
        release: RELEASE,
        delay_time: DELAY_TIME,
        delay_feedback: DELAY_FEEDBACK,
        delay_wet: DELAY_WET,
        ..EngineParameters::default()
    }
}

/// Generate a slowly fading chord tone as granulation source.
fn generate_source_tone(seconds: f64) -> Vec<f32> {
    let frame_count = (seconds * SAMPLE_RATE as f64) as usize;
    let mut frames = Vec::with_capacity(frame_count);
    for index in 0..frame_count {
        let t = index as f32 / SAMPLE_RATE as f32;
        let fade = (t * PI / seconds as f32).sin();
        let mut value = 0.0;
        for (harmonic, amplitude) in [(1.0, 0.5), (2.003, 0.25), (2.997, 0.15), (4.01, 0.1)] {
            value += amplitude * (TAU * 110.0 * harmonic * t).sin();
        }
        frames.push(value * fade * 0.5);
    }
    frames
}

// -------------------------------------------------------------------------------------------------

/// Renders triggered grains into a mono mix buffer by resampling the source tone.
struct BufferRenderSink<'a> {
    source: &'a [f32],
    mix: &'a mut [f32],
    rendered_grains: usize,
}

impl GrainSink for BufferRenderSink<'_> {
    fn trigger_grain(&mut self, grain: GrainTrigger) {
        self.rendered_grains += 1;
        render_grain(&grain, self.source, self.mix);
    }
}

/// Mix a single windowed grain into the output buffer.
fn render_grain(grain: &GrainTrigger, source: &[f32], mix: &mut [f32]) {
    let sample_rate = SAMPLE_RATE as f64;
    let start_frame = (grain.start_time * sample_rate) as usize;
    let frame_count = (grain.duration as f64 * sample_rate) as usize;
    for index in 0..frame_count {
        let output_frame = start_frame + index;
        if output_frame >= mix.len() {
            break;
        }
        let source_pos =
            grain.source_offset * sample_rate + index as f64 * grain.playback_rate as f64;
        let source_index = source_pos as usize;
        if source_index + 1 >= source.len() {
            break;
        }
        // Linear interpolation between neighbouring source frames
        let frac = (source_pos - source_index as f64) as f32;
        let value = source[source_index] * (1.0 - frac) + source[source_index + 1] * frac;
        let phase = index as f32 / frame_count as f32;
        mix[output_frame] += value * window_gain(phase) * grain.peak_gain;
    }
}

// -------------------------------------------------------------------------------------------------

/// Apply a simple mono feedback delay, driven by the smoothed effect send controls.
fn apply_delay_send(mix: &mut [f32], controls: &mut SmoothedFxControls) {
    let mut delay_line = vec![0.0_f32; SAMPLE_RATE as usize];
    let mut write_pos = 0;
    let advance_per_frame = 1.0 / SAMPLE_RATE as ClockTime;
    for value in mix.iter_mut() {
        controls.advance(advance_per_frame);
        let delay_frames = ((controls.current(FxControl::DelayTime) * SAMPLE_RATE as f32) as usize)
            .clamp(1, delay_line.len() - 1);
        let read_pos = (write_pos + delay_line.len() - delay_frames) % delay_line.len();
        let delayed = delay_line[read_pos];
        delay_line[write_pos] = *value + delayed * controls.current(FxControl::DelayFeedback);
        write_pos = (write_pos + 1) % delay_line.len();
        *value += delayed * controls.current(FxControl::DelayWet);
    }
}
