//! Smoothed effect send control state, shared between the engine and host effect racks.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use super::parameters::EngineParameters;
use crate::utils::{
    smoothed::{ExponentialSmoothedValue, SmoothedValue},
    time::ClockTime,
};

// -------------------------------------------------------------------------------------------------

/// Effect send controls whose values hosts ramp toward over time instead of applying abruptly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display, IntoStaticStr)]
pub enum FxControl {
    DelayTime,
    DelayFeedback,
    DelayWet,
    ReverbWet,
}

// -------------------------------------------------------------------------------------------------

/// Receiver for effect send control changes.
///
/// Implementations own the actual smoothing and effect DSP. [`SmoothedFxControls`] is a ready
/// made implementation for hosts without their own parameter ramps.
pub trait FxControlSink {
    /// Start ramping the given control toward a new target value with the given
    /// smoothing time constant in seconds.
    fn set_smoothed(&mut self, control: FxControl, target: f32, time_constant: f32);
}

// -------------------------------------------------------------------------------------------------

/// Tracks the last pushed effect send values and forwards only actual changes to a sink.
#[derive(Debug, Default, Clone)]
pub struct FxSendState {
    last_synced: Option<[f32; 4]>,
}

impl FxSendState {
    /// Smoothing time constant for all effect send ramps in seconds.
    pub const SMOOTHING_TIME_CONSTANT: f32 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Push the snapshot's send values into the sink. The first call pushes every control,
    /// later calls only those whose values changed since the previous sync.
    pub fn sync(&mut self, parameters: &EngineParameters, sink: &mut impl FxControlSink) {
        let values = [
            parameters.delay_time,
            parameters.delay_feedback,
            parameters.delay_wet,
            parameters.reverb_wet,
        ];
        for (index, control) in FxControl::iter().enumerate() {
            let changed = match &self.last_synced {
                Some(last_synced) => last_synced[index] != values[index],
                None => true,
            };
            if changed {
                sink.set_smoothed(control, values[index], Self::SMOOTHING_TIME_CONSTANT);
            }
        }
        self.last_synced = Some(values);
    }
}

// -------------------------------------------------------------------------------------------------

/// Ready made [`FxControlSink`] which holds one exponential ramp per control.
///
/// Hosts which apply sends in their own processing can drive this directly: advance it once
/// per rendered block, then read the current values.
#[derive(Debug, Clone)]
pub struct SmoothedFxControls {
    values: [ExponentialSmoothedValue; 4],
}

impl SmoothedFxControls {
    /// Create new controls with all ramps resting at the snapshot's send values.
    pub fn new(parameters: &EngineParameters) -> Self {
        let time_constant = FxSendState::SMOOTHING_TIME_CONSTANT;
        Self {
            values: [
                ExponentialSmoothedValue::with_time_constant(parameters.delay_time, time_constant),
                ExponentialSmoothedValue::with_time_constant(
                    parameters.delay_feedback,
                    time_constant,
                ),
                ExponentialSmoothedValue::with_time_constant(parameters.delay_wet, time_constant),
                ExponentialSmoothedValue::with_time_constant(parameters.reverb_wet, time_constant),
            ],
        }
    }

    /// Advance all ramps by `dt` seconds.
    pub fn advance(&mut self, dt: ClockTime) {
        for value in &mut self.values {
            value.advance(dt);
        }
    }

    /// Current, possibly ramped value of the given control.
    #[inline(always)]
    pub fn current(&self, control: FxControl) -> f32 {
        self.values[control as usize].current()
    }

    /// Target value of the given control.
    #[inline(always)]
    pub fn target(&self, control: FxControl) -> f32 {
        self.values[control as usize].target()
    }
}

impl Default for SmoothedFxControls {
    fn default() -> Self {
        Self::new(&EngineParameters::default())
    }
}

impl FxControlSink for SmoothedFxControls {
    fn set_smoothed(&mut self, control: FxControl, target: f32, time_constant: f32) {
        let value = &mut self.values[control as usize];
        value.set_time_constant(time_constant);
        value.set_target(target);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(FxControl, f32, f32)>,
    }

    impl FxControlSink for RecordingSink {
        fn set_smoothed(&mut self, control: FxControl, target: f32, time_constant: f32) {
            self.calls.push((control, target, time_constant));
        }
    }

    #[test]
    fn test_first_sync_pushes_all_controls() {
        let parameters = EngineParameters::default();
        let mut state = FxSendState::new();
        let mut sink = RecordingSink::default();

        state.sync(&parameters, &mut sink);
        assert_eq!(sink.calls.len(), 4);
        assert_eq!(
            sink.calls[0],
            (
                FxControl::DelayTime,
                parameters.delay_time,
                FxSendState::SMOOTHING_TIME_CONSTANT
            )
        );
        assert_eq!(sink.calls[3].0, FxControl::ReverbWet);
    }

    #[test]
    fn test_sync_pushes_changes_only() {
        let mut parameters = EngineParameters::default();
        let mut state = FxSendState::new();
        let mut sink = RecordingSink::default();
        state.sync(&parameters, &mut sink);

        // Unchanged snapshot pushes nothing
        sink.calls.clear();
        state.sync(&parameters, &mut sink);
        assert!(sink.calls.is_empty());

        // A single changed value pushes exactly that control
        parameters.delay_wet = 0.9;
        state.sync(&parameters, &mut sink);
        assert_eq!(sink.calls.len(), 1);
        assert_eq!(sink.calls[0].0, FxControl::DelayWet);
        assert_eq!(sink.calls[0].1, 0.9);

        // Two changed values push two controls
        sink.calls.clear();
        parameters.delay_time = 0.5;
        parameters.reverb_wet = 0.6;
        state.sync(&parameters, &mut sink);
        assert_eq!(sink.calls.len(), 2);
        assert_eq!(sink.calls[0].0, FxControl::DelayTime);
        assert_eq!(sink.calls[1].0, FxControl::ReverbWet);
    }

    #[test]
    fn test_smoothed_controls_ramp() {
        let parameters = EngineParameters::default();
        let mut controls = SmoothedFxControls::new(&parameters);
        assert_eq!(controls.current(FxControl::DelayWet), parameters.delay_wet);

        let mut state = FxSendState::new();
        state.sync(&parameters, &mut controls);
        assert_eq!(controls.current(FxControl::DelayWet), parameters.delay_wet);

        // Ramp toward a changed target over several advances
        let changed = EngineParameters {
            delay_wet: 1.0,
            ..parameters
        };
        state.sync(&changed, &mut controls);
        assert_eq!(controls.target(FxControl::DelayWet), 1.0);
        controls.advance(0.02);
        let current = controls.current(FxControl::DelayWet);
        assert!(current > parameters.delay_wet);
        assert!(current < 1.0);
        for _ in 0..200 {
            controls.advance(0.05);
        }
        assert_eq!(controls.current(FxControl::DelayWet), 1.0);

        // Untouched controls never move
        assert_eq!(controls.current(FxControl::DelayTime), parameters.delay_time);
    }
}
