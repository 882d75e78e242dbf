use std::fmt::{Debug, Display};

use crate::utils::time::ClockTime;

// -------------------------------------------------------------------------------------------------

/// Provides smooth transitions between a current and target f32 value.
/// Smoothing usually needs to be applied to avoid clicks in e.g. volume or other DSP parameter changes.
///
/// Unlike per-sample smoothers, values here advance in wall-clock steps: the driver passes the
/// elapsed time since the last update to [`SmoothedValue::advance`], so smoothing behaves the
/// same regardless of how often it gets polled.
pub trait SmoothedValue: Debug {
    /// Access to the current, possibly ramped value.
    #[must_use]
    fn current(&self) -> f32;
    /// Access to the target value.
    #[must_use]
    fn target(&self) -> f32;

    /// Advance by `dt` seconds, if needed, and get the current ramped value,
    /// else returns the target value.
    #[must_use]
    fn next(&mut self, dt: ClockTime) -> f32 {
        if self.need_ramp() {
            self.advance(dt);
            self.current()
        } else {
            self.target()
        }
    }

    /// Test if ramping is necessary. When ramping is not necessary, parameter changes
    /// may be applied directly without calling `next` or `advance`.
    #[must_use]
    fn need_ramp(&self) -> bool;
    /// Move current towards the target value by `dt` seconds, when ramping is necessary,
    /// else does nothing.
    fn advance(&mut self, dt: ClockTime);

    /// Set current and target to the same value.
    fn init(&mut self, value: f32);
    /// Set a new target value and ramp current, when current is different from the target.
    fn set_target(&mut self, target: f32);
}

impl Display for dyn SmoothedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.need_ramp() {
            f.write_fmt(format_args!("{}(->{})", self.current(), self.target()))
        } else {
            f.write_fmt(format_args!("{}", self.target()))
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Exponential smoothed value for smooth ramping, using an exponential approach with a
/// configurable time constant.
///
/// Each advance moves the current value towards the target by `1 - exp(-dt / time_constant)`
/// of the remaining distance, so one time constant covers about 63% of the way and five cover
/// practically all of it. This should be the default smoothed value for volume alike parameters.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothedValue {
    current: f32,
    target: f32,
    time_constant: f32,
}

impl ExponentialSmoothedValue {
    pub const DEFAULT_TIME_CONSTANT: f32 = 0.1;

    pub const fn new(value: f32) -> Self {
        Self::with_time_constant(value, Self::DEFAULT_TIME_CONSTANT)
    }

    pub const fn with_time_constant(value: f32, time_constant: f32) -> Self {
        assert!(time_constant > 0.0, "Invalid time constant");

        let current = value;
        let target = value;

        ExponentialSmoothedValue {
            current,
            target,
            time_constant,
        }
    }

    #[inline(always)]
    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    pub fn set_time_constant(&mut self, time_constant: f32) {
        assert!(time_constant > 0.0, "Invalid time constant");
        self.time_constant = time_constant;
    }

    pub fn reset(&mut self) {
        self.init(self.target);
    }
}

impl SmoothedValue for ExponentialSmoothedValue {
    #[inline(always)]
    fn current(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn target(&self) -> f32 {
        self.target
    }

    fn need_ramp(&self) -> bool {
        const EPSILON: f32 = f32::EPSILON * 100.0;
        (self.target - self.current).abs() > EPSILON
    }

    fn advance(&mut self, dt: ClockTime) {
        debug_assert!(dt >= 0.0, "Invalid time step");
        let coeff = 1.0 - (-(dt as f32) / self.time_constant).exp();
        self.current += (self.target - self.current) * coeff;
        if !self.need_ramp() {
            self.current = self.target;
        }
    }

    fn init(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    fn set_target(&mut self, target: f32) {
        self.target = target;
        if !self.need_ramp() {
            self.current = self.target;
        }
    }
}

impl Default for ExponentialSmoothedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl From<f32> for ExponentialSmoothedValue {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_smoothed_value() {
        // Test new
        let val = ExponentialSmoothedValue::new(0.0);
        assert_eq!(val.current(), 0.0);
        assert_eq!(val.target(), 0.0);
        assert_eq!(
            val.time_constant(),
            ExponentialSmoothedValue::DEFAULT_TIME_CONSTANT
        );

        // Test init
        let mut val = ExponentialSmoothedValue::new(0.0);
        val.init(1.0);
        assert_eq!(val.current(), 1.0);
        assert_eq!(val.target(), 1.0);

        // Test set_target no ramp
        let mut val = ExponentialSmoothedValue::new(0.0);
        val.set_target(0.0);
        assert_eq!(val.current(), 0.0);
        assert_eq!(val.target(), 0.0);
        assert!(!val.need_ramp());

        // Test set_target with ramp
        let mut val = ExponentialSmoothedValue::new(0.0);
        val.set_target(1.0);
        assert_eq!(val.target(), 1.0);
        assert!(val.need_ramp());
        val.advance(0.01);
        assert!(val.current() > 0.0);
        assert!(val.current() < val.target());

        // Test multi advances
        let mut val = ExponentialSmoothedValue::new(0.0);
        val.set_target(1.0);
        val.advance(0.01);
        let initial = val.current();
        for _ in 0..10 {
            val.advance(0.01);
        }
        assert!(val.current() > initial);
        assert!(val.current() < val.target());
        assert!(val.need_ramp());
    }

    #[test]
    fn test_exp_smoothed_value_time_constant() {
        // After one time constant ~63.2% of the distance is covered
        let mut val = ExponentialSmoothedValue::with_time_constant(0.0, 0.1);
        val.set_target(1.0);
        val.advance(0.1);
        assert!((val.current() - 0.632).abs() < 1e-3);

        // One big step covers the same distance as many small ones
        let mut stepped = ExponentialSmoothedValue::with_time_constant(0.0, 0.1);
        stepped.set_target(1.0);
        for _ in 0..10 {
            stepped.advance(0.01);
        }
        assert!((stepped.current() - val.current()).abs() < 1e-4);

        // After several time constants the target is practically reached
        let mut val = ExponentialSmoothedValue::with_time_constant(0.0, 0.1);
        val.set_target(1.0);
        for _ in 0..100 {
            val.advance(0.1);
        }
        assert!(!val.need_ramp());
        assert_eq!(val.current(), val.target());

        // Shorter time constants approach faster
        let mut fast = ExponentialSmoothedValue::with_time_constant(0.0, 0.05);
        fast.set_target(1.0);
        fast.advance(0.1);
        let mut slow = ExponentialSmoothedValue::with_time_constant(0.0, 0.5);
        slow.set_target(1.0);
        slow.advance(0.1);
        assert!(fast.current() > slow.current());
    }
}
