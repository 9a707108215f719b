//! Eased value animation.
//!
//! An [`Animation`] is pure math: it maps elapsed time to a value. Something
//! else has to move the time forward, which is what [`Tween`](crate::Tween)
//! does with a scheduler item.

use std::time::Duration;

/// Easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Slow start.
    QuadIn,
    /// Slow finish.
    QuadOut,
    /// Slow start and finish.
    CubicInOut,
    /// Sharp snap toward the target, long tail.
    #[default]
    ExponentialOut,
    /// Jump to the target on the first frame.
    Instant,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` to eased progress.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::ExponentialOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            Self::Instant => 1.0,
        }
    }
}

/// A value moving from `start` to `target` over `duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    start: f32,
    target: f32,
    current: f32,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Animation {
    /// Default animation duration.
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(150);

    /// Creates an animation from `start` to `target`.
    #[must_use]
    pub fn new(start: f32, target: f32, easing: Easing) -> Self {
        Self {
            start,
            target,
            current: start,
            duration: Self::DEFAULT_DURATION,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Final value.
    #[must_use]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Linear progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Returns true once the value has reached the target.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Moves to an absolute point in time since the animation began.
    pub fn seek(&mut self, elapsed: Duration) {
        self.elapsed = elapsed.min(self.duration);

        if self.is_complete() {
            self.current = self.target;
        } else {
            let eased = self.easing.apply(self.progress());
            self.current = self.start + (self.target - self.start) * eased;
        }
    }

    /// Moves forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.seek(self.elapsed + dt);
    }

    /// Restarts toward a new target from the current value.
    pub fn retarget(&mut self, target: f32) {
        self.start = self.current;
        self.target = target;
        self.elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_out_is_sharp() {
        let value = Easing::ExponentialOut.apply(0.3);
        assert!(value > 0.8, "exponential out should snap quickly: {value}");
    }

    #[test]
    fn test_curves_hit_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::CubicInOut,
            Easing::ExponentialOut,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
        assert!((Easing::Instant.apply(0.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_animation_reaches_target() {
        let mut anim = Animation::new(0.0, 100.0, Easing::ExponentialOut);

        for _ in 0..20 {
            anim.advance(Duration::from_millis(16));
        }

        assert!((anim.value() - 100.0).abs() < 0.01);
        assert!(anim.is_complete());
    }

    #[test]
    fn test_seek_is_absolute() {
        let mut anim = Animation::new(10.0, 20.0, Easing::Linear).with_duration(Duration::from_millis(100));
        anim.seek(Duration::from_millis(50));
        assert!((anim.value() - 15.0).abs() < 1e-4);

        anim.seek(Duration::from_millis(25));
        assert!((anim.value() - 12.5).abs() < 1e-4);
    }

    #[test]
    fn test_retarget_starts_from_current_value() {
        let mut anim = Animation::new(0.0, 10.0, Easing::Linear).with_duration(Duration::from_millis(100));
        anim.seek(Duration::from_millis(100));
        anim.retarget(0.0);

        assert!(!anim.is_complete());
        anim.seek(Duration::from_millis(50));
        assert!((anim.value() - 5.0).abs() < 1e-4);
    }
}
