//! Exponential damping and shrink-only rate limiting for view scale.

/// Default fraction of the remaining distance covered per update.
pub const DEFAULT_DAMPING: f64 = 0.3;

/// Default largest fractional shrink allowed in one update.
pub const DEFAULT_MAX_SHRINK: f64 = 0.05;

/// Smoothing helpers used by the controller to avoid oscillating zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaleDamper {
    /// Fraction of `target - current` applied per update, in (0, 1]
    pub factor: f64,
    /// Maximum fractional shrink per rate-limited update
    pub max_shrink: f64,
}

impl Default for AutoScaleDamper {
    fn default() -> Self {
        Self {
            factor: DEFAULT_DAMPING,
            max_shrink: DEFAULT_MAX_SHRINK,
        }
    }
}

impl AutoScaleDamper {
    pub fn new(factor: f64, max_shrink: f64) -> Self {
        Self { factor, max_shrink }
    }

    /// Move `current` toward `target` by the damping factor.
    ///
    /// Non-finite targets leave `current` unchanged.
    pub fn damp(&self, current: f64, target: f64) -> f64 {
        if !target.is_finite() {
            return current;
        }
        current + (target - current) * self.factor
    }

    /// Damped step that is only allowed to decrease the value.
    pub fn damp_shrink_only(&self, current: f64, target: f64) -> f64 {
        conservative(current, self.damp(current, target))
    }

    /// Shrink `scale` by at most `max_shrink`, weighted by an eased
    /// pressure in `[0, 1]`.
    pub fn rate_limited_shrink(&self, scale: f64, pressure: f64) -> f64 {
        let eased = ease_in_quad(pressure.clamp(0.0, 1.0));
        scale * (1.0 - self.max_shrink * eased)
    }
}

/// Shrink-only guard: never returns more than `current`.
#[inline]
pub fn conservative(current: f64, proposed: f64) -> f64 {
    if proposed.is_finite() {
        current.min(proposed)
    } else {
        current
    }
}

/// Quadratic ease-in: slow start, full strength at 1.
#[inline]
pub fn ease_in_quad(t: f64) -> f64 {
    t * t
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: with a constant target the value gets within 1% of it
        /// in a bounded number of updates. The error decays by 0.7 per step,
        /// so a 400x start gap needs 30 steps.
        #[test]
        fn prop_damping_converges(
            current in 0.05f64..=20.0,
            target in 0.05f64..=20.0,
        ) {
            let damper = AutoScaleDamper::default();
            let mut value = current;
            let mut steps = 0;
            while (value - target).abs() > target * 0.01 {
                value = damper.damp(value, target);
                steps += 1;
                prop_assert!(steps <= 32, "did not converge: {} -> {}", current, target);
            }
        }

        /// Property: each damped step shrinks the distance to the target.
        #[test]
        fn prop_damping_is_monotone(
            current in 0.05f64..=20.0,
            target in 0.05f64..=20.0,
        ) {
            let damper = AutoScaleDamper::default();
            let next = damper.damp(current, target);
            prop_assert!((next - target).abs() <= (current - target).abs());
        }

        /// Property: rate-limited shrink never grows and never drops more
        /// than the configured fraction.
        #[test]
        fn prop_rate_limited_shrink_bounds(
            scale in 0.01f64..=40.0,
            pressure in -1.0f64..=2.0,
        ) {
            let damper = AutoScaleDamper::default();
            let next = damper.rate_limited_shrink(scale, pressure);
            prop_assert!(next <= scale);
            prop_assert!(next >= scale * (1.0 - DEFAULT_MAX_SHRINK) - 1e-12);
        }
    }
}
