use rand::Rng;

/// A bounded, mean-reverting random walk over a single scalar signal.
///
/// Each step adds uniform noise in `±step` plus a pull of
/// `reversion * (baseline - prev)` toward the baseline, then clamps to
/// `[min, max]`. Values wander but never jump and never leave their range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub baseline: f64,
    pub step: f64,
    pub reversion: f64,
    pub min: f64,
    pub max: f64,
}

impl Signal {
    pub const fn new(baseline: f64, step: f64, reversion: f64, min: f64, max: f64) -> Self {
        Self {
            baseline,
            step,
            reversion,
            min,
            max,
        }
    }

    /// First value for a signal with no prior state: near the baseline,
    /// never pinned exactly to it.
    pub fn initial(&self, rng: &mut impl Rng) -> f64 {
        let spread = self.step * 4.0;
        clamp(
            self.baseline + rng.gen_range(-spread..=spread),
            self.min,
            self.max,
        )
    }

    pub fn next(&self, prev: f64, rng: &mut impl Rng) -> f64 {
        let noise = rng.gen_range(-self.step..=self.step);
        let pull = self.reversion * (self.baseline - prev);
        clamp(prev + noise + pull, self.min, self.max)
    }
}

pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.max(min).min(max)
}

pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}
