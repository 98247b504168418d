use rand::Rng;

use crate::stress::STRESS_MAX;

/// Stress below this never tips.
pub const WATCH_FLOOR: f64 = 70.0;

/// Start of the linear hazard ramp.
pub const RAMP_FLOOR: f64 = 85.0;

/// Flat per-tick probability in the `[WATCH_FLOOR, RAMP_FLOOR)` band.
pub const WATCH_PROBABILITY: f64 = 0.05;

/// Per-tick probability at stress 100, the top of the ramp.
pub const RAMP_CEILING_PROBABILITY: f64 = 0.4;

/// Per-tick tipping probability for a given stress level.
///
/// Crossing a stress band raises the hazard rate but never guarantees an
/// immediate transition; the exact tipping instant stays uncertain.
pub fn tip_probability(stress: f64) -> f64 {
    if stress >= RAMP_FLOOR {
        (stress - RAMP_FLOOR) / (STRESS_MAX - RAMP_FLOOR) * RAMP_CEILING_PROBABILITY
    } else if stress >= WATCH_FLOOR {
        WATCH_PROBABILITY
    } else {
        0.0
    }
}

/// Pure tipping decision on a uniform `[0, 1)` sample.
///
/// Already-tipped elements never tip again; tipping is irreversible within
/// a run.
pub fn decide(stress: f64, already_tipped: bool, sample: f64) -> bool {
    if already_tipped {
        return false;
    }
    sample < tip_probability(stress)
}

/// Single Bernoulli draw per element per tick.
pub fn should_tip<R: Rng>(stress: f64, already_tipped: bool, rng: &mut R) -> bool {
    decide(stress, already_tipped, rng.gen::<f64>())
}
