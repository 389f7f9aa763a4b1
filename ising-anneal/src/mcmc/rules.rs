use rand::Rng;

use crate::config::UpdateRule;
use crate::error::SimError;

/// The single-spin acceptance criteria that have behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleSpinRule {
    Metropolis,
    Glauber,
    HeatBath,
}

impl TryFrom<UpdateRule> for SingleSpinRule {
    type Error = SimError;
    fn try_from(rule: UpdateRule) -> Result<Self, Self::Error> {
        match rule {
            UpdateRule::Metropolis => Ok(Self::Metropolis),
            UpdateRule::Glauber => Ok(Self::Glauber),
            UpdateRule::HeatBath => Ok(Self::HeatBath),
            other => Err(SimError::NotImplemented(other.as_str())),
        }
    }
}

impl SingleSpinRule {
    /// Decide whether a site holding `spin` with local field `field` flips at
    /// temperature `temp`.
    ///
    /// Metropolis and Glauber test the flip's `ΔE = 2·s·h`. Heat bath samples
    /// the new value from the conditional distribution and reports a flip only
    /// when the sample differs from `spin`.
    #[inline]
    pub fn decide(&self, spin: i8, field: i32, temp: f64, rng: &mut impl Rng) -> bool {
        let delta_e = (2 * spin as i32 * field) as f64;
        match self {
            Self::Metropolis => {
                delta_e <= 0.0 || rng.gen::<f64>() < metropolis_probability(delta_e, temp)
            }
            Self::Glauber => rng.gen::<f64>() < glauber_probability(delta_e, temp),
            Self::HeatBath => {
                let new_spin = if rng.gen::<f64>() < heat_bath_up_probability(field as f64, temp) {
                    1
                } else {
                    -1
                };
                new_spin != spin
            }
        }
    }
}

/// `min(1, exp(-ΔE / T))`.
#[inline]
pub fn metropolis_probability(delta_e: f64, temp: f64) -> f64 {
    if delta_e <= 0.0 {
        1.0
    } else {
        (-delta_e / temp).exp()
    }
}

/// `1 / (1 + exp(ΔE / T))`.
#[inline]
pub fn glauber_probability(delta_e: f64, temp: f64) -> f64 {
    1.0 / (1.0 + (delta_e / temp).exp())
}

/// `exp(h/T) / (exp(h/T) + exp(-h/T))`, evaluated as `1 / (1 + exp(-2h/T))`
/// so that it saturates instead of overflowing at low temperature.
#[inline]
pub fn heat_bath_up_probability(field: f64, temp: f64) -> f64 {
    1.0 / (1.0 + (-2.0 * field / temp).exp())
}
