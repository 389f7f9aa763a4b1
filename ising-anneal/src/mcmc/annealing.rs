/// Default decay rate of [`boltzmann_annealing`].
pub const BOLTZMANN_DECAY: f64 = 0.95;
/// Default decay rate of [`cauchy_annealing`].
pub const CAUCHY_DECAY: f64 = 0.1;

/// `T(t) = T₀ · exp(-α·t)`.
pub fn boltzmann_annealing(initial_temp: f64, step: usize, decay_rate: f64) -> f64 {
    initial_temp * (-decay_rate * step as f64).exp()
}

/// `T(t) = T₀ / (1 + α·t)`.
pub fn cauchy_annealing(initial_temp: f64, step: usize, decay_rate: f64) -> f64 {
    initial_temp / (1.0 + decay_rate * step as f64)
}

/// One multiplicative feedback step: cool by 5% when more than half of the
/// proposals are accepted, heat by 5% otherwise. Does not compound by itself;
/// feed the result back as `initial_temp` to compound.
pub fn adaptive_annealing(initial_temp: f64, _step: usize, acceptance_rate: f64) -> f64 {
    if acceptance_rate > 0.5 {
        initial_temp * 0.95
    } else {
        initial_temp * 1.05
    }
}

/// Temperature as a function of the run-local step index.
///
/// `current` is the simulation's temperature before this step and
/// `acceptance_rate` its lifetime acceptance rate; a schedule may ignore both.
pub trait AnnealingSchedule {
    fn temperature(&self, step: usize, current: f64, acceptance_rate: f64) -> f64;
}

/// Built-in schedules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    Boltzmann { initial_temp: f64, decay_rate: f64 },
    Cauchy { initial_temp: f64, decay_rate: f64 },
    /// Uses the current temperature as `T₀`, so the feedback compounds over a run.
    Adaptive,
}

impl Schedule {
    pub fn boltzmann(initial_temp: f64) -> Self {
        Self::Boltzmann {
            initial_temp,
            decay_rate: BOLTZMANN_DECAY,
        }
    }

    pub fn cauchy(initial_temp: f64) -> Self {
        Self::Cauchy {
            initial_temp,
            decay_rate: CAUCHY_DECAY,
        }
    }
}

impl AnnealingSchedule for Schedule {
    fn temperature(&self, step: usize, current: f64, acceptance_rate: f64) -> f64 {
        match *self {
            Self::Boltzmann {
                initial_temp,
                decay_rate,
            } => boltzmann_annealing(initial_temp, step, decay_rate),
            Self::Cauchy {
                initial_temp,
                decay_rate,
            } => cauchy_annealing(initial_temp, step, decay_rate),
            Self::Adaptive => adaptive_annealing(current, step, acceptance_rate),
        }
    }
}

impl<F> AnnealingSchedule for F
where
    F: Fn(usize) -> f64,
{
    fn temperature(&self, step: usize, _current: f64, _acceptance_rate: f64) -> f64 {
        self(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_schedule_values() {
        assert_eq!(boltzmann_annealing(10.0, 0, BOLTZMANN_DECAY), 10.0);
        assert!(close(boltzmann_annealing(10.0, 1, 0.5), 6.065));
        assert!(close(cauchy_annealing(10.0, 1, 0.1), 9.091));
        assert_eq!(cauchy_annealing(10.0, 0, CAUCHY_DECAY), 10.0);
        for step in [0, 1, 17] {
            assert!(close(adaptive_annealing(10.0, step, 0.6), 9.5));
            assert!(close(adaptive_annealing(10.0, step, 0.3), 10.5));
        }
        // 0.5 is not "more than half"
        assert!(close(adaptive_annealing(10.0, 0, 0.5), 10.5));
    }

    #[test]
    fn test_schedules_are_monotone() {
        let b = Schedule::boltzmann(5.0);
        let c = Schedule::cauchy(5.0);
        for step in 0..50 {
            assert!(b.temperature(step + 1, 0.0, 0.0) < b.temperature(step, 0.0, 0.0));
            assert!(c.temperature(step + 1, 0.0, 0.0) < c.temperature(step, 0.0, 0.0));
        }
    }

    #[test]
    fn test_adaptive_uses_current_temperature() {
        let s = Schedule::Adaptive;
        assert!(close(s.temperature(3, 2.0, 0.9), 1.9));
        assert!(close(s.temperature(3, 2.0, 0.1), 2.1));
    }

    #[test]
    fn test_closures_are_schedules() {
        let linear = |step: usize| 3.0 - 0.01 * step as f64;
        assert!(close(linear.temperature(100, 99.0, 0.2), 2.0));
    }
}
