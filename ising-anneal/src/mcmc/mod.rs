pub mod annealing;
pub mod rules;
pub mod step;

pub use annealing::{
    adaptive_annealing, boltzmann_annealing, cauchy_annealing, AnnealingSchedule, Schedule,
    BOLTZMANN_DECAY, CAUCHY_DECAY,
};
pub use rules::SingleSpinRule;
pub use step::{monte_carlo_step, StepOutcome};
