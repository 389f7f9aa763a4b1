use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::geometry::Lattice;
use crate::mcmc::{monte_carlo_step, AnnealingSchedule, SingleSpinRule, StepOutcome};
use crate::persistence::{self, Format, MetricsState, Parameters, SimulationState, STATE_VERSION};
use crate::spins::{full_energy, Drift, EnergyAccountant};
use crate::statistics::MetricsAccumulator;

/// What a call to [`Simulation::run`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Proposals made during this run.
    pub steps: usize,
    /// Proposals accepted during this run.
    pub accepted: u64,
    /// Metric samples recorded during this run.
    pub samples: usize,
    pub final_temperature: f64,
    /// Drift events over the simulation's lifetime.
    pub drift_events: u64,
}

/// A single Ising lattice driven by single-spin Monte Carlo.
///
/// Owns the lattice, the incremental energy and magnetization, the metric
/// histories and its own seeded PRNG. Two simulations built from the same
/// config produce the same trajectory.
pub struct Simulation {
    config: SimConfig,
    rule: SingleSpinRule,
    lattice: Lattice,
    accountant: EnergyAccountant,
    metrics: MetricsAccumulator,
    temperature: f64,
    rng: Xoshiro256StarStar,
}

/// Everything a validated state replaces.
struct Installed {
    config: SimConfig,
    rule: SingleSpinRule,
    lattice: Lattice,
    accountant: EnergyAccountant,
    metrics: MetricsAccumulator,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.check()?;
        let rule = SingleSpinRule::try_from(config.update_rule)?;
        let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);
        let lattice = Lattice::random(config.grid_size, &config.boundary, &mut rng)?;
        let accountant = EnergyAccountant::new(&lattice, config.sequential);
        let metrics = MetricsAccumulator::new(lattice.n_spins);

        log::debug!(
            "new {n}x{n} simulation: boundary={}, rule={}, T={}, seed={}, E0={}, M0={}",
            config.boundary.kind.as_str(),
            config.update_rule.as_str(),
            config.temperature,
            config.seed,
            accountant.energy(),
            accountant.magnetization(),
            n = config.grid_size,
        );

        Ok(Self {
            temperature: config.temperature,
            config,
            rule,
            lattice,
            accountant,
            metrics,
            rng,
        })
    }

    /// Build a simulation from a persisted state, with a fresh PRNG seeded
    /// by `seed`. Tuning fields not carried by the state take their defaults.
    pub fn from_state(state: SimulationState, seed: u64) -> Result<Self> {
        let base = SimConfig {
            seed,
            ..SimConfig::default()
        };
        let temperature = state.temperature;
        let installed = Self::validate_state(&base, state)?;
        Ok(Self {
            config: installed.config,
            rule: installed.rule,
            lattice: installed.lattice,
            accountant: installed.accountant,
            metrics: installed.metrics,
            temperature,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn rule(&self) -> SingleSpinRule {
        self.rule
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Copy of the spin grid, row-major.
    pub fn grid(&self) -> Vec<Vec<i8>> {
        self.lattice.to_grid()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(SimError::Config(format!(
                "temperature must be finite and > 0, got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn energy(&self) -> f64 {
        self.accountant.energy()
    }

    pub fn magnetization(&self) -> i64 {
        self.accountant.magnetization()
    }

    pub fn accountant(&self) -> &EnergyAccountant {
        &self.accountant
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    /// One proposal at the current temperature.
    pub fn step(&mut self) -> StepOutcome {
        let outcome = monte_carlo_step(
            &mut self.lattice,
            &mut self.accountant,
            self.rule,
            self.temperature,
            &mut self.rng,
        );
        if outcome.accepted {
            if let Some(interval) = self.config.recompute_interval {
                if self.accountant.accepted_since_recompute() >= interval {
                    self.resync();
                }
            }
        }
        outcome
    }

    /// Run `steps` proposals, sampling metrics on every step index divisible
    /// by `sampling_interval`.
    pub fn run(
        &mut self,
        steps: usize,
        sampling_interval: usize,
        schedule: Option<&dyn AnnealingSchedule>,
    ) -> Result<RunSummary> {
        self.run_with(steps, sampling_interval, schedule, &AtomicBool::new(false), &|| {})
    }

    /// [`run`](Self::run) with cooperative cancellation and a per-step hook.
    ///
    /// `interrupted` is polled before every step; when set, the run stops with
    /// [`SimError::Interrupted`] and the steps already taken are kept.
    pub fn run_with(
        &mut self,
        steps: usize,
        sampling_interval: usize,
        schedule: Option<&dyn AnnealingSchedule>,
        interrupted: &AtomicBool,
        on_step: &dyn Fn(),
    ) -> Result<RunSummary> {
        if sampling_interval == 0 {
            return Err(SimError::Config("sampling_interval must be >= 1".into()));
        }

        let accepted_before = self.accountant.accepted_moves();
        let mut samples = 0;

        for step in 0..steps {
            if interrupted.load(Ordering::Relaxed) {
                log::info!("run interrupted after {step} of {steps} steps");
                return Err(SimError::Interrupted);
            }

            if let Some(schedule) = schedule {
                let proposed =
                    schedule.temperature(step, self.temperature, self.accountant.acceptance_rate());
                self.temperature = self.clamp_temperature(proposed)?;
            }

            self.step();
            on_step();

            if step % sampling_interval == 0 {
                self.sample();
                samples += 1;
            }
        }

        let summary = RunSummary {
            steps,
            accepted: self.accountant.accepted_moves() - accepted_before,
            samples,
            final_temperature: self.temperature,
            drift_events: self.accountant.drift_events(),
        };
        log::debug!(
            "run finished: {} steps, {} accepted, {} samples, T={}",
            summary.steps,
            summary.accepted,
            summary.samples,
            summary.final_temperature
        );
        Ok(summary)
    }

    fn clamp_temperature(&self, proposed: f64) -> Result<f64> {
        if proposed.is_nan() || proposed == f64::INFINITY {
            return Err(SimError::Config(format!(
                "annealing schedule produced temperature {proposed}"
            )));
        }
        Ok(proposed.max(self.config.min_temperature))
    }

    fn sample(&mut self) {
        self.metrics.update(
            self.accountant.energy(),
            self.accountant.magnetization() as f64,
            self.temperature,
            self.accountant.accepted_moves(),
            self.accountant.total_moves(),
        );
        self.metrics.observe_configuration(&self.lattice);
    }

    /// Compare tracked energy and magnetization against a full recomputation.
    pub fn check_consistency(&self) -> std::result::Result<(), Drift> {
        self.accountant
            .check(&self.lattice, self.config.drift_tolerance, self.config.sequential)
    }

    /// Recompute from scratch now, returning the drift if there was any.
    pub fn resync(&mut self) -> Option<Drift> {
        self.accountant
            .recompute(&self.lattice, self.config.drift_tolerance, self.config.sequential)
    }

    /// Owned copy of everything needed to resume this simulation.
    pub fn snapshot(&self) -> SimulationState {
        SimulationState {
            version: STATE_VERSION,
            grid: self.lattice.to_grid(),
            temperature: self.temperature,
            energy: self.accountant.energy(),
            magnetization: self.accountant.magnetization(),
            accepted_moves: self.accountant.accepted_moves(),
            total_moves: self.accountant.total_moves(),
            metrics: MetricsState::from_metrics(&self.metrics),
            parameters: Parameters::new(
                self.config.grid_size,
                &self.config.boundary,
                self.config.update_rule,
            ),
        }
    }

    /// Replace the lattice, counters, metrics and temperature with `state`.
    ///
    /// The whole state is validated first; on error nothing changes. The
    /// PRNG and tuning fields of the current config are kept.
    pub fn restore(&mut self, state: SimulationState) -> Result<()> {
        let temperature = state.temperature;
        let installed = Self::validate_state(&self.config, state)?;
        self.config = installed.config;
        self.rule = installed.rule;
        self.lattice = installed.lattice;
        self.accountant = installed.accountant;
        self.metrics = installed.metrics;
        self.temperature = temperature;
        Ok(())
    }

    pub fn save_state(&self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        persistence::write_state(&self.snapshot(), path.as_ref(), format)
    }

    /// Load and [`restore`](Self::restore) a state. Decoding or validation
    /// failures leave the simulation untouched.
    pub fn load_state(&mut self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        let state = persistence::read_state(path.as_ref(), format)?;
        self.restore(state)
    }

    fn validate_state(base: &SimConfig, state: SimulationState) -> Result<Installed> {
        persistence::codec::check_version(&state)?;
        let spins = state.flat_spins()?;
        let params = &state.parameters;

        let config = SimConfig {
            grid_size: params.grid_size,
            temperature: state.temperature,
            boundary: params.boundary_config()?,
            update_rule: params.update_rule()?,
            ..base.clone()
        };
        config.check()?;
        let rule = SingleSpinRule::try_from(config.update_rule)?;

        let lattice = Lattice::from_spins(config.grid_size, spins, &config.boundary)?;

        let magnetization = lattice.magnetization();
        if magnetization != state.magnetization {
            return Err(SimError::InvalidState(format!(
                "magnetization {} does not match the grid ({magnetization})",
                state.magnetization
            )));
        }
        let energy = full_energy(&lattice, config.sequential);
        let relative = (state.energy - energy).abs() / energy.abs().max(1.0);
        if relative.is_nan() || relative > config.drift_tolerance {
            return Err(SimError::InvalidState(format!(
                "energy {} does not match the grid ({energy})",
                state.energy
            )));
        }
        if state.accepted_moves > state.total_moves {
            return Err(SimError::InvalidState(format!(
                "accepted_moves {} exceeds total_moves {}",
                state.accepted_moves, state.total_moves
            )));
        }

        let accountant = EnergyAccountant::new(&lattice, config.sequential)
            .with_counters(state.accepted_moves, state.total_moves);
        let metrics = state.metrics.into_metrics(lattice.n_spins)?;

        Ok(Installed {
            config,
            rule,
            lattice,
            accountant,
            metrics,
        })
    }
}
