pub mod config;
pub mod error;
pub mod geometry;
pub mod mcmc;
pub mod persistence;
pub mod simulation;
pub mod spins;
pub mod statistics;

mod parallel;

pub use config::{BoundaryConfig, BoundaryKind, Edge, SimConfig, UpdateRule};
pub use error::{Result, SimError};
pub use geometry::Lattice;
pub use mcmc::{AnnealingSchedule, Schedule, SingleSpinRule, StepOutcome};
pub use persistence::{Format, SimulationState, StateCodec};
pub use simulation::{RunSummary, Simulation};
pub use spins::{Drift, EnergyAccountant};
pub use statistics::{MetricsAccumulator, Quantity};
