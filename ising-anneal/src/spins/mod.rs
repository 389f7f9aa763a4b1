pub mod energy;

pub use energy::{full_energy, full_magnetization, Drift, EnergyAccountant};
