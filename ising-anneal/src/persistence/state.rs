use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{BoundaryConfig, BoundaryKind, Edge, UpdateRule};
use crate::error::SimError;
use crate::statistics::MetricsAccumulator;

/// Version written into every persisted state.
pub const STATE_VERSION: u32 = 1;

/// Construction parameters needed to rebuild a simulation from a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub grid_size: usize,
    /// Boundary tag, e.g. `"periodic"` or `"mixed"`.
    pub boundary: String,
    /// Update-rule tag, e.g. `"heat_bath"`.
    pub update_rule: String,
    pub fixed_value: i8,
    /// Edge tag to boundary tag; empty unless `boundary == "mixed"`.
    pub edges: BTreeMap<String, String>,
}

impl Parameters {
    pub fn new(grid_size: usize, boundary: &BoundaryConfig, update_rule: UpdateRule) -> Self {
        let edges = if boundary.kind == BoundaryKind::Mixed {
            boundary
                .edges
                .iter()
                .map(|(edge, kind)| (edge.as_str().to_string(), kind.as_str().to_string()))
                .collect()
        } else {
            BTreeMap::new()
        };
        Self {
            grid_size,
            boundary: boundary.kind.as_str().to_string(),
            update_rule: update_rule.as_str().to_string(),
            fixed_value: boundary.fixed_value,
            edges,
        }
    }

    pub fn boundary_config(&self) -> Result<BoundaryConfig, SimError> {
        let kind = BoundaryKind::try_from(self.boundary.as_str()).map_err(SimError::Config)?;
        let mut edges = BTreeMap::new();
        if kind == BoundaryKind::Mixed {
            for (edge, edge_kind) in &self.edges {
                edges.insert(
                    Edge::try_from(edge.as_str()).map_err(SimError::Config)?,
                    BoundaryKind::try_from(edge_kind.as_str()).map_err(SimError::Config)?,
                );
            }
        }
        Ok(BoundaryConfig {
            kind,
            fixed_value: self.fixed_value,
            edges,
        })
    }

    pub fn update_rule(&self) -> Result<UpdateRule, SimError> {
        UpdateRule::try_from(self.update_rule.as_str()).map_err(SimError::Config)
    }
}

/// Persisted metric histories and derived series.
///
/// The three sample histories are required in every encoding. Derived series
/// may be absent and load as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsState {
    pub energy_history: Vec<f64>,
    pub magnetization_history: Vec<f64>,
    pub temperature_history: Vec<f64>,
    pub acceptance_rate: f64,
    pub step_count: u64,
    #[serde(default)]
    pub specific_heat: Vec<f64>,
    #[serde(default)]
    pub susceptibility: Vec<f64>,
    #[serde(default)]
    pub binder_cumulant: Vec<f64>,
    #[serde(default)]
    pub heat_capacity: Vec<f64>,
    #[serde(default)]
    pub order_parameter: Vec<f64>,
    #[serde(default)]
    pub structure_factor: Vec<f64>,
    #[serde(default)]
    pub correlation_length: Vec<f64>,
    #[serde(default)]
    pub critical_slowing_down: Vec<f64>,
}

impl MetricsState {
    /// Names of the vector-valued fields, in declaration order.
    pub const SERIES: [&'static str; 11] = [
        "energy_history",
        "magnetization_history",
        "temperature_history",
        "specific_heat",
        "susceptibility",
        "binder_cumulant",
        "heat_capacity",
        "order_parameter",
        "structure_factor",
        "correlation_length",
        "critical_slowing_down",
    ];

    pub fn series(&self) -> [(&'static str, &Vec<f64>); 11] {
        [
            ("energy_history", &self.energy_history),
            ("magnetization_history", &self.magnetization_history),
            ("temperature_history", &self.temperature_history),
            ("specific_heat", &self.specific_heat),
            ("susceptibility", &self.susceptibility),
            ("binder_cumulant", &self.binder_cumulant),
            ("heat_capacity", &self.heat_capacity),
            ("order_parameter", &self.order_parameter),
            ("structure_factor", &self.structure_factor),
            ("correlation_length", &self.correlation_length),
            ("critical_slowing_down", &self.critical_slowing_down),
        ]
    }

    pub fn series_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        match name {
            "energy_history" => Some(&mut self.energy_history),
            "magnetization_history" => Some(&mut self.magnetization_history),
            "temperature_history" => Some(&mut self.temperature_history),
            "specific_heat" => Some(&mut self.specific_heat),
            "susceptibility" => Some(&mut self.susceptibility),
            "binder_cumulant" => Some(&mut self.binder_cumulant),
            "heat_capacity" => Some(&mut self.heat_capacity),
            "order_parameter" => Some(&mut self.order_parameter),
            "structure_factor" => Some(&mut self.structure_factor),
            "correlation_length" => Some(&mut self.correlation_length),
            "critical_slowing_down" => Some(&mut self.critical_slowing_down),
            _ => None,
        }
    }

    pub fn from_metrics(m: &MetricsAccumulator) -> Self {
        Self {
            energy_history: m.energy_history.clone(),
            magnetization_history: m.magnetization_history.clone(),
            temperature_history: m.temperature_history.clone(),
            acceptance_rate: m.acceptance_rate,
            step_count: m.step_count,
            specific_heat: m.specific_heat.clone(),
            susceptibility: m.susceptibility.clone(),
            binder_cumulant: m.binder_cumulant.clone(),
            heat_capacity: m.heat_capacity.clone(),
            order_parameter: m.order_parameter.clone(),
            structure_factor: m.structure_factor.clone(),
            correlation_length: m.correlation_length.clone(),
            critical_slowing_down: m.critical_slowing_down.clone(),
        }
    }

    /// Rebuild an accumulator for a lattice of `n_sites` spins.
    pub fn into_metrics(self, n_sites: usize) -> Result<MetricsAccumulator, SimError> {
        let n = self.energy_history.len();
        if self.magnetization_history.len() != n || self.temperature_history.len() != n {
            return Err(SimError::InvalidState(format!(
                "metric histories differ in length: energy {n}, magnetization {}, temperature {}",
                self.magnetization_history.len(),
                self.temperature_history.len()
            )));
        }
        if let Some((name, series)) = self.series().into_iter().find(|(_, s)| s.len() > n) {
            return Err(SimError::InvalidState(format!(
                "metric series '{name}' has {} entries but only {n} samples were recorded",
                series.len()
            )));
        }

        let mut m = MetricsAccumulator::new(n_sites);
        m.energy_history = self.energy_history;
        m.magnetization_history = self.magnetization_history;
        m.temperature_history = self.temperature_history;
        m.acceptance_rate = self.acceptance_rate;
        m.step_count = self.step_count;
        m.specific_heat = self.specific_heat;
        m.susceptibility = self.susceptibility;
        m.binder_cumulant = self.binder_cumulant;
        m.heat_capacity = self.heat_capacity;
        m.order_parameter = self.order_parameter;
        m.structure_factor = self.structure_factor;
        m.correlation_length = self.correlation_length;
        m.critical_slowing_down = self.critical_slowing_down;
        m.rebuild_moments();
        Ok(m)
    }
}

/// Owned, versioned snapshot of a simulation, shared by every codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub version: u32,
    pub grid: Vec<Vec<i8>>,
    pub temperature: f64,
    pub energy: f64,
    pub magnetization: i64,
    pub accepted_moves: u64,
    pub total_moves: u64,
    pub metrics: MetricsState,
    pub parameters: Parameters,
}

impl SimulationState {
    /// Row-major spins, after checking the grid is `grid_size` square.
    pub fn flat_spins(&self) -> Result<Vec<i8>, SimError> {
        let n = self.parameters.grid_size;
        if self.grid.len() != n || self.grid.iter().any(|row| row.len() != n) {
            return Err(SimError::InvalidState(format!(
                "grid is not {n}x{n} as declared by parameters.grid_size"
            )));
        }
        Ok(self.grid.concat())
    }
}
