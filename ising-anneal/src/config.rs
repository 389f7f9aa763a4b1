use std::collections::BTreeMap;

use validator::{Validate, ValidationError};

use crate::error::SimError;

/// Boundary topology tag.
///
/// `Twisted` and `Random` are accepted by the parser so that persisted states
/// and user input naming them are rejected as a [`SimError::Config`] that
/// names the boundary, rather than as an unknown tag. No lattice can be built
/// with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    Periodic,
    Open,
    Fixed,
    AntiPeriodic,
    Mixed,
    Twisted,
    Random,
}

impl BoundaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::Open => "open",
            Self::Fixed => "fixed",
            Self::AntiPeriodic => "anti_periodic",
            Self::Mixed => "mixed",
            Self::Twisted => "twisted",
            Self::Random => "random",
        }
    }
}

impl TryFrom<&str> for BoundaryKind {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "periodic" => Ok(Self::Periodic),
            "open" => Ok(Self::Open),
            "fixed" => Ok(Self::Fixed),
            "anti_periodic" => Ok(Self::AntiPeriodic),
            "mixed" => Ok(Self::Mixed),
            "twisted" => Ok(Self::Twisted),
            "random" => Ok(Self::Random),
            _ => Err(format!(
                "unknown boundary '{s}', expected 'periodic', 'open', 'fixed', \
                 'anti_periodic', 'mixed', 'twisted' or 'random'"
            )),
        }
    }
}

/// One of the four lattice edges. Rows grow downward, columns to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl TryFrom<&str> for Edge {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(format!(
                "unknown edge '{s}', expected 'left', 'right', 'top' or 'bottom'"
            )),
        }
    }
}

/// Boundary topology plus its parameters.
///
/// `fixed_value` is used by every edge whose policy is `fixed`, both for the
/// pure `Fixed` topology and for fixed edges of a `Mixed` one. `edges` is only
/// read when `kind == Mixed`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConfig {
    pub kind: BoundaryKind,
    pub fixed_value: i8,
    pub edges: BTreeMap<Edge, BoundaryKind>,
}

impl BoundaryConfig {
    pub fn new(kind: BoundaryKind) -> Self {
        Self {
            kind,
            fixed_value: 1,
            edges: BTreeMap::new(),
        }
    }

    pub fn fixed(value: i8) -> Self {
        Self {
            kind: BoundaryKind::Fixed,
            fixed_value: value,
            edges: BTreeMap::new(),
        }
    }

    pub fn mixed(edges: impl IntoIterator<Item = (Edge, BoundaryKind)>, fixed_value: i8) -> Self {
        Self {
            kind: BoundaryKind::Mixed,
            fixed_value,
            edges: edges.into_iter().collect(),
        }
    }

    /// True if any edge resolves out-of-range neighbors to the fixed value.
    pub fn uses_fixed_value(&self) -> bool {
        match self.kind {
            BoundaryKind::Fixed => true,
            BoundaryKind::Mixed => self.edges.values().any(|k| *k == BoundaryKind::Fixed),
            _ => false,
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::new(BoundaryKind::Periodic)
    }
}

/// Update-rule tag.
///
/// Only the three single-spin rules have behavior; every other variant is
/// rejected with [`SimError::NotImplemented`] when a simulation is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateRule {
    Metropolis,
    Glauber,
    HeatBath,
    Wolff,
    SwendsenWang,
    Kawasaki,
    MultiCluster,
    ProjectedCluster,
    Loop,
    HoshenKopelman,
    FortuinKasteleyn,
    WangLandau,
    ParallelTempering,
    Multicanonical,
}

impl UpdateRule {
    pub const ALL: [UpdateRule; 14] = [
        Self::Metropolis,
        Self::Glauber,
        Self::HeatBath,
        Self::Wolff,
        Self::SwendsenWang,
        Self::Kawasaki,
        Self::MultiCluster,
        Self::ProjectedCluster,
        Self::Loop,
        Self::HoshenKopelman,
        Self::FortuinKasteleyn,
        Self::WangLandau,
        Self::ParallelTempering,
        Self::Multicanonical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metropolis => "metropolis",
            Self::Glauber => "glauber",
            Self::HeatBath => "heat_bath",
            Self::Wolff => "wolff",
            Self::SwendsenWang => "swendsen_wang",
            Self::Kawasaki => "kawasaki",
            Self::MultiCluster => "multi_cluster",
            Self::ProjectedCluster => "projected_cluster",
            Self::Loop => "loop",
            Self::HoshenKopelman => "hoshen_kopelman",
            Self::FortuinKasteleyn => "fortuin_kasteleyn",
            Self::WangLandau => "wang_landau",
            Self::ParallelTempering => "parallel_tempering",
            Self::Multicanonical => "multicanonical",
        }
    }
}

impl TryFrom<&str> for UpdateRule {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        // Older states spell it without the first 'i'.
        if s == "fortun_kasteleyn" {
            return Ok(Self::FortuinKasteleyn);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
                format!("unknown update_rule '{s}', expected one of {}", names.join(", "))
            })
    }
}

fn validate_sim_config(cfg: &SimConfig) -> Result<(), ValidationError> {
    if cfg.grid_size < 2 {
        return Err(ValidationError::new("grid_size must be >= 2"));
    }
    if cfg.boundary.uses_fixed_value() {
        if cfg.grid_size < 3 {
            return Err(ValidationError::new(
                "grid_size must be >= 3 with a fixed boundary",
            ));
        }
        if cfg.boundary.fixed_value != 1 && cfg.boundary.fixed_value != -1 {
            return Err(ValidationError::new("fixed_value must be -1 or +1"));
        }
    }
    if !(cfg.temperature.is_finite() && cfg.temperature > 0.0) {
        return Err(ValidationError::new("temperature must be finite and > 0"));
    }
    if !(cfg.min_temperature.is_finite() && cfg.min_temperature > 0.0) {
        return Err(ValidationError::new("min_temperature must be finite and > 0"));
    }
    if !(cfg.drift_tolerance.is_finite() && cfg.drift_tolerance > 0.0) {
        return Err(ValidationError::new("drift_tolerance must be finite and > 0"));
    }
    if cfg.recompute_interval == Some(0) {
        return Err(ValidationError::new("recompute_interval must be >= 1"));
    }
    Ok(())
}

/// Construction-time parameters of a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_sim_config"))]
pub struct SimConfig {
    /// Side length N of the N×N lattice.
    pub grid_size: usize,
    /// Temperature used when no schedule is supplied, and the starting point of one.
    pub temperature: f64,
    pub boundary: BoundaryConfig,
    pub update_rule: UpdateRule,
    /// Seed of the simulation's own PRNG; same seed, same trajectory.
    pub seed: u64,
    /// Recompute energy from scratch every this many accepted moves.
    pub recompute_interval: Option<u64>,
    /// Relative tolerance of the incremental energy against a recomputation.
    pub drift_tolerance: f64,
    /// Lower clamp for scheduled temperatures.
    pub min_temperature: f64,
    /// Run the full-energy reduction on the current thread instead of rayon.
    pub sequential: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            temperature: 1.0,
            boundary: BoundaryConfig::default(),
            update_rule: UpdateRule::Metropolis,
            seed: 42,
            recompute_interval: Some(10_000),
            drift_tolerance: 1e-6,
            min_temperature: 1e-6,
            sequential: false,
        }
    }
}

impl SimConfig {
    pub(crate) fn check(&self) -> Result<(), SimError> {
        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rule_tags_round_trip() {
        for rule in UpdateRule::ALL {
            assert_eq!(UpdateRule::try_from(rule.as_str()), Ok(rule));
        }
        assert!(UpdateRule::try_from("gibbs").is_err());
    }

    #[test]
    fn test_both_fortuin_kasteleyn_spellings() {
        for tag in ["fortuin_kasteleyn", "fortun_kasteleyn"] {
            assert_eq!(UpdateRule::try_from(tag), Ok(UpdateRule::FortuinKasteleyn));
        }
        assert_eq!(UpdateRule::FortuinKasteleyn.as_str(), "fortuin_kasteleyn");
    }

    #[test]
    fn test_boundary_tags() {
        assert_eq!(
            BoundaryKind::try_from("anti_periodic"),
            Ok(BoundaryKind::AntiPeriodic)
        );
        assert_eq!(BoundaryKind::Twisted.as_str(), "twisted");
        assert!(BoundaryKind::try_from("toroidal").is_err());
        assert_eq!(Edge::try_from("bottom"), Ok(Edge::Bottom));
    }

    #[test]
    fn test_validation() {
        assert!(SimConfig::default().check().is_ok());

        let tiny = SimConfig {
            grid_size: 1,
            ..SimConfig::default()
        };
        assert!(matches!(tiny.check(), Err(SimError::Config(_))));

        let fixed_too_small = SimConfig {
            grid_size: 2,
            boundary: BoundaryConfig::fixed(1),
            ..SimConfig::default()
        };
        assert!(fixed_too_small.check().is_err());

        let bad_value = SimConfig {
            boundary: BoundaryConfig::fixed(0),
            ..SimConfig::default()
        };
        assert!(bad_value.check().is_err());

        let cold = SimConfig {
            temperature: 0.0,
            ..SimConfig::default()
        };
        assert!(cold.check().is_err());

        let no_interval = SimConfig {
            recompute_interval: Some(0),
            ..SimConfig::default()
        };
        assert!(no_interval.check().is_err());
    }
}
