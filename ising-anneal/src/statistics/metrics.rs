use super::autocorrelation::{sokal_tau, AutocorrAccum, AUTOCORR_MAX_LAG};
use super::spatial;
use super::stats::RunningMoments;
use crate::geometry::Lattice;

/// Number of magnetization samples required before the Binder cumulant and
/// the autocorrelation time are reported.
pub const BINDER_MIN_SAMPLES: usize = 10;

/// Derived quantities the accumulator knows about.
///
/// Only some have a computation; the rest are declared so that callers can
/// ask for them and get an explicit "unavailable" answer from
/// [`MetricsAccumulator::series`] instead of an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    SpecificHeat,
    Susceptibility,
    BinderCumulant,
    HeatCapacity,
    OrderParameter,
    StructureFactor,
    CorrelationLength,
    CriticalSlowingDown,
    Entropy,
    FreeEnergy,
    RenyiEntropy,
    DynamicSusceptibility,
    TopologicalCharge,
    VortexDensity,
    ChiralOrder,
    NematicOrder,
    SpinGlassOrder,
    FisherZeros,
    LeeYangZeros,
    DomainWallEnergy,
    BondOrder,
    CurrentCorrelation,
    ClusterSizes,
    CriticalExponents,
    PhaseDiagram,
}

impl Quantity {
    pub const COMPUTED: [Quantity; 8] = [
        Self::SpecificHeat,
        Self::Susceptibility,
        Self::BinderCumulant,
        Self::HeatCapacity,
        Self::OrderParameter,
        Self::StructureFactor,
        Self::CorrelationLength,
        Self::CriticalSlowingDown,
    ];

    pub const UNAVAILABLE: [Quantity; 17] = [
        Self::Entropy,
        Self::FreeEnergy,
        Self::RenyiEntropy,
        Self::DynamicSusceptibility,
        Self::TopologicalCharge,
        Self::VortexDensity,
        Self::ChiralOrder,
        Self::NematicOrder,
        Self::SpinGlassOrder,
        Self::FisherZeros,
        Self::LeeYangZeros,
        Self::DomainWallEnergy,
        Self::BondOrder,
        Self::CurrentCorrelation,
        Self::ClusterSizes,
        Self::CriticalExponents,
        Self::PhaseDiagram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecificHeat => "specific_heat",
            Self::Susceptibility => "susceptibility",
            Self::BinderCumulant => "binder_cumulant",
            Self::HeatCapacity => "heat_capacity",
            Self::OrderParameter => "order_parameter",
            Self::StructureFactor => "structure_factor",
            Self::CorrelationLength => "correlation_length",
            Self::CriticalSlowingDown => "critical_slowing_down",
            Self::Entropy => "entropy",
            Self::FreeEnergy => "free_energy",
            Self::RenyiEntropy => "renyi_entropy",
            Self::DynamicSusceptibility => "dynamic_susceptibility",
            Self::TopologicalCharge => "topological_charge",
            Self::VortexDensity => "vortex_density",
            Self::ChiralOrder => "chiral_order",
            Self::NematicOrder => "nematic_order",
            Self::SpinGlassOrder => "spin_glass_order",
            Self::FisherZeros => "fisher_zeros",
            Self::LeeYangZeros => "lee_yang_zeros",
            Self::DomainWallEnergy => "domain_wall_energy",
            Self::BondOrder => "bond_order",
            Self::CurrentCorrelation => "current_correlation",
            Self::ClusterSizes => "cluster_sizes",
            Self::CriticalExponents => "critical_exponents",
            Self::PhaseDiagram => "phase_diagram",
        }
    }

    pub fn is_available(&self) -> bool {
        Self::COMPUTED.contains(self)
    }
}

/// Sample histories and the statistical-mechanics quantities derived from them.
///
/// Derived series are cumulative over the whole history: each
/// [`update`](Self::update) appends one value computed from every sample so
/// far. Histories are never trimmed.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    n_sites: usize,
    pub energy_history: Vec<f64>,
    pub magnetization_history: Vec<f64>,
    pub temperature_history: Vec<f64>,
    pub acceptance_rate: f64,
    /// Number of `update` calls.
    pub step_count: u64,
    /// `Var(E) / T²`, once there are at least two samples.
    pub specific_heat: Vec<f64>,
    /// `Var(M) / T`, once there are at least two samples.
    pub susceptibility: Vec<f64>,
    /// `1 - ⟨M⁴⟩ / (3⟨M²⟩²)`, once there are more than ten samples.
    pub binder_cumulant: Vec<f64>,
    /// Specific heat per site.
    pub heat_capacity: Vec<f64>,
    /// `|M| / n_sites` of each sample.
    pub order_parameter: Vec<f64>,
    /// `S(k_min)` of each observed configuration.
    pub structure_factor: Vec<f64>,
    /// Second-moment correlation length of each observed configuration.
    pub correlation_length: Vec<f64>,
    /// Integrated autocorrelation time of the magnetization history.
    pub critical_slowing_down: Vec<f64>,
    energy_moments: RunningMoments,
    magnetization_moments: RunningMoments,
    magnetization_autocorr: AutocorrAccum,
}

impl MetricsAccumulator {
    pub fn new(n_sites: usize) -> Self {
        Self {
            n_sites: n_sites.max(1),
            energy_history: Vec::new(),
            magnetization_history: Vec::new(),
            temperature_history: Vec::new(),
            acceptance_rate: 0.0,
            step_count: 0,
            specific_heat: Vec::new(),
            susceptibility: Vec::new(),
            binder_cumulant: Vec::new(),
            heat_capacity: Vec::new(),
            order_parameter: Vec::new(),
            structure_factor: Vec::new(),
            correlation_length: Vec::new(),
            critical_slowing_down: Vec::new(),
            energy_moments: RunningMoments::default(),
            magnetization_moments: RunningMoments::default(),
            magnetization_autocorr: AutocorrAccum::new(AUTOCORR_MAX_LAG),
        }
    }

    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    pub fn len(&self) -> usize {
        self.energy_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy_history.is_empty()
    }

    /// Record one sample and append the derived quantities it enables.
    pub fn update(
        &mut self,
        energy: f64,
        magnetization: f64,
        temperature: f64,
        accepted_moves: u64,
        total_moves: u64,
    ) {
        self.energy_history.push(energy);
        self.magnetization_history.push(magnetization);
        self.temperature_history.push(temperature);
        self.acceptance_rate = accepted_moves as f64 / total_moves.max(1) as f64;
        self.step_count += 1;

        self.energy_moments.push(energy);
        self.magnetization_moments.push(magnetization);
        self.magnetization_autocorr.push(magnetization);
        self.order_parameter
            .push(magnetization.abs() / self.n_sites as f64);

        let n = self.magnetization_history.len();
        if n > 1 {
            let c = self.energy_moments.variance() / (temperature * temperature);
            self.specific_heat.push(c);
            self.heat_capacity.push(c / self.n_sites as f64);
            self.susceptibility
                .push(self.magnetization_moments.variance() / temperature);
        }
        if n > BINDER_MIN_SAMPLES {
            self.binder_cumulant
                .push(self.magnetization_moments.binder_cumulant());
            self.critical_slowing_down
                .push(sokal_tau(&self.magnetization_autocorr.finish()));
        }
    }

    /// Append the configuration-dependent quantities of `lattice`.
    pub fn observe_configuration(&mut self, lattice: &Lattice) {
        let (s_kmin, xi) = spatial::measure(lattice);
        self.structure_factor.push(s_kmin);
        self.correlation_length.push(xi);
    }

    /// The series of `quantity`, or `None` if it has no computation.
    pub fn series(&self, quantity: Quantity) -> Option<&[f64]> {
        let series = match quantity {
            Quantity::SpecificHeat => &self.specific_heat,
            Quantity::Susceptibility => &self.susceptibility,
            Quantity::BinderCumulant => &self.binder_cumulant,
            Quantity::HeatCapacity => &self.heat_capacity,
            Quantity::OrderParameter => &self.order_parameter,
            Quantity::StructureFactor => &self.structure_factor,
            Quantity::CorrelationLength => &self.correlation_length,
            Quantity::CriticalSlowingDown => &self.critical_slowing_down,
            _ => return None,
        };
        Some(series.as_slice())
    }

    /// Rebuild running state after histories were installed directly.
    pub(crate) fn rebuild_moments(&mut self) {
        self.energy_moments = RunningMoments::from_samples(&self.energy_history);
        self.magnetization_moments = RunningMoments::from_samples(&self.magnetization_history);
        self.magnetization_autocorr = AutocorrAccum::new(AUTOCORR_MAX_LAG);
        for &m in &self.magnetization_history {
            self.magnetization_autocorr.push(m);
        }
    }
}
