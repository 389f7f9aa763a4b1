use rand::Rng;

use super::rules::SingleSpinRule;
use crate::geometry::Lattice;
use crate::spins::EnergyAccountant;

/// What one Monte-Carlo proposal did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Flat index of the proposed site.
    pub site: usize,
    pub accepted: bool,
    /// Energy change applied (0 when rejected).
    pub delta_energy: f64,
}

/// One single-spin proposal.
///
/// Picks a site uniformly among the lattice's eligible sites, lets `rule`
/// decide, and on acceptance flips the site and hands the pre-flip value to
/// the accountant. The attempt is always counted.
pub fn monte_carlo_step(
    lattice: &mut Lattice,
    accountant: &mut EnergyAccountant,
    rule: SingleSpinRule,
    temp: f64,
    rng: &mut impl Rng,
) -> StepOutcome {
    let eligible = lattice.eligible_sites();
    let site = eligible[rng.gen_range(0..eligible.len())] as usize;
    let spin = lattice.spins()[site];
    let field = lattice.local_field(site);

    accountant.record_attempt();
    if !rule.decide(spin, field, temp, rng) {
        return StepOutcome {
            site,
            accepted: false,
            delta_energy: 0.0,
        };
    }

    let before = lattice.flip(site);
    let delta_energy = accountant.apply_flip(lattice, site, before);
    StepOutcome {
        site,
        accepted: true,
        delta_energy,
    }
}
