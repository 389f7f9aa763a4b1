use crate::geometry::{Direction, Lattice, Link};
use crate::parallel::par_sum_rows;

/// Total energy `E = -Σ s_i s_j` over every bond, computed from scratch.
///
/// Bonds between lattice sites are enumerated through each site's right and
/// down links, so each one is counted exactly once (wrapping edges pair up,
/// which makes the left/up links of the opposite site redundant). Bonds to
/// ghost spins exist on one side only and are taken from all four
/// directions. Absent links contribute nothing.
///
/// The reduction runs over rows with rayon unless `sequential` is set. Every
/// bond energy is an integer, so both paths agree exactly.
pub fn full_energy(lattice: &Lattice, sequential: bool) -> f64 {
    let n = lattice.size;
    let spins = lattice.spins();
    let bonds: i64 = par_sum_rows(n, sequential, |i| {
        let mut row = 0i64;
        for j in 0..n {
            let idx = i * n + j;
            let si = spins[idx] as i64;
            for dir in Direction::ALL {
                let link = lattice.link(idx, dir);
                let counted = match link {
                    Link::Site(_) | Link::Negated(_) => {
                        matches!(dir, Direction::Right | Direction::Down)
                    }
                    Link::Ghost(_) => true,
                    Link::Absent => false,
                };
                if counted {
                    row += si * link.value(spins) as i64;
                }
            }
        }
        row
    });
    -(bonds as f64)
}

/// Exact magnetization `Σ s_i`, reduced the same way as [`full_energy`].
pub fn full_magnetization(lattice: &Lattice, sequential: bool) -> i64 {
    let n = lattice.size;
    let spins = lattice.spins();
    par_sum_rows(n, sequential, |i| {
        spins[i * n..(i + 1) * n].iter().map(|&s| s as i64).sum::<i64>()
    })
}

/// Mismatch found when the tracked energy is compared with a recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub tracked_energy: f64,
    pub recomputed_energy: f64,
    /// `|tracked - recomputed| / max(|recomputed|, 1)`.
    pub relative: f64,
    pub tracked_magnetization: i64,
    pub recomputed_magnetization: i64,
}

/// Running energy and magnetization of one lattice, updated per accepted flip.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyAccountant {
    energy: f64,
    magnetization: i64,
    accepted_moves: u64,
    total_moves: u64,
    accepted_since_recompute: u64,
    drift_events: u64,
    last_drift: Option<Drift>,
}

impl EnergyAccountant {
    /// Start from a full recomputation over `lattice`.
    pub fn new(lattice: &Lattice, sequential: bool) -> Self {
        Self {
            energy: full_energy(lattice, sequential),
            magnetization: full_magnetization(lattice, sequential),
            accepted_moves: 0,
            total_moves: 0,
            accepted_since_recompute: 0,
            drift_events: 0,
            last_drift: None,
        }
    }

    /// Reinstate persisted counters on top of a recomputed accountant.
    pub(crate) fn with_counters(mut self, accepted_moves: u64, total_moves: u64) -> Self {
        self.accepted_moves = accepted_moves;
        self.total_moves = total_moves;
        self
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn magnetization(&self) -> i64 {
        self.magnetization
    }

    pub fn accepted_moves(&self) -> u64 {
        self.accepted_moves
    }

    pub fn total_moves(&self) -> u64 {
        self.total_moves
    }

    /// `accepted / max(1, total)`.
    pub fn acceptance_rate(&self) -> f64 {
        self.accepted_moves as f64 / self.total_moves.max(1) as f64
    }

    pub fn accepted_since_recompute(&self) -> u64 {
        self.accepted_since_recompute
    }

    /// Number of recomputations that found drift beyond tolerance.
    pub fn drift_events(&self) -> u64 {
        self.drift_events
    }

    pub fn last_drift(&self) -> Option<Drift> {
        self.last_drift
    }

    /// Count one proposal, accepted or not.
    #[inline]
    pub fn record_attempt(&mut self) {
        self.total_moves += 1;
    }

    /// Account for an accepted single-spin flip at `idx` whose value before
    /// the flip was `spin_before`. Neighbors are read from `lattice`; a site is
    /// never its own neighbor, so it does not matter whether the flip has
    /// already been applied. Returns ΔE.
    #[inline]
    pub fn apply_flip(&mut self, lattice: &Lattice, idx: usize, spin_before: i8) -> f64 {
        let h = lattice.local_field(idx);
        let delta_e = (2 * spin_before as i32 * h) as f64;
        self.energy += delta_e;
        self.magnetization -= 2 * spin_before as i64;
        self.accepted_moves += 1;
        self.accepted_since_recompute += 1;
        delta_e
    }

    /// Compare the tracked values against a full recomputation without
    /// changing anything.
    pub fn check(&self, lattice: &Lattice, tolerance: f64, sequential: bool) -> Result<(), Drift> {
        let recomputed_energy = full_energy(lattice, sequential);
        let recomputed_magnetization = full_magnetization(lattice, sequential);
        let relative = (self.energy - recomputed_energy).abs() / recomputed_energy.abs().max(1.0);
        if relative > tolerance || recomputed_magnetization != self.magnetization {
            return Err(Drift {
                tracked_energy: self.energy,
                recomputed_energy,
                relative,
                tracked_magnetization: self.magnetization,
                recomputed_magnetization,
            });
        }
        Ok(())
    }

    /// Recompute from scratch and resync. Drift beyond `tolerance` is logged,
    /// counted and returned; it never stops the simulation.
    pub fn recompute(
        &mut self,
        lattice: &Lattice,
        tolerance: f64,
        sequential: bool,
    ) -> Option<Drift> {
        let outcome = self.check(lattice, tolerance, sequential);
        self.accepted_since_recompute = 0;
        match outcome {
            Ok(()) => None,
            Err(drift) => {
                log::warn!(
                    "energy drift: tracked E={} M={}, recomputed E={} M={} (relative {:.3e})",
                    drift.tracked_energy,
                    drift.tracked_magnetization,
                    drift.recomputed_energy,
                    drift.recomputed_magnetization,
                    drift.relative
                );
                self.energy = drift.recomputed_energy;
                self.magnetization = drift.recomputed_magnetization;
                self.drift_events += 1;
                self.last_drift = Some(drift);
                Some(drift)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryConfig, BoundaryKind, Edge};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    fn lattice(size: usize, spins: Vec<i8>, cfg: BoundaryConfig) -> Lattice {
        Lattice::from_spins(size, spins, &cfg).unwrap()
    }

    #[test]
    fn test_uniform_energies() {
        // All up: every bond contributes -1.
        let periodic = lattice(4, vec![1; 16], BoundaryConfig::default());
        assert_eq!(full_energy(&periodic, true), -32.0);

        // Open 4x4: 2 * 4 * 3 internal bonds.
        let open = lattice(4, vec![1; 16], BoundaryConfig::new(BoundaryKind::Open));
        assert_eq!(full_energy(&open, true), -24.0);

        // Fixed 3x3 ring +1, centre +1: 12 internal bonds plus 12 ghost bonds.
        let fixed = lattice(3, vec![1; 9], BoundaryConfig::fixed(1));
        assert_eq!(full_energy(&fixed, true), -24.0);

        // Anti-periodic: the 4 + 4 wrap bonds flip sign: -(24 - 8).
        let anti = lattice(4, vec![1; 16], BoundaryConfig::new(BoundaryKind::AntiPeriodic));
        assert_eq!(full_energy(&anti, true), -16.0);
    }

    #[test]
    fn test_checkerboard_energy() {
        let spins: Vec<i8> = (0..16)
            .map(|k| if (k / 4 + k % 4) % 2 == 0 { 1 } else { -1 })
            .collect();
        let lat = lattice(4, spins, BoundaryConfig::default());
        assert_eq!(full_energy(&lat, false), 32.0);
        assert_eq!(full_magnetization(&lat, false), 0);
    }

    #[test]
    fn test_incremental_matches_full_for_all_topologies() {
        let mixed = BoundaryConfig::mixed(
            [
                (Edge::Left, BoundaryKind::Open),
                (Edge::Right, BoundaryKind::Fixed),
                (Edge::Top, BoundaryKind::AntiPeriodic),
                (Edge::Bottom, BoundaryKind::AntiPeriodic),
            ],
            -1,
        );
        let configs = [
            BoundaryConfig::default(),
            BoundaryConfig::new(BoundaryKind::Open),
            BoundaryConfig::fixed(1),
            BoundaryConfig::new(BoundaryKind::AntiPeriodic),
            mixed,
        ];
        for (k, cfg) in configs.iter().enumerate() {
            let mut rng = Xoshiro256StarStar::seed_from_u64(k as u64);
            let mut lat = Lattice::random(6, cfg, &mut rng).unwrap();
            let mut acc = EnergyAccountant::new(&lat, true);
            for _ in 0..500 {
                let eligible = lat.eligible_sites();
                let idx = eligible[rng.gen_range(0..eligible.len())] as usize;
                let before = lat.flip(idx);
                acc.record_attempt();
                acc.apply_flip(&lat, idx, before);
                assert_eq!(acc.check(&lat, 1e-6, true), Ok(()));
                assert_eq!(acc.magnetization(), lat.magnetization());
            }
            assert_eq!(acc.accepted_moves(), 500);
            assert_eq!(acc.total_moves(), 500);
        }
    }

    #[test]
    fn test_recompute_reports_and_resyncs_drift() {
        let lat = lattice(3, vec![1; 9], BoundaryConfig::default());
        let mut acc = EnergyAccountant::new(&lat, true);
        assert_eq!(acc.recompute(&lat, 1e-6, true), None);

        acc.energy += 5.0;
        let drift = acc.recompute(&lat, 1e-6, true).unwrap();
        assert_eq!(drift.recomputed_energy, -18.0);
        assert_eq!(drift.tracked_energy, -13.0);
        assert_eq!(acc.drift_events(), 1);
        assert_eq!(acc.energy(), -18.0);
        assert_eq!(acc.check(&lat, 1e-6, true), Ok(()));
    }
}
