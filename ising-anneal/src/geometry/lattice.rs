use rand::Rng;

use super::boundary::{BoundaryResolver, Direction, EdgePolicies, Link};
use crate::config::{BoundaryConfig, BoundaryKind};
use crate::error::SimError;

/// N×N lattice of ±1 spins with a precomputed neighbor table.
///
/// Sites are indexed in row-major order: site `(i, j)` is `i * size + j`.
/// The neighbor table stores one [`Link`] per site and direction, laid out as
/// `links[idx * 4 + dir]` with `dir` in [`Direction::ALL`] order.
///
/// Under the pure `fixed` topology the outer ring holds the fixed value for
/// the lattice's lifetime and is left out of [`eligible_sites`](Self::eligible_sites).
#[derive(Debug, Clone)]
pub struct Lattice {
    /// Side length N.
    pub size: usize,
    /// N².
    pub n_spins: usize,
    spins: Vec<i8>,
    boundary: BoundaryConfig,
    resolver: BoundaryResolver,
    links: Vec<Link>,
    eligible: Vec<u32>,
    frozen_ring: bool,
}

impl Lattice {
    /// Build a lattice with uniformly random spins drawn from `rng`.
    pub fn random(
        size: usize,
        boundary: &BoundaryConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, SimError> {
        let spins = (0..size * size)
            .map(|_| if rng.gen::<f64>() < 0.5 { -1 } else { 1 })
            .collect();
        let mut lattice = Self::build(size, spins, boundary)?;
        if lattice.frozen_ring {
            let value = boundary.fixed_value;
            for idx in 0..lattice.n_spins {
                if is_ring(size, idx) {
                    lattice.spins[idx] = value;
                }
            }
        }
        Ok(lattice)
    }

    /// Build a lattice from an existing row-major spin array.
    ///
    /// Fails if a value is not ±1 or, under `fixed`, if the outer ring does
    /// not hold the fixed value.
    pub fn from_spins(
        size: usize,
        spins: Vec<i8>,
        boundary: &BoundaryConfig,
    ) -> Result<Self, SimError> {
        if spins.len() != size * size {
            return Err(SimError::InvalidState(format!(
                "expected {} spins for a {size}x{size} grid, got {}",
                size * size,
                spins.len()
            )));
        }
        if let Some(pos) = spins.iter().position(|&s| s != 1 && s != -1) {
            return Err(SimError::InvalidState(format!(
                "spin at ({}, {}) is {}, expected -1 or +1",
                pos / size,
                pos % size,
                spins[pos]
            )));
        }
        let lattice = Self::build(size, spins, boundary)?;
        if lattice.frozen_ring {
            let value = boundary.fixed_value;
            if lattice.ring_sites().any(|idx| lattice.spins[idx] != value) {
                return Err(SimError::InvalidState(format!(
                    "fixed boundary ring must hold {value}"
                )));
            }
        }
        Ok(lattice)
    }

    fn build(size: usize, spins: Vec<i8>, boundary: &BoundaryConfig) -> Result<Self, SimError> {
        if size < 2 {
            return Err(SimError::Config(format!("grid_size must be >= 2, got {size}")));
        }
        let policies = EdgePolicies::resolve(boundary)?;
        let resolver = BoundaryResolver::new(size, policies);
        let n_spins = size * size;

        let mut links = Vec::with_capacity(n_spins * 4);
        for i in 0..size {
            for j in 0..size {
                for dir in Direction::ALL {
                    links.push(resolver.link(i, j, dir));
                }
            }
        }

        let frozen_ring = boundary.kind == BoundaryKind::Fixed;
        let eligible: Vec<u32> = (0..n_spins)
            .filter(|&idx| !(frozen_ring && is_ring(size, idx)))
            .map(|idx| idx as u32)
            .collect();
        if eligible.is_empty() {
            return Err(SimError::Config(format!(
                "a {size}x{size} lattice with a fixed boundary has no updatable sites"
            )));
        }

        Ok(Self {
            size,
            n_spins,
            spins,
            boundary: boundary.clone(),
            resolver,
            links,
            eligible,
            frozen_ring,
        })
    }

    fn ring_sites(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.n_spins).filter(move |&idx| is_ring(self.size, idx))
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.size + j
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> i8 {
        self.spins[self.index(i, j)]
    }

    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Owned copy of the grid as rows.
    pub fn to_grid(&self) -> Vec<Vec<i8>> {
        self.spins.chunks(self.size).map(|row| row.to_vec()).collect()
    }

    pub fn boundary(&self) -> &BoundaryConfig {
        &self.boundary
    }

    pub fn resolver(&self) -> &BoundaryResolver {
        &self.resolver
    }

    /// Sites a Monte-Carlo step may pick.
    pub fn eligible_sites(&self) -> &[u32] {
        &self.eligible
    }

    /// True if `(i, j)` belongs to the frozen ring of a `fixed` lattice.
    pub fn is_frozen(&self, i: usize, j: usize) -> bool {
        self.frozen_ring && is_ring(self.size, self.index(i, j))
    }

    #[inline]
    pub fn link(&self, idx: usize, dir: Direction) -> Link {
        self.links[idx * 4 + dir as usize]
    }

    /// Neighbor values of `(i, j)` as `[right, left, down, up]`.
    pub fn neighbors(&self, i: usize, j: usize) -> [i8; 4] {
        let idx = self.index(i, j);
        Direction::ALL.map(|dir| self.link(idx, dir).value(&self.spins))
    }

    /// Sum of the four neighbor values of site `idx`.
    #[inline]
    pub fn local_field(&self, idx: usize) -> i32 {
        self.links[idx * 4..idx * 4 + 4]
            .iter()
            .map(|link| link.value(&self.spins) as i32)
            .sum()
    }

    /// Exact sum of all spins.
    pub fn magnetization(&self) -> i64 {
        self.spins.iter().map(|&s| s as i64).sum()
    }

    /// Flip site `idx`, returning the pre-flip value. Crate-private so the
    /// lattice is only ever mutated together with its energy accountant.
    #[inline]
    pub(crate) fn flip(&mut self, idx: usize) -> i8 {
        let before = self.spins[idx];
        self.spins[idx] = -before;
        before
    }
}

#[inline]
fn is_ring(size: usize, idx: usize) -> bool {
    let (i, j) = (idx / size, idx % size);
    i == 0 || j == 0 || i + 1 == size || j + 1 == size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Edge;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_random_spins_are_binary() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        for size in 2..12 {
            let lat = Lattice::random(size, &BoundaryConfig::default(), &mut rng).unwrap();
            assert_eq!(lat.n_spins, size * size);
            assert!(lat.spins().iter().all(|&s| s == 1 || s == -1));
        }
    }

    #[test]
    fn test_neighbor_table_matches_resolver() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let cfg = BoundaryConfig::mixed(
            [
                (Edge::Left, BoundaryKind::AntiPeriodic),
                (Edge::Right, BoundaryKind::AntiPeriodic),
                (Edge::Top, BoundaryKind::Fixed),
                (Edge::Bottom, BoundaryKind::Open),
            ],
            -1,
        );
        let lat = Lattice::random(5, &cfg, &mut rng).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(
                    lat.neighbors(i, j),
                    lat.resolver().neighbors(lat.spins(), i, j)
                );
                let field: i32 = lat.neighbors(i, j).iter().map(|&v| v as i32).sum();
                assert_eq!(lat.local_field(lat.index(i, j)), field);
            }
        }
    }

    #[test]
    fn test_fixed_ring() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let lat = Lattice::random(5, &BoundaryConfig::fixed(-1), &mut rng).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                if lat.is_frozen(i, j) {
                    assert_eq!(lat.get(i, j), -1);
                }
            }
        }
        // 5x5 has a 3x3 interior
        assert_eq!(lat.eligible_sites().len(), 9);
        assert!(!lat.eligible_sites().contains(&0));
        assert!(lat.eligible_sites().contains(&(lat.index(2, 2) as u32)));
    }

    #[test]
    fn test_random_fixed_lattice_sets_whole_ring() {
        for (seed, value) in [(1u64, 1i8), (2, -1), (3, 1), (4, -1)] {
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
            let lat = Lattice::random(6, &BoundaryConfig::fixed(value), &mut rng).unwrap();
            let ring: Vec<i8> = (0..lat.n_spins)
                .filter(|&idx| is_ring(6, idx))
                .map(|idx| lat.spins()[idx])
                .collect();
            assert_eq!(ring.len(), 20);
            assert!(ring.iter().all(|&s| s == value));
            assert!(Lattice::from_spins(6, lat.spins().to_vec(), &BoundaryConfig::fixed(value)).is_ok());
        }
    }

    #[test]
    fn test_from_spins_rejects_bad_input() {
        let periodic = BoundaryConfig::default();
        assert!(Lattice::from_spins(2, vec![1, -1, 1], &periodic).is_err());
        assert!(Lattice::from_spins(2, vec![1, -1, 0, 1], &periodic).is_err());

        let mut spins = vec![1i8; 9];
        spins[4] = -1;
        assert!(Lattice::from_spins(3, spins.clone(), &BoundaryConfig::fixed(1)).is_ok());
        spins[0] = -1;
        assert!(matches!(
            Lattice::from_spins(3, spins, &BoundaryConfig::fixed(1)),
            Err(SimError::InvalidState(_))
        ));
    }

    #[test]
    fn test_flip_and_magnetization() {
        let mut lat = Lattice::from_spins(2, vec![1, 1, 1, -1], &BoundaryConfig::default()).unwrap();
        assert_eq!(lat.magnetization(), 2);
        assert_eq!(lat.flip(3), -1);
        assert_eq!(lat.magnetization(), 4);
        assert_eq!(lat.to_grid(), vec![vec![1, 1], vec![1, 1]]);
    }
}
