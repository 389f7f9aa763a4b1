use crate::config::{BoundaryConfig, BoundaryKind, Edge};
use crate::error::SimError;

/// How a lookup that leaves the lattice through one edge is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Wrap to the opposite edge.
    Wrap,
    /// Wrap to the opposite edge and negate the value read.
    AntiWrap,
    /// No neighbor; contributes zero field.
    Absent,
    /// A ghost spin with the given constant value.
    Ghost(i8),
}

impl EdgePolicy {
    fn wraps(&self) -> bool {
        matches!(self, Self::Wrap | Self::AntiWrap)
    }
}

/// Neighbor directions, in the order `neighbors` reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];
}

/// Resolved source of one neighbor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Another lattice site (flat index).
    Site(u32),
    /// Another lattice site read across an anti-periodic wrap.
    Negated(u32),
    /// A constant spin outside the lattice.
    Ghost(i8),
    Absent,
}

impl Link {
    /// Spin value seen through this link (0 when absent).
    #[inline]
    pub fn value(&self, spins: &[i8]) -> i8 {
        match *self {
            Link::Site(j) => spins[j as usize],
            Link::Negated(j) => -spins[j as usize],
            Link::Ghost(v) => v,
            Link::Absent => 0,
        }
    }
}

/// Per-edge policies of a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePolicies {
    pub left: EdgePolicy,
    pub right: EdgePolicy,
    pub top: EdgePolicy,
    pub bottom: EdgePolicy,
}

impl EdgePolicies {
    fn uniform(policy: EdgePolicy) -> Self {
        Self {
            left: policy,
            right: policy,
            top: policy,
            bottom: policy,
        }
    }

    /// Turn a boundary configuration into edge policies, rejecting
    /// unimplemented topologies and incomplete or inconsistent mixed maps.
    pub fn resolve(cfg: &BoundaryConfig) -> Result<Self, SimError> {
        match cfg.kind {
            BoundaryKind::Mixed => {
                let mut policies = Self::uniform(EdgePolicy::Absent);
                for edge in Edge::ALL {
                    let kind = cfg.edges.get(&edge).ok_or_else(|| {
                        SimError::Config(format!(
                            "mixed boundary is missing the '{}' edge",
                            edge.as_str()
                        ))
                    })?;
                    let policy = match kind {
                        BoundaryKind::Mixed => {
                            return Err(SimError::Config(format!(
                                "mixed boundary edge '{}' cannot itself be mixed",
                                edge.as_str()
                            )))
                        }
                        other => single_policy(*other, cfg.fixed_value)?,
                    };
                    match edge {
                        Edge::Left => policies.left = policy,
                        Edge::Right => policies.right = policy,
                        Edge::Top => policies.top = policy,
                        Edge::Bottom => policies.bottom = policy,
                    }
                }
                policies.check_pairing()?;
                Ok(policies)
            }
            kind => Ok(Self::uniform(single_policy(kind, cfg.fixed_value)?)),
        }
    }

    /// A wrapping edge must be matched by the same wrap on the opposite edge,
    /// otherwise a bond would exist from one side only.
    fn check_pairing(&self) -> Result<(), SimError> {
        for (a, b, axis) in [
            (self.left, self.right, "left/right"),
            (self.top, self.bottom, "top/bottom"),
        ] {
            if (a.wraps() || b.wraps()) && a != b {
                return Err(SimError::Config(format!(
                    "mixed boundary {axis} edges must wrap together, got {a:?} and {b:?}"
                )));
            }
        }
        Ok(())
    }
}

fn single_policy(kind: BoundaryKind, fixed_value: i8) -> Result<EdgePolicy, SimError> {
    match kind {
        BoundaryKind::Periodic => Ok(EdgePolicy::Wrap),
        BoundaryKind::AntiPeriodic => Ok(EdgePolicy::AntiWrap),
        BoundaryKind::Open => Ok(EdgePolicy::Absent),
        BoundaryKind::Fixed => Ok(EdgePolicy::Ghost(fixed_value)),
        BoundaryKind::Twisted | BoundaryKind::Random => Err(SimError::Config(format!(
            "boundary '{}' is not implemented",
            kind.as_str()
        ))),
        BoundaryKind::Mixed => Err(SimError::Config(
            "mixed boundary requires a per-edge map".to_string(),
        )),
    }
}

/// Resolves the four neighbors of a site on an N×N lattice under a set of
/// edge policies. Pure: it only reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryResolver {
    pub size: usize,
    pub policies: EdgePolicies,
}

impl BoundaryResolver {
    pub fn new(size: usize, policies: EdgePolicies) -> Self {
        Self { size, policies }
    }

    /// Where the neighbor of `(i, j)` in direction `dir` comes from.
    pub fn link(&self, i: usize, j: usize, dir: Direction) -> Link {
        let n = self.size;
        let (crossing, policy, wrapped) = match dir {
            Direction::Right => (j + 1 == n, self.policies.right, (i, (j + 1) % n)),
            Direction::Left => (j == 0, self.policies.left, (i, (j + n - 1) % n)),
            Direction::Down => (i + 1 == n, self.policies.bottom, ((i + 1) % n, j)),
            Direction::Up => (i == 0, self.policies.top, ((i + n - 1) % n, j)),
        };
        let flat = (wrapped.0 * n + wrapped.1) as u32;
        if !crossing {
            return Link::Site(flat);
        }
        match policy {
            EdgePolicy::Wrap => Link::Site(flat),
            EdgePolicy::AntiWrap => Link::Negated(flat),
            EdgePolicy::Absent => Link::Absent,
            EdgePolicy::Ghost(v) => Link::Ghost(v),
        }
    }

    /// Neighbor spin values of `(i, j)` as `[right, left, down, up]`.
    pub fn neighbors(&self, spins: &[i8], i: usize, j: usize) -> [i8; 4] {
        Direction::ALL.map(|dir| self.link(i, j, dir).value(spins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(size: usize, cfg: &BoundaryConfig) -> BoundaryResolver {
        BoundaryResolver::new(size, EdgePolicies::resolve(cfg).unwrap())
    }

    #[test]
    fn test_periodic_wraps() {
        let r = resolver(3, &BoundaryConfig::new(BoundaryKind::Periodic));
        // (0,0): right (0,1)=1, left (0,2)=2, down (1,0)=3, up (2,0)=6
        assert_eq!(r.link(0, 0, Direction::Right), Link::Site(1));
        assert_eq!(r.link(0, 0, Direction::Left), Link::Site(2));
        assert_eq!(r.link(0, 0, Direction::Down), Link::Site(3));
        assert_eq!(r.link(0, 0, Direction::Up), Link::Site(6));
        // (2,2): right wraps to (2,0)=6, down wraps to (0,2)=2
        assert_eq!(r.link(2, 2, Direction::Right), Link::Site(6));
        assert_eq!(r.link(2, 2, Direction::Down), Link::Site(2));
    }

    #[test]
    fn test_anti_periodic_negates_across_wrap_only() {
        let r = resolver(3, &BoundaryConfig::new(BoundaryKind::AntiPeriodic));
        let spins = [1i8, 1, -1, 1, 1, 1, 1, 1, 1];
        // (0,0): right is interior (+1), left wraps to (0,2)=-1 and is negated
        assert_eq!(r.neighbors(&spins, 0, 0), [1, 1, 1, -1]);
        assert_eq!(r.link(0, 1, Direction::Right), Link::Site(2));
    }

    #[test]
    fn test_open_and_fixed() {
        let spins = [1i8; 9];
        let open = resolver(3, &BoundaryConfig::new(BoundaryKind::Open));
        assert_eq!(open.neighbors(&spins, 0, 0), [1, 0, 1, 0]);
        assert_eq!(open.neighbors(&spins, 1, 1), [1, 1, 1, 1]);

        let fixed = resolver(3, &BoundaryConfig::fixed(-1));
        assert_eq!(fixed.neighbors(&spins, 2, 2), [-1, 1, -1, 1]);
    }

    #[test]
    fn test_mixed_edges() {
        let cfg = BoundaryConfig::mixed(
            [
                (Edge::Left, BoundaryKind::Periodic),
                (Edge::Right, BoundaryKind::Periodic),
                (Edge::Top, BoundaryKind::Open),
                (Edge::Bottom, BoundaryKind::Fixed),
            ],
            -1,
        );
        let r = resolver(3, &cfg);
        assert_eq!(r.link(0, 0, Direction::Left), Link::Site(2));
        assert_eq!(r.link(0, 0, Direction::Up), Link::Absent);
        assert_eq!(r.link(2, 1, Direction::Down), Link::Ghost(-1));
    }

    #[test]
    fn test_rejected_configurations() {
        let incomplete = BoundaryConfig::mixed([(Edge::Left, BoundaryKind::Open)], 1);
        assert!(matches!(
            EdgePolicies::resolve(&incomplete),
            Err(SimError::Config(_))
        ));

        let unpaired = BoundaryConfig::mixed(
            [
                (Edge::Left, BoundaryKind::Periodic),
                (Edge::Right, BoundaryKind::Open),
                (Edge::Top, BoundaryKind::Open),
                (Edge::Bottom, BoundaryKind::Open),
            ],
            1,
        );
        assert!(matches!(
            EdgePolicies::resolve(&unpaired),
            Err(SimError::Config(_))
        ));

        for kind in [BoundaryKind::Twisted, BoundaryKind::Random] {
            assert!(matches!(
                EdgePolicies::resolve(&BoundaryConfig::new(kind)),
                Err(SimError::Config(_))
            ));
        }
    }
}
