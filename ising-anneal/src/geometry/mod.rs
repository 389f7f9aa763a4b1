pub mod boundary;
pub mod lattice;

pub use boundary::{BoundaryResolver, Direction, EdgePolicies, EdgePolicy, Link};
pub use lattice::Lattice;
