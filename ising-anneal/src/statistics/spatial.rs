use std::f64::consts::PI;

use crate::geometry::Lattice;

/// Structure factor `S(k) = |Σ_r s_r e^{ik·r}|² / N²` at `k = (kx, ky)`,
/// where `kx` multiplies the column index and `ky` the row index.
pub fn structure_factor(lattice: &Lattice, kx: f64, ky: f64) -> f64 {
    let n = lattice.size;
    let (mut re, mut im) = (0.0f64, 0.0f64);
    for i in 0..n {
        for j in 0..n {
            let phase = kx * j as f64 + ky * i as f64;
            let s = lattice.get(i, j) as f64;
            re += s * phase.cos();
            im += s * phase.sin();
        }
    }
    (re * re + im * im) / lattice.n_spins as f64
}

/// `S(k_min)` averaged over both axes, with `k_min = 2π / N`.
pub fn structure_factor_kmin(lattice: &Lattice) -> f64 {
    let k = 2.0 * PI / lattice.size as f64;
    0.5 * (structure_factor(lattice, k, 0.0) + structure_factor(lattice, 0.0, k))
}

/// Second-moment correlation length
/// `ξ = sqrt(S(0) / S(k_min) - 1) / (2 sin(k_min / 2))`.
///
/// Returns 0 when `S(k_min)` vanishes to rounding relative to `S(0)`, or
/// when the ratio is below 1.
pub fn second_moment_correlation_length(s0: f64, s_kmin: f64, size: usize) -> f64 {
    if s_kmin <= f64::EPSILON * s0.max(1.0) {
        return 0.0;
    }
    let ratio = s0 / s_kmin;
    if ratio < 1.0 {
        return 0.0;
    }
    let k = 2.0 * PI / size as f64;
    (ratio - 1.0).sqrt() / (2.0 * (k / 2.0).sin())
}

/// `(S(k_min), ξ)` for the current configuration.
pub fn measure(lattice: &Lattice) -> (f64, f64) {
    let m = lattice.magnetization() as f64;
    let s0 = m * m / lattice.n_spins as f64;
    let s_kmin = structure_factor_kmin(lattice);
    (s_kmin, second_moment_correlation_length(s0, s_kmin, lattice.size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryConfig;

    #[test]
    fn test_uniform_lattice() {
        let lat = Lattice::from_spins(4, vec![1; 16], &BoundaryConfig::default()).unwrap();
        // All weight sits at k = 0.
        assert!((structure_factor(&lat, 0.0, 0.0) - 16.0).abs() < 1e-12);
        assert!(structure_factor_kmin(&lat) < 1e-12);
        let (s_kmin, xi) = measure(&lat);
        assert!(s_kmin < 1e-12);
        assert_eq!(xi, 0.0);
    }

    #[test]
    fn test_stripes_peak_at_kmin() {
        // Left half up, right half down: a single long-wavelength domain wall pair.
        let spins: Vec<i8> = (0..64).map(|k| if k % 8 < 4 { 1 } else { -1 }).collect();
        let lat = Lattice::from_spins(8, spins, &BoundaryConfig::default()).unwrap();
        let along_x = structure_factor(&lat, 2.0 * PI / 8.0, 0.0);
        let along_y = structure_factor(&lat, 0.0, 2.0 * PI / 8.0);
        assert!(along_x > 1.0);
        assert!(along_y < 1e-9);
    }

    #[test]
    fn test_correlation_length_formula() {
        assert_eq!(second_moment_correlation_length(5.0, 0.0, 8), 0.0);
        assert_eq!(second_moment_correlation_length(1.0, 2.0, 8), 0.0);
        let xi = second_moment_correlation_length(10.0, 2.0, 16);
        let expected = 2.0 / (2.0 * (PI / 16.0).sin());
        assert!((xi - expected).abs() < 1e-12);
    }
}
