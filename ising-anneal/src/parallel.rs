use rayon::prelude::*;

/// Sum a per-row closure over `n_rows` rows, optionally in parallel.
///
/// When `sequential` is true, rows are processed on the current thread.
pub fn par_sum_rows<T>(n_rows: usize, sequential: bool, body: impl Fn(usize) -> T + Send + Sync) -> T
where
    T: Send + std::iter::Sum<T>,
{
    if sequential {
        (0..n_rows).map(body).sum()
    } else {
        (0..n_rows).into_par_iter().map(body).sum()
    }
}
