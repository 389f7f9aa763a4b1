pub mod autocorrelation;
pub mod metrics;
pub mod spatial;
mod stats;

pub use autocorrelation::{sokal_tau, AutocorrAccum, AUTOCORR_MAX_LAG};
pub use metrics::{MetricsAccumulator, Quantity, BINDER_MIN_SAMPLES};
pub use stats::RunningMoments;
