/// Running power sums of a scalar time series.
///
/// Keeps `Σx`, `Σx²` and `Σx⁴` so that population variance and the moments
/// needed by the Binder cumulant cost O(1) per sample over the whole history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningMoments {
    pub count: usize,
    sum: f64,
    sum2: f64,
    sum4: f64,
}

impl RunningMoments {
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut moments = Self::default();
        for &x in samples {
            moments.push(x);
        }
        moments
    }

    pub fn push(&mut self, x: f64) {
        let x2 = x * x;
        self.count += 1;
        self.sum += x;
        self.sum2 += x2;
        self.sum4 += x2 * x2;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// ⟨x²⟩.
    pub fn second(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum2 / self.count as f64
    }

    /// ⟨x⁴⟩.
    pub fn fourth(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum4 / self.count as f64
    }

    /// Population variance `⟨x²⟩ - ⟨x⟩²`, clamped at 0 against rounding.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.second() - mean * mean).max(0.0)
    }

    /// `1 - ⟨x⁴⟩ / (3⟨x²⟩²)`, or 0 when `⟨x²⟩ = 0`.
    pub fn binder_cumulant(&self) -> f64 {
        let m2 = self.second();
        if m2 > 0.0 {
            1.0 - self.fourth() / (3.0 * m2 * m2)
        } else {
            0.0
        }
    }
}
