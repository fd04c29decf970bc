//! EAR history statistics

/// Summary statistics of an EAR series
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EarStatistics {
    /// Mean value (0.0 for an empty series)
    pub mean: f64,
    /// Minimum value (0.0 for an empty series)
    pub min: f64,
    /// Number of samples
    pub count: usize,
}

impl EarStatistics {
    /// Compute statistics from a slice of EAR samples
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        Self {
            mean,
            min,
            count: values.len(),
        }
    }

    /// Fraction of samples below `threshold` (PERCLOS-style closure ratio)
    pub fn fraction_below(values: &[f64], threshold: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().filter(|&&v| v < threshold).count() as f64 / values.len() as f64
    }
}
