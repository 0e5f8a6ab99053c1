//! Small numeric helpers shared by the accuracy analyzer and the profiler.

/// Streaming mean/variance accumulator (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut m = Self::default();
        for x in values {
            m.push(x);
        }
        m
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Population standard deviation (divides by `n`).
    pub fn population_std(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2 / self.count as f64).max(0.0).sqrt())
    }

    /// Sample standard deviation (divides by `n - 1`). `None` below two observations.
    pub fn sample_std(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).max(0.0).sqrt())
    }
}

/// Linear-interpolated quantile of an ascending slice, `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        let frac = idx - lo as f64;
        Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
    }
}

/// Sort a copy of `values` ascending. Inputs are expected to be finite.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Clamp a score into `[0, 100]`, mapping NaN to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}

/// `100 * (1 - bad / total)`, or 100 when nothing was checked.
pub fn ratio_score(bad: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        clamp_score((1.0 - bad as f64 / total as f64) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moments_match_closed_form() {
        let m = Moments::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m.mean().unwrap() - 5.0).abs() < 1e-12);
        assert!((m.population_std().unwrap() - 2.0).abs() < 1e-12);
        assert!((m.sample_std().unwrap() - 2.138_089_935_299_395).abs() < 1e-12);
    }

    #[test]
    fn moments_of_constant_have_zero_spread() {
        let m = Moments::from_values([3.5; 10]);
        assert_eq!(m.population_std(), Some(0.0));
    }

    #[test]
    fn empty_moments_are_none() {
        let m = Moments::default();
        assert_eq!(m.mean(), None);
        assert_eq!(m.population_std(), None);
        assert_eq!(Moments::from_values([1.0]).sample_std(), None);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let s = sorted([4.0, 1.0, 3.0, 2.0]);
        assert_eq!(quantile(&s, 0.0), Some(1.0));
        assert_eq!(quantile(&s, 0.5), Some(2.5));
        assert_eq!(quantile(&s, 0.25), Some(1.75));
        assert_eq!(quantile(&s, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn ratio_score_handles_empty_denominator() {
        assert_eq!(ratio_score(0, 0), 100.0);
        assert_eq!(ratio_score(1, 4), 75.0);
        assert_eq!(ratio_score(4, 4), 0.0);
    }
}
