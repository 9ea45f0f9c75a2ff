//! Speedup and efficiency relative to a single-worker baseline.

/// Baseline time divided by elapsed time, `None` when `elapsed` is not positive
pub fn speedup(baseline: f64, elapsed: f64) -> Option<f64> {
    if elapsed > 0.0 {
        Some(baseline / elapsed)
    } else {
        None
    }
}

/// Speedup divided by worker count, `None` for zero workers
pub fn efficiency(speedup: f64, workers: u32) -> Option<f64> {
    if workers == 0 {
        None
    } else {
        Some(speedup / f64::from(workers))
    }
}

/// One measurement on a scaling curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingPoint {
    pub workers: u32,
    pub elapsed: f64,
    pub speedup: Option<f64>,
    pub efficiency: Option<f64>,
}

impl ScalingPoint {
    /// Build a point against `baseline`; both ratios are `None` without one
    pub fn new(workers: u32, elapsed: f64, baseline: Option<f64>) -> Self {
        let speedup = baseline.and_then(|b| speedup(b, elapsed));
        Self {
            workers,
            elapsed,
            speedup,
            efficiency: speedup.and_then(|s| efficiency(s, workers)),
        }
    }
}

/// Elapsed time of the first single-worker sample
pub fn baseline(samples: &[(u32, f64)]) -> Option<f64> {
    samples.iter().find(|(w, _)| *w == 1).map(|(_, t)| *t)
}

/// Scaling curve for `(workers, elapsed)` samples in input order.
///
/// Returns `None` when there is no single-worker baseline.
pub fn scaling_curve(samples: &[(u32, f64)]) -> Option<Vec<ScalingPoint>> {
    let base = baseline(samples)?;
    Some(
        samples
            .iter()
            .map(|&(workers, elapsed)| ScalingPoint::new(workers, elapsed, Some(base)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speedup_basic() {
        assert_eq!(speedup(10.0, 10.0), Some(1.0));
        assert_eq!(speedup(10.0, 5.0), Some(2.0));
        assert_eq!(speedup(10.0, 0.0), None);
    }

    #[test]
    fn test_efficiency_zero_workers() {
        assert_eq!(efficiency(2.0, 0), None);
        assert_eq!(efficiency(2.0, 4), Some(0.5));
    }

    #[test]
    fn test_curve_single_thread_is_exactly_one() {
        let curve = scaling_curve(&[(1, 7.3), (4, 2.0)]).unwrap();
        assert_eq!(curve[0].speedup, Some(1.0));
        assert_eq!(curve[0].efficiency, Some(1.0));
    }

    #[test]
    fn test_curve_two_threads() {
        let curve = scaling_curve(&[(1, 10.0), (2, 6.0)]).unwrap();
        let s = curve[1].speedup.unwrap();
        assert!((s - 10.0 / 6.0).abs() < 1e-12);
        assert!((curve[1].efficiency.unwrap() - s / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_without_baseline() {
        assert!(scaling_curve(&[(2, 6.0), (4, 3.0)]).is_none());
    }

    #[test]
    fn test_first_baseline_wins() {
        assert_eq!(baseline(&[(2, 5.0), (1, 9.0), (1, 11.0)]), Some(9.0));
    }
}
