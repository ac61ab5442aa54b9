use crate::error::ParameterError;
use serde::Serialize;

/// Strictly increasing sampling times, first point at `start`, last at `horizon`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    /// Evenly spaced grid of `sample_count` points over `[start, horizon]`.
    pub fn linspace(start: f64, horizon: f64, sample_count: usize) -> Result<Self, ParameterError> {
        if !start.is_finite() || !horizon.is_finite() || horizon <= start {
            return Err(ParameterError::InvalidHorizon { start, horizon });
        }
        if sample_count < 2 {
            return Err(ParameterError::InvalidSampleCount(sample_count));
        }
        let span = horizon - start;
        let last = (sample_count - 1) as f64;
        let mut points: Vec<f64> = (0..sample_count)
            .map(|i| start + span * (i as f64) / last)
            .collect();
        // Pin the endpoint so rounding never leaves the horizon unreached.
        points[sample_count - 1] = horizon;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_integer_days() {
        let grid = TimeGrid::linspace(0.0, 160.0, 161).unwrap();
        assert_eq!(grid.len(), 161);
        assert_eq!(grid.start(), 0.0);
        assert_eq!(grid.end(), 160.0);
        for (i, &t) in grid.points().iter().enumerate() {
            assert!((t - i as f64).abs() < 1e-12);
        }
        assert!(grid.points().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linspace_rejects_degenerate_requests() {
        assert_eq!(
            TimeGrid::linspace(0.0, 10.0, 1),
            Err(ParameterError::InvalidSampleCount(1))
        );
        assert!(matches!(
            TimeGrid::linspace(0.0, 0.0, 10),
            Err(ParameterError::InvalidHorizon { .. })
        ));
        assert!(TimeGrid::linspace(0.0, f64::NAN, 10).is_err());
    }
}
