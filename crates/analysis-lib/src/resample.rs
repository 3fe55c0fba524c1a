//! Uniform-grid resampling of irregular series
//!
//! Telemetry arrives at irregular intervals per component. Before series can
//! be combined they are aligned onto a common grid covering the job window,
//! carrying the last observed value forward across gaps.

use crate::error::{AnalysisError, Result};
use crate::models::Series;

/// Default grid spacing in seconds
const DEFAULT_STEP_SECS: i64 = 1;

/// Forward-fill resampler onto a fixed-step grid
#[derive(Debug, Clone, Copy)]
pub struct SeriesResampler {
    step_secs: i64,
}

impl SeriesResampler {
    pub fn new(step_secs: i64) -> Self {
        Self {
            step_secs: step_secs.max(1),
        }
    }

    pub fn step_secs(&self) -> i64 {
        self.step_secs
    }

    /// Number of grid points covering `[start, end]`
    pub fn grid_len(&self, start: i64, end: i64) -> usize {
        if end < start {
            return 0;
        }
        ((end - start) / self.step_secs) as usize + 1
    }

    /// Resample `series` onto the grid `start, start + step, ..., <= end`
    ///
    /// Each grid point takes the most recent observation at or before it.
    /// A grid point preceding the first observation has no defined value and
    /// fails the whole resample.
    pub fn resample(&self, series: &Series, start: i64, end: i64) -> Result<Series> {
        if start > end {
            return Err(AnalysisError::invalid_parameter(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        if series.is_empty() {
            return Err(AnalysisError::computation("cannot resample an empty series"));
        }
        if series.timestamps.len() != series.values.len() {
            return Err(AnalysisError::computation(format!(
                "series has {} timestamps but {} values",
                series.timestamps.len(),
                series.values.len()
            )));
        }
        if let Some(pair) = series.timestamps.windows(2).find(|w| w[1] <= w[0]) {
            return Err(AnalysisError::computation(format!(
                "series timestamps not strictly increasing at {} -> {}",
                pair[0], pair[1]
            )));
        }
        let first = series.timestamps[0];
        if first > start {
            return Err(AnalysisError::computation(format!(
                "no observation at or before grid start {} (first sample at {})",
                start, first
            )));
        }

        let len = self.grid_len(start, end);
        let mut timestamps = Vec::with_capacity(len);
        let mut values = Vec::with_capacity(len);

        // `cursor` is the index of the latest observation <= current grid point
        let mut cursor = 0;
        for i in 0..len {
            let t = start + i as i64 * self.step_secs;
            while cursor + 1 < series.len() && series.timestamps[cursor + 1] <= t {
                cursor += 1;
            }
            timestamps.push(t);
            values.push(series.values[cursor]);
        }

        Ok(Series { timestamps, values })
    }
}

impl Default for SeriesResampler {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_fill_gaps() {
        let series = Series::from_points([(100, 1.0), (103, 4.0), (104, 5.0)]);
        let out = SeriesResampler::default().resample(&series, 100, 105).unwrap();

        assert_eq!(out.timestamps, vec![100, 101, 102, 103, 104, 105]);
        assert_eq!(out.values, vec![1.0, 1.0, 1.0, 4.0, 5.0, 5.0]);
    }

    #[test]
    fn test_samples_before_window_carry_in() {
        let series = Series::from_points([(90, 7.0), (102, 8.0)]);
        let out = SeriesResampler::default().resample(&series, 100, 103).unwrap();
        assert_eq!(out.values, vec![7.0, 7.0, 8.0, 8.0]);
    }

    #[test]
    fn test_grid_before_first_observation_fails() {
        let series = Series::from_points([(105, 1.0), (106, 2.0)]);
        let err = SeriesResampler::default()
            .resample(&series, 100, 110)
            .unwrap_err();
        assert_eq!(err.kind(), "computation");
    }

    #[test]
    fn test_one_hz_series_is_idempotent() {
        let series = Series::from_points((0..11).map(|i| (1_000 + i, i as f64 * 0.5)));
        let resampler = SeriesResampler::default();

        let once = resampler.resample(&series, 1_000, 1_010).unwrap();
        assert_eq!(once, series);

        let twice = resampler.resample(&once, 1_000, 1_010).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_non_increasing_timestamps_rejected() {
        let series = Series::from_points([(100, 1.0), (100, 2.0)]);
        assert!(SeriesResampler::default().resample(&series, 100, 101).is_err());
    }

    #[test]
    fn test_empty_series_rejected() {
        let err = SeriesResampler::default()
            .resample(&Series::default(), 0, 10)
            .unwrap_err();
        assert_eq!(err.kind(), "computation");
    }

    #[test]
    fn test_inverted_window_rejected() {
        let series = Series::from_points([(100, 1.0)]);
        let err = SeriesResampler::default()
            .resample(&series, 110, 100)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn test_coarser_step() {
        let series = Series::from_points([(0, 1.0), (5, 2.0)]);
        let resampler = SeriesResampler::new(2);
        let out = resampler.resample(&series, 0, 9).unwrap();
        assert_eq!(resampler.grid_len(0, 9), 5);
        assert_eq!(out.timestamps, vec![0, 2, 4, 6, 8]);
        assert_eq!(out.values, vec![1.0, 1.0, 1.0, 2.0, 2.0]);
    }
}
