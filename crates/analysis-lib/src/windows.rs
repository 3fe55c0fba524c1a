//! Job activity windows derived from observed timestamps

use crate::models::{JobWindow, TelemetryRecord, UtilizationSample};
use std::collections::BTreeMap;

/// Anything carrying a job_id and an epoch-second timestamp
pub trait JobSample {
    fn job_id(&self) -> u64;
    fn timestamp(&self) -> i64;
}

impl JobSample for UtilizationSample {
    fn job_id(&self) -> u64 {
        self.job_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl JobSample for TelemetryRecord {
    fn job_id(&self) -> u64 {
        self.job_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Resolves per-job windows as the grouped min/max of timestamp
pub struct JobWindowJoiner;

impl JobWindowJoiner {
    pub fn windows<T: JobSample>(selection: &[T]) -> BTreeMap<u64, JobWindow> {
        let mut windows: BTreeMap<u64, JobWindow> = BTreeMap::new();
        for sample in selection {
            let ts = sample.timestamp();
            windows
                .entry(sample.job_id())
                .and_modify(|w| {
                    w.start = w.start.min(ts);
                    w.end = w.end.map(|end| end.max(ts));
                })
                .or_insert(JobWindow {
                    job_id: sample.job_id(),
                    start: ts,
                    end: Some(ts),
                });
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(job_id: u64, timestamp: i64) -> UtilizationSample {
        UtilizationSample {
            job_id,
            component_id: 1,
            timestamp,
            ratio: 0.5,
        }
    }

    #[test]
    fn test_grouped_min_max() {
        let selection = [sample(42, 105), sample(7, 50), sample(42, 100), sample(42, 120)];
        let windows = JobWindowJoiner::windows(&selection);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[&42].start, 100);
        assert_eq!(windows[&42].end, Some(120));
        assert_eq!(windows[&7].start, 50);
        assert_eq!(windows[&7].end, Some(50));
    }

    #[test]
    fn test_empty_selection() {
        let windows = JobWindowJoiner::windows::<UtilizationSample>(&[]);
        assert!(windows.is_empty());
    }
}
