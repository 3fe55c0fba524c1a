//! Grouped reductions and order-statistic boundary filtering

use crate::models::{JobWindow, Table, UtilizationSample};
use crate::params::Activity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which end of the distribution a ranking selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

impl Direction {
    /// Direction and boundary count encoded by a signed request threshold
    ///
    /// Negative thresholds select the low end with `count = |T|`; anything
    /// else selects the high end with `count = T + 1`.
    pub fn from_threshold(threshold: i64) -> (Self, usize) {
        if threshold < 0 {
            (Direction::Low, threshold.unsigned_abs() as usize)
        } else {
            (Direction::High, threshold as usize + 1)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::High => "high",
            Direction::Low => "low",
        }
    }
}

/// Grouping key of a reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Job,
    Component,
}

impl GroupKey {
    fn of(&self, sample: &UtilizationSample) -> u64 {
        match self {
            GroupKey::Job => sample.job_id,
            GroupKey::Component => sample.component_id,
        }
    }
}

/// One reduced group in a ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    /// job_id or component_id, depending on the grouping
    pub key: u64,
    pub ratio: f64,
    pub job_id: u64,
    pub component_id: u64,
    pub timestamp: i64,
    pub job_start: Option<i64>,
    pub job_end: Option<i64>,
}

/// Reduce each group to its extreme sample
///
/// High keeps the group maximum, Low the group minimum. The first sample
/// reaching the extreme wins, preserving its component/job/timestamp.
/// Groups come back ordered by key.
pub fn reduce_groups(
    samples: &[UtilizationSample],
    key: GroupKey,
    direction: Direction,
) -> Vec<RankedRow> {
    let mut groups: BTreeMap<u64, UtilizationSample> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(key.of(sample))
            .and_modify(|best| {
                let better = match direction {
                    Direction::High => sample.ratio > best.ratio,
                    Direction::Low => sample.ratio < best.ratio,
                };
                if better {
                    *best = *sample;
                }
            })
            .or_insert(*sample);
    }

    groups
        .into_iter()
        .map(|(key, s)| RankedRow {
            key,
            ratio: s.ratio,
            job_id: s.job_id,
            component_id: s.component_id,
            timestamp: s.timestamp,
            job_start: None,
            job_end: None,
        })
        .collect()
}

/// Boundary value for a population of `values.len()` reduced values
///
/// `None` when the population does not exceed `count` (nothing is cut).
/// A zero count puts the boundary at the extreme, so nothing is kept.
pub fn boundary_value(values: &[f64], direction: Direction, count: usize) -> Option<f64> {
    let n = values.len();
    if n <= count {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    match direction {
        Direction::High => Some(sorted[n - count.max(1)]),
        Direction::Low => Some(sorted[count]),
    }
}

/// Keep rows strictly beyond the boundary order statistic
///
/// High keeps ratios `> sorted[N - count]`, Low keeps ratios
/// `< sorted[count]`. Ties at the boundary are dropped, so the result is not
/// a fixed-size top-K. Rows come back ascending by ratio.
pub fn boundary_filter(
    mut rows: Vec<RankedRow>,
    direction: Direction,
    count: usize,
) -> (Vec<RankedRow>, Option<f64>) {
    let ratios: Vec<f64> = rows.iter().map(|r| r.ratio).collect();
    let boundary = boundary_value(&ratios, direction, count);
    if let Some(limit) = boundary {
        rows.retain(|r| match direction {
            Direction::High => r.ratio > limit,
            Direction::Low => r.ratio < limit,
        });
    }
    rows.sort_by(|a, b| a.ratio.total_cmp(&b.ratio).then(a.key.cmp(&b.key)));
    (rows, boundary)
}

/// Attach observed job windows to job-keyed rows
pub fn attach_job_windows(rows: &mut [RankedRow], windows: &BTreeMap<u64, JobWindow>) {
    for row in rows.iter_mut() {
        if let Some(window) = windows.get(&row.job_id) {
            row.job_start = Some(window.start);
            row.job_end = window.end;
        }
    }
}

/// Outcome of a ranking request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    /// Name of the ratio column
    pub label: String,
    pub activity: Activity,
    pub direction: Direction,
    pub count: usize,
    /// Boundary order statistic; `None` when the population was not cut
    pub boundary: Option<f64>,
    pub mean: f64,
    pub std_dev: f64,
    pub rows: Vec<RankedRow>,
}

impl RankingResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ratios(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.ratio).collect()
    }

    /// Column layout handed to the dashboard
    pub fn to_table(&self) -> Table {
        let table = Table::new()
            .with_column(self.label.as_str(), self.rows.iter().map(|r| r.ratio))
            .with_column("job_id", self.rows.iter().map(|r| r.job_id))
            .with_column("component_id", self.rows.iter().map(|r| r.component_id))
            .with_column("timestamp", self.rows.iter().map(|r| r.timestamp));
        match self.activity {
            Activity::Active => table
                .with_column("job_start", self.rows.iter().map(|r| r.job_start))
                .with_column("job_end", self.rows.iter().map(|r| r.job_end)),
            Activity::Idle => table,
        }
    }
}
