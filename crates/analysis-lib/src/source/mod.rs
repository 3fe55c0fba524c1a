//! Telemetry source contract
//!
//! The storage/query engine is external to this crate. The pipelines only
//! need a narrow predicate-select over named tables, returning
//! column-oriented frames. `MemorySource` implements the contract in process
//! for tests, the CLI, and file-backed deployments.

mod frame;
mod memory;

pub use frame::Frame;
pub use memory::{MemorySource, TelemetryDump};

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use async_trait::async_trait;

/// Comparison operator of a query condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
    pub fn matches(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Eq => lhs == rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
        }
    }
}

/// `field <op> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: Comparator,
    pub value: f64,
}

/// Predicate select over one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub table: String,
    pub columns: Vec<String>,
    /// All conditions must hold
    pub conditions: Vec<Condition>,
    /// Ascending sort keys, most significant first
    pub order_by: Vec<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn select<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, op: Comparator, value: f64) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn order_by<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        self.order_by = keys.iter().map(|k| k.as_ref().to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Trait for telemetry query backends
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Run a predicate select and return the matching rows column by column
    async fn select(&self, query: &Query) -> Result<Frame>;
}
