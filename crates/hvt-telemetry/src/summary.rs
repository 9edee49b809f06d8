//! Run summary output.
//!
//! Logs the outcome of one collection run: the row that was (or would have
//! been) written and which metrics were unavailable. A row of zeros is only
//! distinguishable from a quiet market through this summary.

use chrono::NaiveDate;
use hvt_core::Metric;
use tracing::{info, warn};

/// Availability of one collected figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSummary {
    pub name: String,
    pub metric: Metric,
}

impl MetricSummary {
    pub fn new(name: impl Into<String>, metric: Metric) -> Self {
        Self {
            name: name.into(),
            metric,
        }
    }
}

/// Summary of one collection run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub outcome: String,
    pub metrics: Vec<MetricSummary>,
    pub persisted: bool,
}

impl RunSummary {
    pub fn new(date: NaiveDate, outcome: impl Into<String>, persisted: bool) -> Self {
        Self {
            date,
            outcome: outcome.into(),
            metrics: Vec::new(),
            persisted,
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, metric: Metric) -> Self {
        self.metrics.push(MetricSummary::new(name, metric));
        self
    }

    pub fn unavailable_count(&self) -> usize {
        self.metrics
            .iter()
            .filter(|m| !m.metric.is_available())
            .count()
    }

    /// Emit the summary.
    pub fn log(&self) {
        for m in &self.metrics {
            match &m.metric {
                Metric::Available(value) => {
                    info!(date = %self.date, metric = %m.name, %value, "Metric collected");
                }
                Metric::Unavailable(reason) => {
                    warn!(date = %self.date, metric = %m.name, %reason, "Metric unavailable");
                }
            }
        }

        info!(
            date = %self.date,
            outcome = %self.outcome,
            persisted = self.persisted,
            metrics = self.metrics.len(),
            unavailable = self.unavailable_count(),
            "Collection run finished"
        );
    }
}
