//! Daily collection run.
//!
//! Calls are strictly sequential:
//! 1. reference price (BTC/USD), reused for every volume conversion
//! 2. target mark price
//! 3. target venue volume (BTC units)
//! 4. exchange listing, read once for all three comparators
//!
//! Each figure is a `Metric`. A failure only makes that figure unavailable;
//! a missing reference price makes every volume unavailable.

use crate::config::{AppConfig, ComparatorConfig, ExistingRowPolicy};
use crate::error::AppResult;
use chrono::{Local, NaiveDate};
use hvt_core::{
    round_volume, to_billions, ComparatorSlot, DailyRow, FailurePolicy, Metric, COMPARATOR_COUNT,
};
use hvt_fetch::{MarketDataClient, ReqwestTransport, Sleeper, ThreadSleeper, Transport};
use hvt_persistence::{DailyTable, MergeOutcome, TableSchema};
use hvt_telemetry::RunSummary;
use std::path::PathBuf;
use tracing::{info, warn};

/// Every figure gathered by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedMetrics {
    pub reference_price: Metric,
    pub target_price: Metric,
    pub target_volume_b: Metric,
    pub comparator_volumes_b: [Metric; COMPARATOR_COUNT],
}

impl CollectedMetrics {
    /// Render the stored row for `date` under `policy`.
    ///
    /// Volumes keep the stored precision even when substituted with zero.
    pub fn to_row(
        &self,
        date: NaiveDate,
        policy: FailurePolicy,
        comparators: &[ComparatorConfig; COMPARATOR_COUNT],
    ) -> AppResult<DailyRow> {
        let mut comparator_volumes_b = [rust_decimal::Decimal::ZERO; COMPARATOR_COUNT];
        for slot in ComparatorSlot::ALL {
            let i = slot.index();
            comparator_volumes_b[i] =
                round_volume(self.comparator_volumes_b[i].resolve(policy, &comparators[i].label)?);
        }

        Ok(DailyRow {
            date,
            target_volume_b: round_volume(self.target_volume_b.resolve(policy, "target_volume")?),
            target_price: self.target_price.resolve(policy, "target_price")?,
            comparator_volumes_b,
        })
    }
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub date: NaiveDate,
    /// Row merged into the table; `None` when the date was skipped.
    pub row: Option<DailyRow>,
    pub metrics: Option<CollectedMetrics>,
    pub outcome: MergeOutcome,
    pub persisted: bool,
}

/// Fetches today's figures and merges them into the table.
pub struct Collector<T = ReqwestTransport, S = ThreadSleeper> {
    client: MarketDataClient<T, S>,
    comparators: [ComparatorConfig; COMPARATOR_COUNT],
    schema: TableSchema,
    output_path: PathBuf,
    failure_policy: FailurePolicy,
    existing_row: ExistingRowPolicy,
    dry_run: bool,
}

impl Collector {
    /// Build a collector with a real HTTP client.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let client = MarketDataClient::new(
            config.endpoints(),
            config.retry_policy(),
            config.retry.request_timeout(),
        )?;
        Self::with_client(config, client)
    }
}

impl<T: Transport, S: Sleeper> Collector<T, S> {
    /// Build a collector around an existing client.
    pub fn with_client(config: &AppConfig, client: MarketDataClient<T, S>) -> AppResult<Self> {
        Ok(Self {
            client,
            comparators: config.comparator_slots()?,
            schema: config.table_schema()?,
            output_path: PathBuf::from(&config.output_path),
            failure_policy: config.failure_policy,
            existing_row: config.existing_row,
            dry_run: config.dry_run,
        })
    }

    /// Run for today's local calendar date.
    pub fn run_today(&self) -> AppResult<CollectionReport> {
        self.run(Local::now().date_naive())
    }

    /// Load the table, collect, merge the row for `date`, persist.
    pub fn run(&self, date: NaiveDate) -> AppResult<CollectionReport> {
        let mut table = DailyTable::load(&self.output_path, self.schema.clone())?;

        if self.existing_row == ExistingRowPolicy::Skip && table.contains(date) {
            info!(%date, "Row already recorded, skipping collection");
            RunSummary::new(date, MergeOutcome::Skipped.to_string(), false).log();
            return Ok(CollectionReport {
                date,
                row: None,
                metrics: None,
                outcome: MergeOutcome::Skipped,
                persisted: false,
            });
        }

        let metrics = self.collect();
        let row = metrics.to_row(date, self.failure_policy, &self.comparators)?;

        let outcome = match self.existing_row {
            ExistingRowPolicy::Replace => table.upsert(row.clone()),
            ExistingRowPolicy::Skip => table.insert_if_absent(row.clone()),
        };

        let persisted = if self.dry_run {
            info!(fields = ?row.to_fields(), "Dry run, table not written");
            false
        } else {
            table.persist()?;
            true
        };

        self.summary(date, outcome, persisted, &metrics).log();

        Ok(CollectionReport {
            date,
            row: Some(row),
            metrics: Some(metrics),
            outcome,
            persisted,
        })
    }

    /// Fetch every figure. Never fails; failures become unavailable metrics.
    pub fn collect(&self) -> CollectedMetrics {
        let reference_price = Metric::from(self.client.reference_price());

        let target_price = Metric::from(self.client.target_mark_price());
        if let Metric::Unavailable(reason) = &target_price {
            warn!(%reason, "Target price unavailable");
        }

        let reference = match &reference_price {
            Metric::Available(price) => *price,
            Metric::Unavailable(reason) => {
                warn!(%reason, "Reference price unavailable, volumes cannot be converted");
                let reason = format!("reference price unavailable: {reason}");
                return CollectedMetrics {
                    target_volume_b: Metric::Unavailable(reason.clone()),
                    comparator_volumes_b: std::array::from_fn(|_| {
                        Metric::Unavailable(reason.clone())
                    }),
                    reference_price,
                    target_price,
                };
            }
        };

        let target_volume_b = Metric::from(self.client.target_volume_ref())
            .and_then(|volume| to_billions(volume, reference));
        if let Metric::Unavailable(reason) = &target_volume_b {
            warn!(%reason, "Target volume unavailable");
        }

        let listing = self.client.exchange_listing();
        if let Err(e) = &listing {
            warn!(error = %e, "Exchange listing unavailable, all comparators affected");
        }

        let comparator_volumes_b = std::array::from_fn(|i| {
            let comparator = &self.comparators[i];
            let volume = match &listing {
                Ok(listing) => Metric::from(listing.volume_ref(&comparator.id))
                    .and_then(|volume| to_billions(volume, reference)),
                Err(e) => Metric::unavailable(format!("exchange listing: {e}")),
            };
            if let Metric::Unavailable(reason) = &volume {
                warn!(exchange = %comparator.id, %reason, "Comparator volume unavailable");
            }
            volume
        });

        CollectedMetrics {
            reference_price,
            target_price,
            target_volume_b,
            comparator_volumes_b,
        }
    }

    fn summary(
        &self,
        date: NaiveDate,
        outcome: MergeOutcome,
        persisted: bool,
        metrics: &CollectedMetrics,
    ) -> RunSummary {
        let mut summary = RunSummary::new(date, outcome.to_string(), persisted)
            .with_metric("reference_price", metrics.reference_price.clone())
            .with_metric("target_price", metrics.target_price.clone())
            .with_metric("target_volume_b", metrics.target_volume_b.clone());
        for (comparator, metric) in self.comparators.iter().zip(&metrics.comparator_volumes_b) {
            summary = summary.with_metric(comparator.label.clone(), metric.clone());
        }
        summary
    }
}
