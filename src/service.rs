//! The dashboard entrypoint: resolve the tenant, fetch its rows, aggregate them

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::info;

use crate::analytics::{self, DashboardAggregate};
use crate::dates::{self, RangeSpec};
use crate::error::DashboardResult;
use crate::warehouse::row::EventRecord;
use crate::warehouse::{RowSource, WarehouseTable};

/// Maps a caller identity to the warehouse table holding its tenant's interactions
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Fails with `DashboardError::Configuration` when the tenant has no usable table
    async fn warehouse_table_for(&self, user: &str) -> DashboardResult<WarehouseTable>;
}

#[derive(Clone)]
pub struct DashboardService {
    projects: Arc<dyn ProjectDirectory>,
    rows: Arc<dyn RowSource>,
    offset: FixedOffset,
}

impl DashboardService {
    pub fn new(
        projects: Arc<dyn ProjectDirectory>,
        rows: Arc<dyn RowSource>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            projects,
            rows,
            offset,
        }
    }

    /// Build the dashboard for `user` over `range`. All-or-nothing: any failure
    /// fails the whole request.
    pub async fn get_table_data(
        &self,
        user: &str,
        range: &RangeSpec,
    ) -> DashboardResult<DashboardAggregate> {
        self.get_table_data_at(user, range, Utc::now()).await
    }

    pub async fn get_table_data_at(
        &self,
        user: &str,
        range: &RangeSpec,
        now: DateTime<Utc>,
    ) -> DashboardResult<DashboardAggregate> {
        let window = dates::resolve(range, now, self.offset)?;
        let table = self.projects.warehouse_table_for(user).await?;
        let raw = self.rows.fetch_rows(&table, &window).await?;

        let fetched = raw.len();
        let records: Vec<EventRecord> = raw
            .iter()
            .map(|row| EventRecord::decode(row.as_ref()))
            .collect();
        let records = analytics::within_window(records, &window);
        info!(
            "Aggregating {} of {} rows from {} for {} .. {}",
            records.len(),
            fetched,
            table,
            window.start.to_rfc3339(),
            window.end.to_rfc3339()
        );

        Ok(analytics::aggregate(&records, self.offset))
    }
}
