//! Warehouse access: row fetching, row decoding and token management

pub mod row;
pub mod token;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::WarehouseConfig;
use crate::dates::DateWindow;
use crate::error::{DashboardError, DashboardResult};
use row::RawEventRow;
use token::TokenCache;

/// Fully qualified location of a tenant's interaction table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTable {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl std::fmt::Display for WarehouseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// Source of raw interaction rows for a table and window
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(
        &self,
        table: &WarehouseTable,
        window: &DateWindow,
    ) -> DashboardResult<Vec<Option<RawEventRow>>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableDataPage {
    #[serde(default)]
    rows: Vec<Option<RawEventRow>>,
    page_token: Option<String>,
    total_rows: Option<String>,
}

/// REST client for the warehouse table-data endpoint
pub struct WarehouseClient {
    client: reqwest::Client,
    api_base_url: String,
    page_size: u32,
    tokens: Arc<TokenCache>,
}

impl WarehouseClient {
    pub fn new(client: reqwest::Client, config: &WarehouseConfig, tokens: Arc<TokenCache>) -> Self {
        Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            tokens,
        }
    }

    fn table_data_url(&self, table: &WarehouseTable) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables/{}/data",
            self.api_base_url, table.project_id, table.dataset_id, table.table_id
        )
    }

    async fn fetch_page(
        &self,
        url: &str,
        page_token: Option<&str>,
    ) -> DashboardResult<TableDataPage> {
        let token = self.tokens.get_token().await?;

        let mut query: Vec<(&str, String)> = vec![("maxResults", self.page_size.to_string())];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token.to_string()));
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                // The issuer may have revoked the token early; next request refreshes
                self.tokens.invalidate().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::upstream(Some(status.as_u16()), body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Unparseable warehouse page from {}: {}", url, e);
            DashboardError::upstream(Some(status.as_u16()), format!("invalid table data: {e}"))
        })
    }
}

#[async_trait]
impl RowSource for WarehouseClient {
    /// Page through the whole table. The table-data endpoint cannot filter, so the
    /// window is applied by the caller after decoding.
    async fn fetch_rows(
        &self,
        table: &WarehouseTable,
        window: &DateWindow,
    ) -> DashboardResult<Vec<Option<RawEventRow>>> {
        let url = self.table_data_url(table);
        debug!(
            "Fetching {} for {} .. {}",
            table,
            window.start.to_rfc3339(),
            window.end.to_rfc3339()
        );

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens: HashSet<String> = HashSet::new();
        let mut max_pages: Option<u64> = None;
        let mut pages = 0u64;
        loop {
            let page = self.fetch_page(&url, page_token.as_deref()).await?;
            pages += 1;
            if pages == 1 {
                let total = page
                    .total_rows
                    .as_deref()
                    .and_then(|t| t.parse::<u64>().ok());
                if let Some(total) = total {
                    debug!("{} reports {} rows", table, total);
                    // One spare page for rows appended while paging
                    max_pages = Some(total / u64::from(self.page_size.max(1)) + 2);
                }
            }
            rows.extend(page.rows);

            let Some(next) = page.page_token.filter(|t| !t.is_empty()) else {
                break;
            };
            if !seen_tokens.insert(next.clone()) {
                warn!("{} repeated page token after {} page(s)", table, pages);
                return Err(DashboardError::upstream(None, "page token repeated"));
            }
            if max_pages.is_some_and(|max| pages >= max) {
                warn!("{} still paging after {} page(s)", table, pages);
                return Err(DashboardError::upstream(
                    None,
                    format!("more than {pages} pages for the reported row count"),
                ));
            }
            page_token = Some(next);
        }

        info!("Fetched {} rows from {} in {} page(s)", rows.len(), table, pages);
        Ok(rows)
    }
}
