//! Dashboard aggregation
//!
//! Folds decoded interaction rows into the aggregates the dashboard renders. Every
//! sub-aggregate is computed independently from the same slice; a row missing the
//! field one aggregate needs is skipped there and still counts everywhere else.

mod conversion;
mod distribution;
mod metrics;
mod timeline;

use chrono::FixedOffset;
use serde::Serialize;
use tracing::debug;

use crate::countries;
use crate::dates::DateWindow;
use crate::warehouse::row::{EventRecord, Navigation};

pub use conversion::Conversion;
pub use distribution::{ButtonCount, LocationCount, NamedValue};
pub use metrics::Metrics;
pub use timeline::HourBucket;

/// The stable JSON contract consumed by the dashboard frontend.
///
/// Every family is always present: empty inputs produce zeroed metrics, empty lists,
/// the four interaction-type rows, the "No data" topic and 24 hour buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAggregate {
    pub metrics: Metrics,
    pub conversion: Conversion,
    pub most_clicked_buttons: Vec<ButtonCount>,
    pub interaction_type_data: Vec<NamedValue<u64>>,
    pub conversation_topics: Vec<NamedValue<f64>>,
    pub locations: Vec<LocationCount>,
    pub time_distribution: Vec<HourBucket>,
}

/// Compute every dashboard aggregate over `records`.
///
/// `offset` decides which local hour a timestamp falls into.
pub fn aggregate(records: &[EventRecord], offset: FixedOffset) -> DashboardAggregate {
    log_exclusions(records);

    DashboardAggregate {
        metrics: metrics::compute(records),
        conversion: conversion::compute(records),
        most_clicked_buttons: distribution::most_clicked_buttons(records),
        interaction_type_data: distribution::interaction_types(records),
        conversation_topics: distribution::conversation_topics(records),
        locations: distribution::locations(records),
        time_distribution: timeline::hourly(records, offset),
    }
}

/// Keep the rows that belong to `window`.
///
/// Rows without a usable timestamp are kept: they still count toward the count-based
/// aggregates and only drop out of the hourly histogram.
pub fn within_window(records: Vec<EventRecord>, window: &DateWindow) -> Vec<EventRecord> {
    records
        .into_iter()
        .filter(|record| record.occurred_at().map_or(true, |ts| window.contains(ts)))
        .collect()
}

/// A trimmed, non-empty field value
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Round to two decimals, the precision every percentage is reported at
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-aggregate counts of rows skipped for a missing or unusable field
fn log_exclusions(records: &[EventRecord]) {
    let mut no_timestamp = 0usize;
    let mut no_category = 0usize;
    let mut no_country = 0usize;
    let mut no_user = 0usize;
    let mut no_button_label = 0usize;

    for record in records {
        if record.occurred_at().is_none() {
            no_timestamp += 1;
        }
        if present(&record.category).map_or(true, |c| c == "0") {
            no_category += 1;
        }
        if present(&record.country).and_then(countries::normalize).is_none() {
            no_country += 1;
        }
        if present(&record.source_address).is_none() {
            no_user += 1;
        }
        let labelled = present(&record.last_utterance).is_some_and(|l| l != "0");
        if record.navigation == Navigation::Button && !labelled {
            no_button_label += 1;
        }
    }

    debug!(
        rows = records.len(),
        no_timestamp,
        no_category,
        no_country,
        no_user,
        no_button_label,
        "Rows excluded per aggregate"
    );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::warehouse::row::RawEventRow;
    use chrono::{TimeZone, Utc};

    /// Builder for rows in the warehouse's positional layout
    #[derive(Default, Clone)]
    pub(crate) struct Row {
        pub conversation: Option<&'static str>,
        pub group: Option<&'static str>,
        pub timestamp: Option<&'static str>,
        pub category: Option<&'static str>,
        pub utterance: Option<&'static str>,
        pub navigation: Option<&'static str>,
        pub country: Option<&'static str>,
        pub user: Option<&'static str>,
        pub customer: Option<&'static str>,
        pub amount: Option<&'static str>,
    }

    impl Row {
        pub(crate) fn raw(&self) -> RawEventRow {
            let mut cells: Vec<Option<&str>> = vec![None; 13];
            cells[0] = self.conversation;
            cells[1] = self.group;
            cells[2] = self.timestamp;
            cells[3] = self.category;
            cells[4] = self.utterance;
            cells[5] = self.navigation;
            cells[6] = self.country;
            cells[7] = self.user;
            cells[9] = self.customer;
            cells[12] = self.amount;
            RawEventRow::from_values(cells)
        }

        pub(crate) fn record(&self) -> EventRecord {
            EventRecord::decode(Some(&self.raw()))
        }
    }

    pub(crate) fn records(rows: &[Row]) -> Vec<EventRecord> {
        rows.iter().map(Row::record).collect()
    }

    pub(crate) fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn mixed_rows() -> Vec<Row> {
        vec![
            Row {
                conversation: Some("c1"),
                group: Some("g1"),
                timestamp: Some("2024-05-01T09:15:00Z"),
                category: Some("Billing"),
                utterance: Some("Pricing"),
                navigation: Some("Button"),
                country: Some("USA"),
                user: Some("1.1.1.1"),
                ..Row::default()
            },
            Row {
                conversation: Some("c1"),
                group: Some("g1"),
                timestamp: Some("2024-05-01T09:45:00Z"),
                category: Some("Support"),
                utterance: Some("my order is late"),
                navigation: Some("Text"),
                country: Some("United States"),
                user: Some("1.1.1.1"),
                ..Row::default()
            },
            Row {
                conversation: Some("c2"),
                group: Some("g2"),
                timestamp: Some("0"),
                category: Some("0"),
                utterance: Some("Pricing"),
                navigation: Some("Button"),
                country: Some("undefined"),
                user: Some("2.2.2.2"),
                customer: Some("1.1.1.1"),
                amount: Some("$1,234.56"),
            },
            Row {
                conversation: Some("c3"),
                navigation: Some("Start"),
                ..Row::default()
            },
        ]
    }

    #[test]
    fn empty_input_still_has_every_family() {
        let result = aggregate(&[], utc());

        assert_eq!(result.metrics.interactions, 0);
        assert_eq!(result.metrics.avg_messages_per_user, "0.00");
        assert_eq!(result.conversion.percentage, 0.0);
        assert!(result.most_clicked_buttons.is_empty());
        assert_eq!(result.interaction_type_data.len(), 4);
        assert_eq!(result.conversation_topics, vec![NamedValue::new("No data", 100.0)]);
        assert!(result.locations.is_empty());
        assert_eq!(result.time_distribution.len(), 24);

        let json = serde_json::to_value(&result).unwrap();
        for key in [
            "metrics",
            "conversion",
            "mostClickedButtons",
            "interactionTypeData",
            "conversationTopics",
            "locations",
            "timeDistribution",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn aggregates_a_mixed_row_set() {
        let result = aggregate(&records(&mixed_rows()), utc());

        assert_eq!(result.metrics.interactions, 3);
        assert_eq!(result.metrics.unique_users, 2);
        assert_eq!(result.metrics.questions, 3);
        assert_eq!(
            result.metrics.button_clicks + result.metrics.text_questions,
            result.metrics.questions
        );

        // both c1 rows pair with the one counterpart row carrying the amount
        assert_eq!(result.conversion.matched, 1);
        assert_eq!(result.conversion.total_amount_minor, 246_912);
        assert_eq!(result.conversion.total_amount, "2,469.12");

        assert_eq!(
            result.most_clicked_buttons,
            vec![ButtonCount {
                text: "Pricing".to_string(),
                count: 2,
            }]
        );

        assert_eq!(result.locations.len(), 1);
        assert_eq!(result.locations[0].code, "US");
        assert_eq!(result.locations[0].value, 2);

        let total: u64 = result.time_distribution.iter().map(|b| b.value).sum();
        assert_eq!(total, 2);
        assert_eq!(result.time_distribution[9].value, 2);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let rows = records(&mixed_rows());
        let first = serde_json::to_string(&aggregate(&rows, utc())).unwrap();
        let second = serde_json::to_string(&aggregate(&rows, utc())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn window_keeps_rows_without_timestamps() {
        let window = DateWindow {
            start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        };
        let kept = within_window(records(&mixed_rows()), &window);

        // the 09:45 row falls outside; the "0" and missing timestamps stay
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.timestamp.as_deref() != Some("2024-05-01T09:45:00Z")));
    }
}
