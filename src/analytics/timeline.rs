//! Hour-of-day histogram

use chrono::{FixedOffset, Timelike};
use serde::Serialize;

use crate::warehouse::row::EventRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    /// "HH:00"
    pub time: String,
    pub value: u64,
}

/// Events per local hour. Always 24 buckets; rows without a usable timestamp are skipped.
pub fn hourly(records: &[EventRecord], offset: FixedOffset) -> Vec<HourBucket> {
    let mut counts = [0u64; 24];
    for ts in records.iter().filter_map(EventRecord::occurred_at) {
        counts[ts.with_timezone(&offset).hour() as usize] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(hour, &value)| HourBucket {
            time: format!("{hour:02}:00"),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::{records, utc, Row};

    #[test]
    fn always_24_buckets() {
        let rows = records(&[
            Row::default(),
            Row {
                timestamp: Some("0"),
                ..Row::default()
            },
        ]);
        let buckets = hourly(&rows, utc());

        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[0].time, "00:00");
        assert_eq!(buckets[23].time, "23:00");
        assert!(buckets.iter().all(|b| b.value == 0));
    }

    #[test]
    fn counts_only_valid_timestamps() {
        let rows = records(&[
            Row {
                timestamp: Some("2024-05-01T00:10:00Z"),
                ..Row::default()
            },
            Row {
                timestamp: Some("2024-05-01T13:59:59Z"),
                ..Row::default()
            },
            Row {
                timestamp: Some("2024-05-02T13:00:00Z"),
                ..Row::default()
            },
            Row {
                timestamp: Some("not a time"),
                ..Row::default()
            },
        ]);
        let buckets = hourly(&rows, utc());

        assert_eq!(buckets[0].value, 1);
        assert_eq!(buckets[13].value, 2);
        assert_eq!(buckets.iter().map(|b| b.value).sum::<u64>(), 3);
    }

    #[test]
    fn buckets_use_the_local_offset() {
        let rows = records(&[Row {
            timestamp: Some("2024-05-01T23:30:00Z"),
            ..Row::default()
        }]);
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let buckets = hourly(&rows, tokyo);

        assert_eq!(buckets[8].value, 1);
    }
}
