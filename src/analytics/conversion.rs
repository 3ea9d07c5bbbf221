//! Conversion matching
//!
//! A chat user "converted" when their source address also shows up as a customer
//! address. Amounts ride on the customer rows and are summed over every
//! (source row, customer row) pair sharing an address, the way a SQL self-join would.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::{present, round2};
use crate::warehouse::row::EventRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// Source addresses that also appear as customer addresses
    pub matched: usize,
    /// Distinct source addresses
    pub total_users: usize,
    /// `matched / total_users * 100`, two decimals, 0 without users
    pub percentage: f64,
    /// Matched amount in minor units (cents)
    #[serde(rename = "total_amount_minor")]
    pub total_amount_minor: i64,
    /// Matched amount formatted for display, e.g. "1,234.56"
    #[serde(rename = "total_amount")]
    pub total_amount: String,
}

/// Addresses compare trimmed and case-insensitively
fn identity(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_lowercase)
}

pub fn compute(records: &[EventRecord]) -> Conversion {
    let mut source_rows: HashMap<String, i64> = HashMap::new();
    let mut customers: HashSet<String> = HashSet::new();

    for record in records {
        if let Some(user) = identity(&record.source_address) {
            *source_rows.entry(user).or_insert(0) += 1;
        }
        if let Some(customer) = identity(&record.counterpart_address) {
            customers.insert(customer);
        }
    }

    let matched = source_rows
        .keys()
        .filter(|user| customers.contains(*user))
        .count();
    let total_users = source_rows.len();
    let percentage = if total_users == 0 {
        0.0
    } else {
        round2(matched as f64 / total_users as f64 * 100.0)
    };

    let total_amount_minor = records
        .iter()
        .filter_map(|record| {
            let customer = identity(&record.counterpart_address)?;
            let pairs = *source_rows.get(&customer)?;
            let amount = record.amount.as_deref().and_then(parse_minor_units)?;
            Some(amount.saturating_mul(pairs))
        })
        .fold(0i64, i64::saturating_add);

    Conversion {
        matched,
        total_users,
        percentage,
        total_amount_minor,
        total_amount: format_minor_units(total_amount_minor),
    }
}

/// Parse a currency string such as `"$1,234.56"` into minor units
pub fn parse_minor_units(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

/// Render minor units as a grouped two-decimal string: `123456` -> `"1,234.56"`
pub fn format_minor_units(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let whole = (abs / 100).to_string();
    let cents = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}.{cents:02}")
}
