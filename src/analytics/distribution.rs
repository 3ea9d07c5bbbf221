//! Categorical breakdowns: buttons, interaction types, topics and countries

use serde::Serialize;
use std::collections::HashMap;

use super::{present, round2};
use crate::countries;
use crate::warehouse::row::{EventRecord, Navigation};

const TOP_BUTTONS: usize = 10;
const TOP_TOPICS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue<T> {
    pub name: String,
    pub value: T,
}

impl<T> NamedValue<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonCount {
    pub text: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub code: String,
    pub name: String,
    pub value: u64,
    /// Share of the busiest country, 0-100
    pub intensity: f64,
}

/// Count keys in first-seen order
struct Tally<'a> {
    index: HashMap<&'a str, usize>,
    counts: Vec<(&'a str, u64)>,
}

impl<'a> Tally<'a> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            counts: Vec::new(),
        }
    }

    fn add(&mut self, key: &'a str) {
        match self.index.get(key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key, self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Descending by count; ties keep first-seen order
    fn ranked(mut self) -> Vec<(&'a str, u64)> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
    }
}

/// Button labels, excluding blanks and the "0" placeholder
fn button_label(record: &EventRecord) -> Option<&str> {
    if record.navigation != Navigation::Button {
        return None;
    }
    present(&record.last_utterance).filter(|label| *label != "0")
}

pub fn most_clicked_buttons(records: &[EventRecord]) -> Vec<ButtonCount> {
    let mut tally = Tally::new();
    for label in records.iter().filter_map(button_label) {
        tally.add(label);
    }

    tally
        .ranked()
        .into_iter()
        .take(TOP_BUTTONS)
        .map(|(text, count)| ButtonCount {
            text: text.to_string(),
            count,
        })
        .collect()
}

/// Fixed four-row series: Button, Text, Button and Text, All
pub fn interaction_types(records: &[EventRecord]) -> Vec<NamedValue<u64>> {
    let mut buttons = 0u64;
    let mut texts = 0u64;
    let mut groups: HashMap<&str, (bool, bool)> = HashMap::new();

    for record in records {
        let (is_button, is_text) = match record.navigation {
            Navigation::Button => (true, false),
            Navigation::Text => (false, true),
            Navigation::Other => continue,
        };
        if is_button {
            buttons += 1;
        } else {
            texts += 1;
        }
        if let Some(group) = present(&record.turn_group) {
            let seen = groups.entry(group).or_insert((false, false));
            seen.0 |= is_button;
            seen.1 |= is_text;
        }
    }

    let mixed = groups.values().filter(|(button, text)| *button && *text).count() as u64;

    vec![
        NamedValue::new("Button", buttons),
        NamedValue::new("Text", texts),
        NamedValue::new("Button and Text", mixed),
        NamedValue::new("All", buttons + texts),
    ]
}

/// Share of each statement category, top ten, as percentages of categorized rows
pub fn conversation_topics(records: &[EventRecord]) -> Vec<NamedValue<f64>> {
    let mut tally = Tally::new();
    for category in records.iter().filter_map(|r| present(&r.category)).filter(|c| *c != "0") {
        tally.add(category);
    }

    let total = tally.total();
    if total == 0 {
        return vec![NamedValue::new("No data", 100.0)];
    }

    tally
        .ranked()
        .into_iter()
        .take(TOP_TOPICS)
        .map(|(name, count)| NamedValue::new(name, round2(count as f64 / total as f64 * 100.0)))
        .collect()
}

/// Rows per country, keyed by ISO code; unmapped country text is dropped
pub fn locations(records: &[EventRecord]) -> Vec<LocationCount> {
    let mut tally = Tally::new();
    let codes = records
        .iter()
        .filter_map(|r| present(&r.country))
        .filter_map(countries::normalize);
    for code in codes {
        tally.add(code);
    }

    let ranked = tally.ranked();
    let max = ranked.first().map(|(_, count)| *count).unwrap_or(0);

    ranked
        .into_iter()
        .map(|(code, value)| LocationCount {
            code: code.to_string(),
            name: countries::display_name(code).unwrap_or(code).to_string(),
            value,
            intensity: if max == 0 { 0.0 } else { round2(value as f64 / max as f64 * 100.0) },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::{records, Row};

    fn button(label: &'static str) -> Row {
        Row {
            navigation: Some("Button"),
            utterance: Some(label),
            ..Row::default()
        }
    }

    #[test]
    fn buttons_rank_by_count_then_first_seen() {
        let rows = records(&[
            button("Shipping"),
            button("Pricing"),
            button("Pricing"),
            button("Returns"),
            button("Shipping"),
            button("0"),
            button(""),
            Row {
                navigation: Some("Text"),
                utterance: Some("Pricing"),
                ..Row::default()
            },
        ]);
        let ranked = most_clicked_buttons(&rows);

        let labels: Vec<_> = ranked.iter().map(|b| (b.text.as_str(), b.count)).collect();
        assert_eq!(labels, vec![("Shipping", 2), ("Pricing", 2), ("Returns", 1)]);
    }

    #[test]
    fn buttons_are_capped_at_ten() {
        const LABELS: [&str; 12] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
        let rows = records(&LABELS.map(button));
        let ranked = most_clicked_buttons(&rows);

        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].text, "a");
        assert_eq!(ranked[9].text, "j");
    }

    #[test]
    fn interaction_types_always_have_four_rows() {
        let series = interaction_types(&[]);
        let names: Vec<_> = series.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Button", "Text", "Button and Text", "All"]);
        assert!(series.iter().all(|v| v.value == 0));
    }

    #[test]
    fn mixed_groups_need_both_kinds() {
        let rows = records(&[
            Row {
                group: Some("g1"),
                navigation: Some("Button"),
                ..Row::default()
            },
            Row {
                group: Some("g1"),
                navigation: Some("Text"),
                ..Row::default()
            },
            Row {
                group: Some("g2"),
                navigation: Some("Text"),
                ..Row::default()
            },
            Row {
                group: Some("g2"),
                navigation: Some("Text"),
                ..Row::default()
            },
            Row {
                group: Some("g3"),
                navigation: Some("Button"),
                ..Row::default()
            },
            Row {
                group: Some("g3"),
                navigation: Some("Other"),
                ..Row::default()
            },
            Row {
                navigation: Some("Button"),
                ..Row::default()
            },
        ]);
        let series = interaction_types(&rows);

        assert_eq!(series[0], NamedValue::new("Button", 3));
        assert_eq!(series[1], NamedValue::new("Text", 3));
        assert_eq!(series[2], NamedValue::new("Button and Text", 1));
        assert_eq!(series[3], NamedValue::new("All", 6));
    }

    #[test]
    fn topics_are_shares_of_categorized_rows() {
        let rows = records(&[
            Row {
                category: Some("Support"),
                ..Row::default()
            },
            Row {
                category: Some("0"),
                ..Row::default()
            },
        ]);
        assert_eq!(conversation_topics(&rows), vec![NamedValue::new("Support", 100.0)]);

        let rows = records(&[
            Row {
                category: Some("Billing"),
                ..Row::default()
            },
            Row {
                category: Some("Support"),
                ..Row::default()
            },
            Row {
                category: Some("Support"),
                ..Row::default()
            },
            Row {
                category: None,
                ..Row::default()
            },
        ]);
        let topics = conversation_topics(&rows);
        assert_eq!(
            topics,
            vec![
                NamedValue::new("Support", 66.67),
                NamedValue::new("Billing", 33.33)
            ]
        );
        let sum: f64 = topics.iter().map(|t| t.value).sum();
        assert!((sum - 100.0).abs() < 0.05);
    }

    #[test]
    fn topics_fall_back_to_no_data() {
        let rows = records(&[
            Row {
                category: Some("0"),
                ..Row::default()
            },
            Row::default(),
        ]);
        assert_eq!(conversation_topics(&rows), vec![NamedValue::new("No data", 100.0)]);
    }

    #[test]
    fn locations_merge_aliases_and_drop_unknowns() {
        let rows = records(&[
            Row {
                country: Some("Czechia"),
                ..Row::default()
            },
            Row {
                country: Some("Czech Republic"),
                ..Row::default()
            },
            Row {
                country: Some("France"),
                ..Row::default()
            },
            Row {
                country: Some("undefined"),
                ..Row::default()
            },
            Row {
                country: Some("0"),
                ..Row::default()
            },
            Row {
                country: Some("Narnia"),
                ..Row::default()
            },
            Row::default(),
        ]);
        let locations = locations(&rows);

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].code, "CZ");
        assert_eq!(locations[0].name, "Czechia");
        assert_eq!(locations[0].value, 2);
        assert_eq!(locations[0].intensity, 100.0);
        assert_eq!(locations[1].code, "FR");
        assert_eq!(locations[1].intensity, 50.0);
        let known = |code: &str| countries::COUNTRIES.iter().any(|(_, c)| *c == code);
        assert!(locations.iter().all(|l| known(&l.code)));
    }
}
