//! Headline counts

use serde::Serialize;
use std::collections::HashSet;

use super::present;
use crate::warehouse::row::{EventRecord, Navigation};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Distinct conversation ids
    pub interactions: usize,
    /// Distinct source addresses
    pub unique_users: usize,
    pub text_questions: usize,
    pub button_clicks: usize,
    /// Text and button turns together
    pub questions: usize,
    /// `questions / unique_users` to two decimals, "0.00" without users
    pub avg_messages_per_user: String,
}

pub fn compute(records: &[EventRecord]) -> Metrics {
    let mut conversations = HashSet::new();
    let mut users = HashSet::new();
    let mut text_questions = 0;
    let mut button_clicks = 0;

    for record in records {
        if let Some(id) = present(&record.conversation_id) {
            conversations.insert(id);
        }
        if let Some(user) = present(&record.source_address) {
            users.insert(user);
        }
        match record.navigation {
            Navigation::Text => text_questions += 1,
            Navigation::Button => button_clicks += 1,
            Navigation::Other => {}
        }
    }

    let questions = text_questions + button_clicks;
    let unique_users = users.len();
    let avg_messages_per_user = if unique_users == 0 {
        "0.00".to_string()
    } else {
        format!("{:.2}", questions as f64 / unique_users as f64)
    };

    Metrics {
        interactions: conversations.len(),
        unique_users,
        text_questions,
        button_clicks,
        questions,
        avg_messages_per_user,
    }
}
