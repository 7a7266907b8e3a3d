use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::store::filter::parse_timestamp;

/// Fields of an expense document the dashboard reads.
#[derive(Debug, Default, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub date: Value,
}

impl Expense {
    /// Amount as a number; numeric strings count, anything else is zero.
    pub fn amount(&self) -> f64 {
        match &self.amount {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }
}
