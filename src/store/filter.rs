use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::cmp::Ordering;

use super::Document;

/// One predicate over a top-level document field.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Query-string equality: the stored value rendered as text equals `value`.
    Equals { field: String, value: String },
    /// Case-insensitive literal substring match on a string field.
    Contains { field: String, needle: String },
    /// Timestamp field inside an inclusive range; an open side is unbounded.
    Between {
        field: String,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. }
            | Condition::Contains { field, .. }
            | Condition::Between { field, .. } => field,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let Some(stored) = doc.get(self.field()) else {
            return false;
        };

        match self {
            Condition::Equals { value, .. } => loosely_equals(stored, value),
            Condition::Contains { needle, .. } => stored
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Condition::Between { from, to, .. } => match parse_timestamp(stored) {
                Some(at) => from.is_none_or(|f| at >= f) && to.is_none_or(|t| at <= t),
                None => false,
            },
        }
    }
}

/// Conjunction of conditions; the empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().and(Condition::Equals {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Drops every condition on `field`.
    pub fn remove_field(&mut self, field: &str) {
        self.conditions.retain(|c| c.field() != field);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// Renders the filter in the document-query notation clients echo back.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for condition in &self.conditions {
            let rendered = match condition {
                Condition::Equals { value, .. } => Value::String(value.clone()),
                Condition::Contains { needle, .. } => json!({ "$regex": needle, "$options": "i" }),
                Condition::Between { from, to, .. } => {
                    let mut range = Map::new();
                    if let Some(from) = from {
                        range.insert("$gte".into(), iso(from).into());
                    }
                    if let Some(to) = to {
                        range.insert("$lte".into(), iso(to).into());
                    }
                    Value::Object(range)
                }
            };
            out.insert(condition.field().to_string(), rendered);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(self.field.clone(), self.direction.as_str().into());
        Value::Object(out)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub skip: u64,
    /// `None` is unlimited.
    pub limit: Option<u64>,
}

fn iso(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn loosely_equals(stored: &Value, wanted: &str) -> bool {
    match stored {
        Value::String(s) => s == wanted,
        Value::Bool(b) => wanted == if *b { "true" } else { "false" },
        Value::Number(n) => {
            n.to_string() == wanted
                || matches!((n.as_f64(), wanted.parse::<f64>()), (Some(a), Ok(b)) if a == b)
        }
        Value::Array(items) => items.iter().any(|item| loosely_equals(item, wanted)),
        Value::Null | Value::Object(_) => false,
    }
}

/// Reads an ISO-8601 timestamp (RFC 3339, naive UTC, or a bare date).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order over JSON values: missing and null first, then numbers,
/// strings, objects, arrays, booleans.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
