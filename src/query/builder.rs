use chrono::{DateTime, FixedOffset, Utc};
use derive_more::Display;
use serde_json::Value;
use std::collections::BTreeMap;

use super::TimeWindow;
use crate::model::resource::Resource;
use crate::store::{Condition, Filter, FindOptions, Sort, SortDirection};

/// Page size assumed for the page count when no `limit` is given.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Display, PartialEq)]
pub enum FilterError {
    #[display(fmt = "Invalid filter field: {}", _0)]
    InvalidField(String),
    #[display(fmt = "Invalid {} value: {}", key, value)]
    InvalidNumber { key: &'static str, value: String },
    #[display(fmt = "Invalid sort direction: {}", _0)]
    InvalidSortDirection(String),
}

impl std::error::Error for FilterError {}

/// A parsed list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub options: FindOptions,
    /// Zero-based page as requested.
    pub page: Option<u64>,
    pub dashboard: bool,
}

fn is_field_name(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn field_name(key: &str) -> Result<String, FilterError> {
    if is_field_name(key) {
        Ok(key.to_string())
    } else {
        Err(FilterError::InvalidField(key.to_string()))
    }
}

/// Empty values count as absent, the way a blank form field is sent.
fn non_empty<'a>(params: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn number(params: &BTreeMap<String, String>, key: &'static str) -> Result<Option<u64>, FilterError> {
    non_empty(params, key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| FilterError::InvalidNumber {
                key,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn parse_sort(raw: &str) -> Result<Sort, FilterError> {
    let mut parts = raw.split(',').map(str::trim);
    let field = field_name(parts.next().unwrap_or_default())?;
    let direction = match parts.next().unwrap_or("asc").to_ascii_lowercase().as_str() {
        "" | "asc" | "ascending" | "1" => SortDirection::Asc,
        "desc" | "descending" | "-1" => SortDirection::Desc,
        other => return Err(FilterError::InvalidSortDirection(other.to_string())),
    };
    Ok(Sort { field, direction })
}

impl ListQuery {
    pub fn build(
        resource: Resource,
        params: &BTreeMap<String, String>,
        now: &DateTime<FixedOffset>,
    ) -> Result<Self, FilterError> {
        let reserved = resource.reserved_keys();
        let mut filter = Filter::new();

        // everything not reserved is an equality filter
        for (key, value) in params {
            if reserved.contains(&key.as_str()) {
                continue;
            }
            filter.push(Condition::Equals {
                field: field_name(key)?,
                value: value.clone(),
            });
        }

        if let Some(keyword) = non_empty(params, "keyword") {
            let field = resource.keyword_field();
            filter.remove_field(field);
            filter.push(Condition::Contains {
                field: field.to_string(),
                needle: keyword.to_string(),
            });
        }

        if let Some(field) = resource.time_field() {
            let today = if resource.accepts_today() {
                params.get("today").map(String::as_str)
            } else {
                None
            };
            if let Some(window) = TimeWindow::from_params(non_empty(params, "time"), today) {
                let (from, to) = window.bounds(now);
                filter.push(Condition::Between {
                    field: field.to_string(),
                    from: Some(from),
                    to: Some(to),
                });
            }
        }

        if resource.has_active_window() && params.get("active").map(String::as_str) == Some("true") {
            let now: DateTime<Utc> = now.with_timezone(&Utc);
            filter.push(Condition::Between {
                field: "startDate".into(),
                from: None,
                to: Some(now),
            });
            filter.push(Condition::Between {
                field: "endDate".into(),
                from: Some(now),
                to: None,
            });
        }

        let sort = non_empty(params, "sort").map(parse_sort).transpose()?;
        // a limit of zero means "no limit"
        let limit = number(params, "limit")?.filter(|l| *l > 0);
        let page = number(params, "page")?;
        let skip = match (page, limit) {
            (Some(page), Some(limit)) => page.saturating_mul(limit),
            _ => 0,
        };

        let dashboard =
            resource.has_dashboard() && params.get("dashboard").map(String::as_str) == Some("true");

        Ok(Self {
            filter,
            options: FindOptions { sort, skip, limit },
            page,
            dashboard,
        })
    }

    /// Number of pages for `total` matches.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.options.limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// The applied filter plus sort, echoed back to clients.
    pub fn applied(&self) -> Value {
        let mut out = self.filter.to_json();
        if let Some(sort) = &self.options.sort {
            out.insert("sort".into(), sort.to_json());
        }
        Value::Object(out)
    }
}
