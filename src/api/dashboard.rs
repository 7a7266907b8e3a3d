//! Monthly summaries returned in place of rows when `dashboard=true`.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::model::Resource;
use crate::model::expense::Expense;
use crate::model::project::Project;
use crate::store::Document;

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct ProjectDashboard {
    /// Projects completed per month of the current year.
    pub completed: Vec<u64>,
    /// Running projects by creation month of the current year.
    pub progressing: Vec<u64>,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct ExpenseDashboard {
    /// Expense totals per month of the current year.
    pub annual: Vec<f64>,
    /// Total of the current month.
    pub month: f64,
}

/// Zero-based month of `at` when it falls in the year of `now`, read in
/// the clock's offset.
fn month_in_year(at: DateTime<Utc>, now: &DateTime<FixedOffset>) -> Option<usize> {
    let local = at.with_timezone(now.offset());
    (local.year() == now.year()).then(|| local.month0() as usize)
}

fn parse<T: serde::de::DeserializeOwned + Default>(doc: &Document) -> T {
    serde_json::from_value(Value::Object(doc.clone())).unwrap_or_default()
}

pub fn project_dashboard(rows: &[Document], now: &DateTime<FixedOffset>) -> ProjectDashboard {
    let mut summary = ProjectDashboard {
        completed: vec![0; 12],
        progressing: vec![0; 12],
    };

    for row in rows {
        let project: Project = parse(row);
        if let Some(m) = project.completed_at().and_then(|at| month_in_year(at, now)) {
            summary.completed[m] += 1;
        }
        if project.is_running() {
            if let Some(m) = project.created_at().and_then(|at| month_in_year(at, now)) {
                summary.progressing[m] += 1;
            }
        }
    }

    summary
}

pub fn expense_dashboard(rows: &[Document], now: &DateTime<FixedOffset>) -> ExpenseDashboard {
    let mut annual = vec![0.0; 12];

    for row in rows {
        let expense: Expense = parse(row);
        if let Some(m) = expense.date().and_then(|at| month_in_year(at, now)) {
            annual[m] += expense.amount();
        }
    }

    let month = annual[now.month0() as usize];
    ExpenseDashboard { annual, month }
}

/// Summary for entities that have one.
pub fn summarize(resource: Resource, rows: &[Document], now: &DateTime<FixedOffset>) -> Option<Value> {
    let summary = match resource {
        Resource::Project => serde_json::to_value(project_dashboard(rows, now)),
        Resource::Expense => serde_json::to_value(expense_dashboard(rows, now)),
        _ => return None,
    };
    summary.ok()
}
