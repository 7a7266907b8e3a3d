use chrono::NaiveDateTime;
use serde_json::{Number, Value};
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::{Query, QueryAs, QueryScalar};

use super::{Condition, Filter, FindOptions, SortDirection};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    DateTime(NaiveDateTime),
}

/// ===============================
/// SQL statement container
/// ===============================
#[derive(Debug, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// MySQL's maximum row count, used when an offset has no limit.
const UNLIMITED: u64 = 18_446_744_073_709_551_615;

/// `$."field"`; quoting keeps names such as `2fa` valid JSON paths.
fn json_path(field: &str) -> SqlValue {
    let quoted = field.replace('\\', "\\\\").replace('"', "\\\"");
    SqlValue::String(format!("$.\"{quoted}\""))
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// JSON scalars a query-string value loosely equals: always the string,
/// plus the number or boolean it spells.
fn equality_candidates(value: &str) -> Vec<String> {
    let mut candidates = vec![Value::String(value.to_string()).to_string()];
    if let Some(number) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        candidates.push(number.to_string());
    }
    if value == "true" || value == "false" {
        candidates.push(value.to_string());
    }
    candidates
}

/// `JSON_CONTAINS` matches a scalar field equal to the candidate and an
/// array holding it at any depth; numbers compare by value.
fn equals_clause(field: &str, value: &str, values: &mut Vec<SqlValue>) -> String {
    let candidates = equality_candidates(value);
    let mut parts = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        parts.push("JSON_CONTAINS(JSON_EXTRACT(body, ?), ?)");
        values.push(json_path(field));
        values.push(SqlValue::String(candidate));
    }
    format!("({})", parts.join(" OR "))
}

/// The field as a UTC DATETIME. Accepts a bare date, naive date-times
/// (taken as UTC), a trailing `Z` and `±hh:mm` offsets.
fn timestamp_expr(field: &str, values: &mut Vec<SqlValue>) -> String {
    const RAW: &str = "JSON_UNQUOTE(JSON_EXTRACT(body, ?))";
    let sql = format!(
        "(CASE WHEN {RAW} REGEXP '[+-][0-9]{{2}}:[0-9]{{2}}$' \
         THEN CONVERT_TZ(CAST(LEFT({RAW}, CHAR_LENGTH({RAW}) - 6) AS DATETIME(3)), RIGHT({RAW}, 6), '+00:00') \
         ELSE CAST(TRIM(TRAILING 'Z' FROM {RAW}) AS DATETIME(3)) END)"
    );
    for _ in 0..sql.matches('?').count() {
        values.push(json_path(field));
    }
    sql
}

/// Build the WHERE clause shared by find and count.
pub fn build_where(collection: &str, filter: &Filter) -> SqlQuery {
    let mut conditions = vec!["collection = ?".to_string()];
    let mut values = vec![SqlValue::String(collection.to_string())];

    for condition in filter.conditions() {
        match condition {
            Condition::Equals { field, value } => {
                conditions.push(equals_clause(field, value, &mut values));
            }
            Condition::Contains { field, needle } => {
                conditions.push("LOWER(JSON_UNQUOTE(JSON_EXTRACT(body, ?))) LIKE ?".into());
                values.push(json_path(field));
                values.push(SqlValue::String(escape_like(needle)));
            }
            Condition::Between { field, from, to } => {
                if let Some(from) = from {
                    conditions.push(format!("{} >= ?", timestamp_expr(field, &mut values)));
                    values.push(SqlValue::DateTime(from.naive_utc()));
                }
                if let Some(to) = to {
                    conditions.push(format!("{} <= ?", timestamp_expr(field, &mut values)));
                    values.push(SqlValue::DateTime(to.naive_utc()));
                }
            }
        }
    }

    SqlQuery {
        sql: format!("WHERE {}", conditions.join(" AND ")),
        values,
    }
}

pub fn build_find(collection: &str, filter: &Filter, options: &FindOptions) -> SqlQuery {
    let SqlQuery { sql: where_clause, mut values } = build_where(collection, filter);

    let mut sql = format!("SELECT body FROM documents {where_clause} ORDER BY ");
    if let Some(sort) = &options.sort {
        let direction = match sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        sql.push_str(&format!("JSON_EXTRACT(body, ?) {direction}, "));
        values.push(json_path(&sort.field));
    }
    sql.push_str("seq ASC");

    if options.limit.is_some() || options.skip > 0 {
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(SqlValue::U64(options.limit.unwrap_or(UNLIMITED)));
        values.push(SqlValue::U64(options.skip));
    }

    SqlQuery { sql, values }
}

pub fn build_count(collection: &str, filter: &Filter) -> SqlQuery {
    let SqlQuery { sql: where_clause, values } = build_where(collection, filter);
    SqlQuery {
        sql: format!("SELECT COUNT(*) FROM documents {where_clause}"),
        values,
    }
}

pub fn build_delete(collection: &str, ids: &[String]) -> SqlQuery {
    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut values = vec![SqlValue::String(collection.to_string())];
    values.extend(ids.iter().cloned().map(SqlValue::String));

    SqlQuery {
        sql: format!("DELETE FROM documents WHERE collection = ? AND doc_id IN ({placeholders})"),
        values,
    }
}

/// Binding helpers, one per sqlx query flavour.
pub fn bind_query<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: Vec<SqlValue>,
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
        };
    }
    query
}

pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: Vec<SqlValue>,
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
        };
    }
    query
}

pub fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    values: Vec<SqlValue>,
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Sort;
    use chrono::{TimeZone, Utc};

    fn path(field: &str) -> SqlValue {
        SqlValue::String(format!("$.\"{field}\""))
    }

    #[test]
    fn where_clause_binds_collection_then_conditions() {
        let filter = Filter::eq("title", "Launch").and(Condition::Contains {
            field: "name".into(),
            needle: "50%_off".into(),
        });

        let q = build_where("project", &filter);

        assert_eq!(
            q.sql,
            "WHERE collection = ? AND (JSON_CONTAINS(JSON_EXTRACT(body, ?), ?)) \
             AND LOWER(JSON_UNQUOTE(JSON_EXTRACT(body, ?))) LIKE ?"
        );
        assert_eq!(
            q.values,
            vec![
                SqlValue::String("project".into()),
                path("title"),
                SqlValue::String("\"Launch\"".into()),
                path("name"),
                SqlValue::String("%50\\%\\_off%".into()),
            ]
        );
    }

    #[test]
    fn equality_also_tries_the_number_and_boolean_spelled() {
        assert_eq!(equality_candidates("b"), vec!["\"b\""]);
        assert_eq!(equality_candidates("40"), vec!["\"40\"", "40.0"]);
        assert_eq!(equality_candidates("40.0"), vec!["\"40.0\"", "40.0"]);
        assert_eq!(equality_candidates("true"), vec!["\"true\"", "true"]);
        assert_eq!(equality_candidates("NaN"), vec!["\"NaN\""]);
        assert_eq!(equality_candidates("say \"hi\""), vec!["\"say \\\"hi\\\"\""]);
    }

    #[test]
    fn equality_matches_array_members_through_json_contains() {
        // JSON_CONTAINS('["a","b"]', '"b"') holds, so tags=b finds the row
        let q = build_where("task", &Filter::eq("tags", "b"));
        assert_eq!(
            q.sql,
            "WHERE collection = ? AND (JSON_CONTAINS(JSON_EXTRACT(body, ?), ?))"
        );
        assert_eq!(q.values[1], path("tags"));
        assert_eq!(q.values[2], SqlValue::String("\"b\"".into()));

        let q = build_where("expense", &Filter::eq("amount", "40"));
        assert_eq!(q.sql.matches("JSON_CONTAINS").count(), 2);
        assert!(q.sql.contains(" OR "));
        assert_eq!(q.values[4], SqlValue::String("40.0".into()));
    }

    #[test]
    fn paths_are_quoted() {
        let q = build_where("user", &Filter::eq("2fa", "on"));
        assert_eq!(q.values[1], SqlValue::String("$.\"2fa\"".into()));

        let q = build_where("user", &Filter::eq("we\"ird", "x"));
        assert_eq!(q.values[1], SqlValue::String("$.\"we\\\"ird\"".into()));
    }

    #[test]
    fn time_window_honours_utc_offsets() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap();
        let filter = Filter::new().and(Condition::Between {
            field: "checkIn".into(),
            from: Some(from),
            to: Some(to),
        });

        let q = build_where("attendance", &filter);

        assert!(q.sql.contains("CONVERT_TZ("));
        assert!(q.sql.contains("RIGHT(JSON_UNQUOTE(JSON_EXTRACT(body, ?)), 6), '+00:00')"));
        assert!(q.sql.contains("REGEXP '[+-][0-9]{2}:[0-9]{2}$'"));
        assert!(!q.sql.contains("LEFT(JSON_UNQUOTE(JSON_EXTRACT(body, ?)), 19)"));
        assert_eq!(q.sql.matches(") >= ?").count(), 1);
        assert_eq!(q.sql.matches(") <= ?").count(), 1);

        // every placeholder has a value, in order
        assert_eq!(q.sql.matches('?').count(), q.values.len());
        assert_eq!(q.values.len(), 13);
        assert!(q.values[1..6].iter().all(|v| *v == path("checkIn")));
        assert_eq!(q.values[6], SqlValue::DateTime(from.naive_utc()));
        assert_eq!(q.values[12], SqlValue::DateTime(to.naive_utc()));
    }

    #[test]
    fn find_orders_by_sort_then_insertion_and_pages() {
        let options = FindOptions {
            sort: Some(Sort {
                field: "name".into(),
                direction: SortDirection::Desc,
            }),
            skip: 40,
            limit: Some(20),
        };

        let q = build_find("user", &Filter::new(), &options);

        assert_eq!(
            q.sql,
            "SELECT body FROM documents WHERE collection = ? \
             ORDER BY JSON_EXTRACT(body, ?) DESC, seq ASC LIMIT ? OFFSET ?"
        );
        assert_eq!(q.values[1], path("name"));
        assert_eq!(q.values[2], SqlValue::U64(20));
        assert_eq!(q.values[3], SqlValue::U64(40));
    }

    #[test]
    fn unpaged_find_has_no_limit_clause() {
        let q = build_find("user", &Filter::new(), &FindOptions::default());
        assert!(!q.sql.contains("LIMIT"));
        assert_eq!(q.values.len(), 1);
    }

    #[test]
    fn delete_lists_one_placeholder_per_id() {
        let q = build_delete("task", &["a".into(), "b".into(), "c".into()]);
        assert!(q.sql.ends_with("doc_id IN (?, ?, ?)"));
        assert_eq!(q.values.len(), 4);
    }
}
