use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::store::filter::parse_timestamp;

/// Fields of a project document the dashboard and update rules read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub progress: Value,
    #[serde(default)]
    pub completed_at: Value,
    #[serde(default)]
    pub created_at: Value,
}

impl Project {
    pub fn is_running(&self) -> bool {
        is_truthy(&self.status)
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.completed_at)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Truthiness as the panel's clients send it: absent, null, false, 0 and ""
/// are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// An update completes a project when it leaves `status` falsy or sets
/// `progress` to exactly the number 100.
pub fn update_completes(patch: &serde_json::Map<String, Value>) -> bool {
    let status_off = !patch.get("status").is_some_and(is_truthy);
    let finished = patch
        .get("progress")
        .and_then(Value::as_f64)
        .is_some_and(|p| p == 100.0);
    status_off || finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn completion_is_a_disjunction() {
        assert!(update_completes(&patch(json!({"status": false, "progress": 100}))));
        assert!(update_completes(&patch(json!({"status": false, "progress": 10}))));
        assert!(update_completes(&patch(json!({"status": true, "progress": 100}))));
        assert!(update_completes(&patch(json!({"name": "renamed"}))));
        assert!(!update_completes(&patch(json!({"status": true, "progress": 99}))));
        assert!(!update_completes(&patch(json!({"status": true, "progress": "100"}))));
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("x"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn reads_dates_leniently() {
        let project: Project = serde_json::from_value(json!({
            "status": true,
            "createdAt": "2024-03-05T10:00:00.000Z",
            "completedAt": "garbage",
            "name": 12
        }))
        .unwrap();

        assert!(project.is_running());
        assert!(project.created_at().is_some());
        assert!(project.completed_at().is_none());
    }
}
