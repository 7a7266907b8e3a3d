use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Every document collection the panel exposes under `/api/<name>`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
    Attendance,
    Leave,
    Project,
    Task,
    Expense,
    Department,
    Designation,
    Setting,
    User,
    Notification,
    Announcement,
}

/// Denormalized lookup attached to each listed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    /// Field on the row holding the referenced external `id`.
    pub key: &'static str,
    pub target: Resource,
    /// Field the referenced document is attached under.
    pub attach_as: &'static str,
}

const USER_JOIN: Join = Join {
    key: "userId",
    target: Resource::User,
    attach_as: "user",
};

const PROJECT_JOIN: Join = Join {
    key: "projectId",
    target: Resource::Project,
    attach_as: "project",
};

impl Resource {
    pub fn collection(&self) -> &'static str {
        (*self).into()
    }

    pub fn path(&self) -> String {
        format!("/api/{self}")
    }

    /// Field the `keyword` parameter searches.
    pub fn keyword_field(&self) -> &'static str {
        match self {
            Resource::Task
            | Resource::Expense
            | Resource::Leave
            | Resource::Announcement
            | Resource::Notification => "title",
            _ => "name",
        }
    }

    /// Field the `time`/`today` windows apply to.
    pub fn time_field(&self) -> Option<&'static str> {
        match self {
            Resource::Attendance => Some("checkIn"),
            Resource::Expense => Some("date"),
            _ => None,
        }
    }

    /// Whether `today=true` alone opens a window (attendance only).
    pub fn accepts_today(&self) -> bool {
        matches!(self, Resource::Attendance)
    }

    pub fn has_dashboard(&self) -> bool {
        matches!(self, Resource::Project | Resource::Expense)
    }

    /// Announcements support `active=true` (running right now).
    pub fn has_active_window(&self) -> bool {
        matches!(self, Resource::Announcement)
    }

    /// Query keys with a meaning of their own for this resource; every other
    /// key is an equality filter.
    pub fn reserved_keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["sort", "limit", "page", "keyword"];
        if self.time_field().is_some() {
            keys.push("time");
        }
        if self.accepts_today() {
            keys.push("today");
        }
        if self.has_dashboard() {
            keys.push("dashboard");
        }
        if self.has_active_window() {
            keys.push("active");
        }
        keys
    }

    pub fn joins(&self) -> &'static [Join] {
        match self {
            Resource::Attendance | Resource::Leave => &[USER_JOIN],
            Resource::Task => &[PROJECT_JOIN, USER_JOIN],
            _ => &[],
        }
    }
}
