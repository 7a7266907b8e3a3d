use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc,
};

/// Source of "now" for request-relative windows and dashboard years.
#[derive(Clone, Copy, Debug, Default)]
pub enum Clock {
    /// Server wall clock in the local offset.
    #[default]
    System,
    Fixed(DateTime<FixedOffset>),
}

impl Clock {
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Clock::System => Local::now().into(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Calendar period around "now", in the clock's own offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    /// Sunday through Saturday.
    Week,
    Month,
}

impl TimeWindow {
    /// `time=week|month` pick those periods; any other non-empty `time`, or
    /// `today=true` where accepted, means the current day.
    pub fn from_params(time: Option<&str>, today: Option<&str>) -> Option<Self> {
        match time.filter(|t| !t.is_empty()) {
            Some("week") => Some(TimeWindow::Week),
            Some("month") => Some(TimeWindow::Month),
            Some(_) => Some(TimeWindow::Day),
            None if today == Some("true") => Some(TimeWindow::Day),
            None => None,
        }
    }

    /// Inclusive bounds, from the first to the last millisecond of the period.
    pub fn bounds(&self, now: &DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let (first, next) = match self {
            TimeWindow::Day => (today, today + Duration::days(1)),
            TimeWindow::Week => {
                let first = today - Duration::days(today.weekday().num_days_from_sunday().into());
                (first, first + Duration::days(7))
            }
            TimeWindow::Month => {
                let first = today.with_day(1).unwrap_or(today);
                (first, first_of_next_month(first))
            }
        };

        let offset = now.offset();
        let start = at_midnight(offset, first);
        let end = at_midnight(offset, next) - Duration::milliseconds(1);
        (start, end)
    }
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first + Duration::days(31))
}

fn at_midnight(offset: &FixedOffset, day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    // a fixed offset maps every local time to exactly one instant
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn utc(raw: &str) -> DateTime<Utc> {
        at(raw).with_timezone(&Utc)
    }

    #[test]
    fn params_pick_the_window() {
        assert_eq!(TimeWindow::from_params(Some("week"), None), Some(TimeWindow::Week));
        assert_eq!(TimeWindow::from_params(Some("month"), None), Some(TimeWindow::Month));
        assert_eq!(TimeWindow::from_params(Some("day"), None), Some(TimeWindow::Day));
        assert_eq!(TimeWindow::from_params(None, Some("true")), Some(TimeWindow::Day));
        assert_eq!(TimeWindow::from_params(None, Some("false")), None);
        assert_eq!(TimeWindow::from_params(Some(""), None), None);
    }

    #[test]
    fn day_spans_local_midnight_to_midnight() {
        let (start, end) = TimeWindow::Day.bounds(&at("2024-01-01T12:00:00Z"));
        assert_eq!(start, utc("2024-01-01T00:00:00Z"));
        assert_eq!(end, utc("2024-01-01T23:59:59.999Z"));
    }

    #[test]
    fn day_respects_the_clock_offset() {
        let (start, end) = TimeWindow::Day.bounds(&at("2024-01-01T12:00:00+08:00"));
        assert_eq!(start, utc("2023-12-31T16:00:00Z"));
        assert_eq!(end, utc("2024-01-01T15:59:59.999Z"));
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-01-03 is a Wednesday
        let (start, end) = TimeWindow::Week.bounds(&at("2024-01-03T08:00:00Z"));
        assert_eq!(start, utc("2023-12-31T00:00:00Z"));
        assert_eq!(end, utc("2024-01-06T23:59:59.999Z"));
    }

    #[test]
    fn month_covers_the_calendar_month() {
        let (start, end) = TimeWindow::Month.bounds(&at("2024-02-10T08:00:00Z"));
        assert_eq!(start, utc("2024-02-01T00:00:00Z"));
        assert_eq!(end, utc("2024-02-29T23:59:59.999Z"));

        let (start, end) = TimeWindow::Month.bounds(&at("2024-12-31T23:00:00Z"));
        assert_eq!(start, utc("2024-12-01T00:00:00Z"));
        assert_eq!(end, utc("2024-12-31T23:59:59.999Z"));
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = Clock::Fixed(at("2024-01-01T09:00:00Z"));
        assert_eq!(clock.now(), clock.now());
    }
}
