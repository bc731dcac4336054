//! Human friendly derived values: age, ready and reason

use crate::infrastructure::kubernetes::resources::{Condition, HasConditions};
use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

pub const UNKNOWN: &str = "<unknown>";

/// Age since `created`, with kubectl's rounding rules.
pub fn age(created: Option<&Time>, now: DateTime<Utc>) -> String {
    match created {
        Some(Time(ts)) if ts.timestamp() != 0 => human_duration(now.signed_duration_since(*ts)),
        _ => UNKNOWN.to_string(),
    }
}

pub fn human_duration(d: chrono::Duration) -> String {
    let total_ms = d.num_milliseconds();
    if total_ms < 0 {
        return "0s".to_string();
    }
    let seconds = (total_ms + 500) / 1000;
    if seconds < 60 * 2 {
        return format!("{}s", seconds);
    }
    let minutes = d.num_minutes();
    if minutes < 10 {
        let s = d.num_seconds() % 60;
        return if s == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, s)
        };
    }
    if minutes < 60 * 3 {
        return format!("{}m", minutes);
    }
    let hours = d.num_hours();
    if hours < 8 {
        let m = minutes % 60;
        return if m == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, m)
        };
    }
    if hours < 48 {
        return format!("{}h", hours);
    }
    if hours < 24 * 8 {
        let h = hours % 24;
        return if h == 0 {
            format!("{}d", hours / 24)
        } else {
            format!("{}d{}h", hours / 24, h)
        };
    }
    if hours < 24 * 365 * 2 {
        return format!("{}d", hours / 24);
    }
    if hours < 24 * 365 * 8 {
        let days = (hours / 24) % 365;
        return if days == 0 {
            format!("{}y", hours / 24 / 365)
        } else {
            format!("{}y{}d", hours / 24 / 365, days)
        };
    }
    format!("{}y", hours / 24 / 365)
}

pub fn ready<T: HasConditions + ?Sized>(obj: &T) -> String {
    obj.ready_condition()
        .map(|c| c.status.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `2 OK / 3`: conditions that are `True` out of all conditions.
pub fn condition_summary<T: HasConditions + ?Sized>(obj: &T) -> String {
    let conditions = obj.conditions();
    let ok = conditions.iter().filter(|c| c.is_true()).count();
    format!("{} OK / {}", ok, conditions.len())
}

/// Reason column: empty when ready.
pub fn non_ready_reason<T: HasConditions + ?Sized>(obj: &T) -> String {
    match obj.ready_condition() {
        None => UNKNOWN.to_string(),
        Some(cond) if cond.is_true() => String::new(),
        Some(cond) => condition_reason(cond),
    }
}

pub fn condition_reason(cond: &Condition) -> String {
    let reason = cond.reason.as_deref().unwrap_or_default();
    let message = cond.message.as_deref().unwrap_or_default();
    match (reason.is_empty(), message.is_empty()) {
        (false, false) => format!("{} : {}", reason, message),
        (false, true) => reason.to_string(),
        (true, false) => message.to_string(),
        (true, true) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::resources::Status;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_age_edges() {
        let now = Utc::now();
        assert_eq!(age(Some(&Time(now)), now), "0s");
        assert_eq!(age(None, now), UNKNOWN);
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(age(Some(&Time(epoch)), now), UNKNOWN);
    }

    #[test]
    fn test_human_duration_buckets() {
        assert_eq!(human_duration(Duration::seconds(59)), "59s");
        assert_eq!(human_duration(Duration::seconds(119)), "119s");
        assert_eq!(human_duration(Duration::seconds(150)), "2m30s");
        assert_eq!(human_duration(Duration::minutes(5)), "5m");
        assert_eq!(human_duration(Duration::minutes(90)), "90m");
        assert_eq!(human_duration(Duration::minutes(4 * 60 + 5)), "4h5m");
        assert_eq!(human_duration(Duration::hours(30)), "30h");
        assert_eq!(human_duration(Duration::hours(3 * 24 + 2)), "3d2h");
        assert_eq!(human_duration(Duration::days(100)), "100d");
        assert_eq!(human_duration(Duration::days(365 * 3 + 10)), "3y10d");
        assert_eq!(human_duration(Duration::days(365 * 10)), "10y");
        assert_eq!(human_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_ready_and_reason() {
        let mut status = Status::default();
        assert_eq!(ready(&status), UNKNOWN);
        assert_eq!(non_ready_reason(&status), UNKNOWN);

        status.conditions = vec![Condition::new("Ready", "True")];
        assert_eq!(ready(&status), "True");
        assert_eq!(non_ready_reason(&status), "");

        status.conditions = vec![Condition::new("Ready", "False").with_reason("Failed", "boom")];
        assert_eq!(non_ready_reason(&status), "Failed : boom");

        status.conditions[0].message = None;
        assert_eq!(non_ready_reason(&status), "Failed");
    }

    #[test]
    fn test_condition_summary() {
        let status = Status {
            conditions: vec![
                Condition::new("Ready", "False"),
                Condition::new("Addressable", "True"),
            ],
            ..Default::default()
        };
        assert_eq!(condition_summary(&status), "1 OK / 2");
    }
}
