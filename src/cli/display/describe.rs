//! Aligned key/value output for describe commands

use super::human;
use super::{ColorTheme, StatusIcon};
use crate::domain::reference::{sink_to_text, PrefixTable};
use crate::infrastructure::constants::TRUNCATE_AT;
use crate::infrastructure::kubernetes::resources::{
    CloudEventOverrides, Condition, ConditionSeverity, Destination,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::fmt::Display;

const KEY_WIDTH: usize = 14;
const INDENT: &str = "  ";
const LAST_APPLIED: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// Cut `value` to at most `max` characters, marking the cut with ` ...`.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(max).collect();
    cut.push_str(" ...");
    cut
}

/// Ready first, then error conditions, warnings and infos, each by type.
pub fn sort_conditions(conditions: &[Condition]) -> Vec<&Condition> {
    let rank = |c: &Condition| -> u8 {
        if c.is_ready_type() {
            return 0;
        }
        match c.severity() {
            ConditionSeverity::Error => 1,
            ConditionSeverity::Warning => 2,
            ConditionSeverity::Info => 3,
        }
    };
    let mut sorted: Vec<&Condition> = conditions.iter().collect();
    sorted.sort_by(|a, b| (rank(a), &a.type_).cmp(&(rank(b), &b.type_)));
    sorted
}

pub struct DescribeWriter {
    buf: String,
    verbose: bool,
    color: bool,
    now: DateTime<Utc>,
    theme: ColorTheme,
}

impl DescribeWriter {
    pub fn new(verbose: bool, color: bool) -> Self {
        Self {
            buf: String::new(),
            verbose,
            color,
            now: Utc::now(),
            theme: ColorTheme::default(),
        }
    }

    fn key_prefix(indent: usize, key: &str) -> String {
        let label = format!("{}:", key);
        let pad = KEY_WIDTH.saturating_sub(label.len()).max(1);
        format!("{}{}{}", INDENT.repeat(indent), label, " ".repeat(pad))
    }

    pub fn line(&mut self, indent: usize, key: &str, value: impl Display) {
        let value = value.to_string();
        if value.is_empty() {
            self.header(indent, key);
            return;
        }
        let prefix = Self::key_prefix(indent, key);
        self.buf.push_str(&prefix);
        self.buf.push_str(&value);
        self.buf.push('\n');
    }

    /// A line only when `value` is present and non-empty.
    pub fn optional(&mut self, indent: usize, key: &str, value: Option<impl Display>) {
        if let Some(v) = value {
            let v = v.to_string();
            if !v.is_empty() {
                self.line(indent, key, v);
            }
        }
    }

    pub fn header(&mut self, indent: usize, title: &str) {
        self.buf.push_str(&INDENT.repeat(indent));
        self.buf.push_str(title);
        self.buf.push_str(":\n");
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Key/value map: one joined line cut at the truncation limit, or one
    /// entry per line in verbose mode.
    pub fn map(&mut self, indent: usize, key: &str, map: &BTreeMap<String, String>) {
        let entries: Vec<String> = map
            .iter()
            .filter(|(k, _)| self.verbose || k.as_str() != LAST_APPLIED)
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if entries.is_empty() {
            return;
        }
        if !self.verbose {
            self.line(indent, key, truncate(&entries.join(", "), TRUNCATE_AT));
            return;
        }
        let prefix = Self::key_prefix(indent, key);
        let continuation = " ".repeat(prefix.len());
        for (i, entry) in entries.iter().enumerate() {
            self.buf
                .push_str(if i == 0 { &prefix } else { &continuation });
            self.buf.push_str(entry);
            self.buf.push('\n');
        }
    }

    pub fn list(&mut self, indent: usize, key: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        if self.verbose {
            let prefix = Self::key_prefix(indent, key);
            let continuation = " ".repeat(prefix.len());
            for (i, value) in values.iter().enumerate() {
                self.buf
                    .push_str(if i == 0 { &prefix } else { &continuation });
                self.buf.push_str(value);
                self.buf.push('\n');
            }
        } else {
            self.line(indent, key, truncate(&values.join(", "), TRUNCATE_AT));
        }
    }

    /// Name, namespace, labels, annotations and age.
    pub fn metadata(&mut self, meta: &ObjectMeta) {
        self.line(0, "Name", meta.name.as_deref().unwrap_or_default());
        self.line(0, "Namespace", meta.namespace.as_deref().unwrap_or_default());
        if let Some(labels) = &meta.labels {
            self.map(0, "Labels", labels);
        }
        if let Some(annotations) = &meta.annotations {
            self.map(0, "Annotations", annotations);
        }
        self.line(0, "Age", human::age(meta.creation_timestamp.as_ref(), self.now));
    }

    pub fn destination(
        &mut self,
        indent: usize,
        title: &str,
        dest: &Destination,
        namespace: &str,
        prefixes: &PrefixTable,
    ) {
        if dest.is_empty() {
            return;
        }
        self.header(indent, title);
        if let Some(r) = &dest.reference {
            self.line(indent + 1, "Name", &r.name);
            self.optional(indent + 1, "Namespace", r.namespace.as_deref());
            self.line(
                indent + 1,
                "Resource",
                format!("{} ({})", r.kind, r.api_version),
            );
            if self.verbose {
                self.line(indent + 1, "Ref", sink_to_text(dest, namespace, prefixes));
            }
        }
        self.optional(indent + 1, "URI", dest.uri.as_deref());
    }

    pub fn ce_overrides(&mut self, overrides: Option<&CloudEventOverrides>) {
        if let Some(o) = overrides {
            if !o.extensions.is_empty() {
                self.header(0, "CloudEvent Overrides");
                for (k, v) in &o.extensions {
                    self.line(1, k, v);
                }
            }
        }
    }

    pub fn conditions(&mut self, conditions: &[Condition]) {
        if conditions.is_empty() {
            return;
        }
        let sorted = sort_conditions(conditions);
        let width = sorted
            .iter()
            .map(|c| c.type_.len())
            .max()
            .unwrap_or(4)
            .max(4);
        self.blank();
        self.header(0, "Conditions");
        self.buf.push_str(&format!(
            "{}OK {:<width$} {:>5} REASON\n",
            INDENT,
            "TYPE",
            "AGE",
            width = width
        ));
        for cond in sorted {
            let glyph = StatusIcon::for_condition(cond);
            let glyph = if self.color {
                glyph
                    .color(self.theme.status_text_color(&cond.status))
                    .to_string()
            } else {
                glyph.to_string()
            };
            let age = human::age(cond.last_transition_time.as_ref(), self.now);
            let reason = if self.verbose {
                human::condition_reason(cond)
            } else {
                cond.reason.clone().unwrap_or_default()
            };
            let line = format!(
                "{}{} {:<width$} {:>5} {}",
                INDENT,
                glyph,
                cond.type_,
                age,
                reason,
                width = width
            );
            self.buf.push_str(line.trim_end());
            self.buf.push('\n');
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate("abcdefghijk", 10), "abcdefghij ...");
    }

    #[test]
    fn test_condition_order() {
        let mut warn = Condition::new("Zeta", "False");
        warn.severity = Some("Warning".to_string());
        let mut info = Condition::new("Alpha", "False");
        info.severity = Some("Info".to_string());
        let conditions = vec![
            info,
            warn,
            Condition::new("Routes", "True"),
            Condition::new("Ready", "True"),
            Condition::new("Config", "True"),
        ];
        let order: Vec<&str> = sort_conditions(&conditions)
            .iter()
            .map(|c| c.type_.as_str())
            .collect();
        assert_eq!(order, vec!["Ready", "Config", "Routes", "Zeta", "Alpha"]);
    }

    #[test]
    fn test_map_truncated_unless_verbose() {
        let map: BTreeMap<String, String> = (0..20)
            .map(|i| (format!("key{:02}", i), "value".to_string()))
            .collect();

        let mut w = DescribeWriter::new(false, false);
        w.map(0, "Labels", &map);
        let out = w.finish();
        assert_eq!(out.lines().count(), 1);
        assert!(out.trim_end().ends_with(" ..."));

        let mut w = DescribeWriter::new(true, false);
        w.map(0, "Labels", &map);
        let out = w.finish();
        assert_eq!(out.lines().count(), 20);
        assert!(out.lines().next().unwrap().contains("key00=value"));
    }

    #[test]
    fn test_conditions_block() {
        let mut w = DescribeWriter::new(false, false);
        w.conditions(&[
            Condition::new("Ready", "Unknown"),
            Condition::new("Active", "False").with_reason("Missing", "no sink"),
        ]);
        let out = w.finish();
        assert!(out.contains("Conditions:"));
        assert!(out.contains("     Ready"));
        assert!(out.contains("!! Active"));
        assert!(out.contains("Missing"));
    }

    #[test]
    fn test_aligned_keys() {
        let mut w = DescribeWriter::new(false, false);
        w.line(0, "Name", "pipe");
        w.line(0, "Namespace", "test");
        let out = w.finish();
        let cols: Vec<usize> = out
            .lines()
            .map(|l| l.find("pipe").or_else(|| l.find("test")).unwrap())
            .collect();
        assert_eq!(cols[0], cols[1]);
    }
}
