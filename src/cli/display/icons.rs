//! Condition status glyphs for describe output

use crate::infrastructure::kubernetes::resources::{Condition, ConditionSeverity};

pub struct StatusIcon;

impl StatusIcon {
    /// Condition is True
    pub const OK: &'static str = "++";

    /// False with error severity
    pub const ERROR: &'static str = "!!";

    pub const WARNING: &'static str = " W";

    pub const INFO: &'static str = " I";

    /// Ready condition still reconciling
    pub const PENDING: &'static str = "  ";

    pub const UNKNOWN: &'static str = "??";

    pub fn for_condition(cond: &Condition) -> &'static str {
        if cond.is_true() {
            return Self::OK;
        }
        if cond.is_false() {
            return match cond.severity() {
                ConditionSeverity::Error => Self::ERROR,
                ConditionSeverity::Warning => Self::WARNING,
                ConditionSeverity::Info => Self::INFO,
            };
        }
        if cond.is_ready_type() {
            Self::PENDING
        } else {
            Self::UNKNOWN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyphs() {
        assert_eq!(StatusIcon::for_condition(&Condition::new("Ready", "True")), "++");
        assert_eq!(StatusIcon::for_condition(&Condition::new("Ready", "False")), "!!");
        assert_eq!(StatusIcon::for_condition(&Condition::new("Ready", "Unknown")), "  ");
        assert_eq!(StatusIcon::for_condition(&Condition::new("Active", "Unknown")), "??");

        let mut warn = Condition::new("Active", "False");
        warn.severity = Some("Warning".to_string());
        assert_eq!(StatusIcon::for_condition(&warn), " W");
        warn.severity = Some("Info".to_string());
        assert_eq!(StatusIcon::for_condition(&warn), " I");
    }
}
