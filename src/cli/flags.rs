// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Flag groups shared by verbs, and a declarative flag validator

use crate::cli::display::OutputFormat;
use crate::shared::error::{KnError, Result};
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct NamespaceFlags {
    /// Namespace to use, defaults to the kubeconfig context namespace
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListFlags {
    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// List the requested object(s) across all namespaces
    #[arg(long, short = 'A')]
    pub all_namespaces: bool,

    /// Output format: json, yaml or name
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Omit the header row in table output
    #[arg(long)]
    pub no_headers: bool,
}

impl ListFlags {
    pub fn format(&self) -> Result<Option<OutputFormat>> {
        OutputFormat::parse_optional(self.output.as_deref(), OutputFormat::LIST)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DescribeFlags {
    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Output format: json, yaml or name (url where the object has one)
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Print all details, one map entry per line
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SinkFlags {
    /// Addressable sink: a URL, or [PREFIX:]NAME[:NAMESPACE] (default prefix ksvc)
    #[arg(long, short = 's')]
    pub sink: Option<String>,

    /// CloudEvent extension override KEY=VALUE, or KEY- to remove
    #[arg(long = "ce-override", value_name = "KEY=VALUE")]
    pub ce_overrides: Vec<String>,
}

/// Presence of each flag by name, checked with a few declarative rules.
#[derive(Debug, Default)]
pub struct FlagRules {
    flags: Vec<(String, bool)>,
}

impl FlagRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, name: &str, present: bool) -> Self {
        self.flags.push((name.to_string(), present));
        self
    }

    fn present(&self, names: &[&str]) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|(n, set)| *set && names.contains(&n.as_str()))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn mutually_exclusive(&self, names: &[&str]) -> Result<&Self> {
        let set = self.present(names);
        if set.len() > 1 {
            return Err(KnError::usage(format!(
                "{} are mutually exclusive",
                quoted(&set)
            )));
        }
        Ok(self)
    }

    pub fn required(&self, name: &str) -> Result<&Self> {
        if self.present(&[name]).is_empty() {
            return Err(KnError::usage(format!("required flag '{}' not set", name)));
        }
        Ok(self)
    }

    pub fn exactly_one(&self, names: &[&str]) -> Result<&Self> {
        match self.present(names).len() {
            1 => Ok(self),
            0 => Err(KnError::usage(format!("one of {} is required", quoted(names)))),
            _ => Err(KnError::usage(format!(
                "only one of {} can be given",
                quoted(names)
            ))),
        }
    }
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutually_exclusive() {
        let rules = FlagRules::new()
            .flag("--broker", true)
            .flag("--reference", true);
        let err = rules
            .mutually_exclusive(&["--broker", "--reference"])
            .unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("'--broker', '--reference'"));

        let rules = FlagRules::new().flag("--broker", true).flag("--reference", false);
        assert!(rules.mutually_exclusive(&["--broker", "--reference"]).is_ok());
    }

    #[test]
    fn test_required_and_exactly_one() {
        let rules = FlagRules::new().flag("NAME", false).flag("--all", false);
        assert!(rules.required("NAME").is_err());
        assert!(rules.exactly_one(&["NAME", "--all"]).is_err());

        let rules = FlagRules::new().flag("NAME", true).flag("--all", true);
        let err = rules.exactly_one(&["NAME", "--all"]).unwrap_err();
        assert!(err.to_string().starts_with("only one of"));

        let rules = FlagRules::new().flag("NAME", false).flag("--all", true);
        assert!(rules.exactly_one(&["NAME", "--all"]).is_ok());
    }

    #[test]
    fn test_list_format_validation() {
        let flags = ListFlags {
            output: Some("wide".to_string()),
            ..Default::default()
        };
        assert!(flags.format().is_err());
    }
}
