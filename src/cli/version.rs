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

//! `kn version`

use super::display::{print_document, OutputFormat};
use crate::infrastructure::constants::{
    DOMAIN_MAPPING_VERSION, EVENTING_GROUP, EVENTING_VERSION, EVENT_TYPE_VERSION, MESSAGING_GROUP,
    MESSAGING_VERSION, SERVING_GROUP, SERVING_VERSION, SOURCES_GROUP, SOURCES_VERSION,
};
use crate::shared::error::Result;
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

const UNKNOWN: &str = "unknown";

#[derive(Parser, Debug)]
pub struct VersionCommand {
    /// Output format: json or yaml
    #[arg(long, short = 'o')]
    pub output: Option<String>,
}

/// Build identity of this binary and the Knative APIs it speaks.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub build_date: String,
    pub git_revision: String,
    pub supported_apis: BTreeMap<String, Vec<String>>,
}

impl VersionInfo {
    pub fn current() -> Self {
        let api = |group: &str, version: &str| format!("{}/{}", group, version);
        let supported_apis = BTreeMap::from([
            (
                "serving".to_string(),
                vec![
                    api(SERVING_GROUP, SERVING_VERSION),
                    api(SERVING_GROUP, DOMAIN_MAPPING_VERSION),
                ],
            ),
            (
                "eventing".to_string(),
                vec![
                    api(EVENTING_GROUP, EVENTING_VERSION),
                    api(EVENTING_GROUP, EVENT_TYPE_VERSION),
                    api(MESSAGING_GROUP, MESSAGING_VERSION),
                    api(SOURCES_GROUP, SOURCES_VERSION),
                ],
            ),
        ]);
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_date: option_env!("KN_BUILD_DATE").unwrap_or(UNKNOWN).to_string(),
            git_revision: option_env!("KN_GIT_REVISION").unwrap_or(UNKNOWN).to_string(),
            supported_apis,
        }
    }
}

impl VersionCommand {
    pub fn execute(&self, out: &mut dyn Write) -> Result<()> {
        let info = VersionInfo::current();
        let allowed = [OutputFormat::Json, OutputFormat::Yaml];
        if let Some(format) = OutputFormat::parse_optional(self.output.as_deref(), &allowed)? {
            return print_document(&info, format, out);
        }

        writeln!(out, "Version:      {}", info.version)?;
        writeln!(out, "Build Date:   {}", info.build_date)?;
        writeln!(out, "Git Revision: {}", info.git_revision)?;
        writeln!(out, "Supported APIs:")?;
        for (area, apis) in &info.supported_apis {
            let mut title = area.clone();
            if let Some(first) = title.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            writeln!(out, "* {}", title)?;
            for api in apis {
                writeln!(out, "  - {}", api)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output() {
        let mut out = Vec::new();
        VersionCommand { output: None }.execute(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&format!("Version:      {}", env!("CARGO_PKG_VERSION"))));
        assert!(text.contains("* Serving\n  - serving.knative.dev/v1\n"));
        assert!(text.contains("  - sources.knative.dev/v1"));
    }

    #[test]
    fn test_json_output() {
        let mut out = Vec::new();
        VersionCommand {
            output: Some("json".to_string()),
        }
        .execute(&mut out)
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert!(value["supportedApis"]["eventing"].is_array());
    }

    #[test]
    fn test_name_format_rejected() {
        let mut out = Vec::new();
        let err = VersionCommand {
            output: Some("name".to_string()),
        }
        .execute(&mut out)
        .unwrap_err();
        assert!(err.is_usage());
    }
}
