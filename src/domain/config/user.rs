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

use crate::domain::reference::{Gvr, PrefixTable};
use crate::infrastructure::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, IN_MEMORY_CHANNEL_ALIAS, IN_MEMORY_CHANNEL_KIND,
    MESSAGING_GROUP, MESSAGING_VERSION,
};
use crate::shared::error::{KnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Group name used in the config file for the empty core group.
const CORE_GROUP_ALIAS: &str = "core";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub eventing: EventingConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventingConfig {
    #[serde(default)]
    pub sink_mappings: Vec<SinkMapping>,
    #[serde(default)]
    pub channel_type_mappings: Vec<ChannelTypeMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkMapping {
    pub prefix: String,
    pub group: String,
    pub version: String,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTypeMapping {
    pub alias: String,
    pub kind: String,
    pub group: String,
    pub version: String,
}

/// Labels and annotations applied together by `--profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub labels: Vec<NamedValue>,
    #[serde(default)]
    pub annotations: Vec<NamedValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

impl NamedValue {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// `group`, `version` and `kind` of a channel implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelType {
    pub group: String,
    pub version: String,
    pub kind: String,
}

fn builtin_profiles() -> BTreeMap<String, Profile> {
    let istio = Profile {
        labels: Vec::new(),
        annotations: vec![
            NamedValue::new("sidecar.istio.io/inject", "true"),
            NamedValue::new("sidecar.istio.io/rewriteAppHTTPProbers", "true"),
            NamedValue::new("serving.knative.openshift.io/enablePassthrough", "true"),
        ],
    };
    BTreeMap::from([("istio".to_string(), istio)])
}

impl UserConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the explicit file, or the default one when it exists.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(KnError::Config(format!(
                        "config file '{}' does not exist",
                        path
                    )));
                }
                Self::from_file(Path::new(path))
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("no user config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)
            .map_err(|e| KnError::Config(format!("invalid config file '{}': {}", path.display(), e)))?;
        info!(path = %path.display(), "loaded user config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults plus the configured sink mappings.
    pub fn prefix_table(&self) -> PrefixTable {
        let mut table = PrefixTable::with_defaults();
        for mapping in &self.eventing.sink_mappings {
            let group = if mapping.group == CORE_GROUP_ALIAS {
                ""
            } else {
                mapping.group.as_str()
            };
            table.insert(
                &mapping.prefix,
                Gvr::new(group, &mapping.version, &mapping.resource),
            );
        }
        table
    }

    /// User profile by name, falling back to the built-in ones.
    pub fn profile(&self, name: &str) -> Option<Profile> {
        self.profiles
            .get(name)
            .cloned()
            .or_else(|| builtin_profiles().remove(name))
    }

    pub fn channel_type_alias(&self, alias: &str) -> Option<ChannelType> {
        if let Some(mapping) = self
            .eventing
            .channel_type_mappings
            .iter()
            .find(|m| m.alias == alias)
        {
            return Some(ChannelType {
                group: mapping.group.clone(),
                version: mapping.version.clone(),
                kind: mapping.kind.clone(),
            });
        }
        (alias == IN_MEMORY_CHANNEL_ALIAS).then(|| ChannelType {
            group: MESSAGING_GROUP.to_string(),
            version: MESSAGING_VERSION.to_string(),
            kind: IN_MEMORY_CHANNEL_KIND.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
eventing:
  sink-mappings:
  - prefix: svc
    group: core
    version: v1
    resource: services
  - prefix: kafka
    group: messaging.knative.dev
    version: v1beta1
    resource: kafkachannels
  channel-type-mappings:
  - alias: kafka
    kind: KafkaChannel
    group: messaging.knative.dev
    version: v1alpha1
profiles:
  team:
    labels:
    - name: team
      value: blue
    annotations:
    - name: owner
      value: ops
"#;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = UserConfig::load(Some(&file.path().to_string_lossy())).unwrap();

        let table = config.prefix_table();
        assert_eq!(table.lookup("svc").unwrap(), Gvr::new("", "v1", "services"));
        assert_eq!(table.lookup("kafka").unwrap().resource, "kafkachannels");

        let kafka = config.channel_type_alias("kafka").unwrap();
        assert_eq!(kafka.kind, "KafkaChannel");
        assert_eq!(config.channel_type_alias("imc").unwrap().kind, "InMemoryChannel");
        assert!(config.channel_type_alias("nope").is_none());

        let team = config.profile("team").unwrap();
        assert_eq!(team.labels[0].value, "blue");
        assert!(config.profile("istio").is_some());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = UserConfig::load(Some("/nonexistent/kn/config.yaml")).unwrap_err();
        assert!(matches!(err, KnError::Config(_)));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(UserConfig::from_yaml("  \n").unwrap(), UserConfig::default());
    }
}
