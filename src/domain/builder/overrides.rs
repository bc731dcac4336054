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

//! `KEY=VALUE` / `KEY-` updates for maps, overrides and env vars

use crate::infrastructure::kubernetes::resources::CloudEventOverrides;
use crate::shared::error::{KnError, Result};
use k8s_openapi::api::core::v1::EnvVar;
use std::collections::BTreeMap;

/// Additions and removals parsed from repeated flag values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapUpdate {
    pub add: BTreeMap<String, String>,
    pub remove: Vec<String>,
}

impl MapUpdate {
    /// `flag` is only used in error messages.
    pub fn parse(values: &[String], flag: &str) -> Result<Self> {
        let mut update = Self::default();
        for raw in values {
            match raw.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    update.add.insert(key.to_string(), value.to_string());
                }
                Some(_) => {
                    return Err(KnError::usage(format!(
                        "invalid --{} '{}': key must not be empty",
                        flag, raw
                    )))
                }
                None => match raw.strip_suffix('-') {
                    Some(key) if !key.is_empty() => update.remove.push(key.to_string()),
                    _ => {
                        return Err(KnError::usage(format!(
                            "invalid --{} '{}', expected KEY=VALUE or KEY-",
                            flag, raw
                        )))
                    }
                },
            }
        }
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Add first, then remove.
    pub fn apply(&self, target: &mut BTreeMap<String, String>) {
        for (key, value) in &self.add {
            target.insert(key.clone(), value.clone());
        }
        for key in &self.remove {
            target.remove(key);
        }
    }

    /// Apply onto an optional map, collapsing an empty result to `None`.
    pub fn apply_optional(&self, target: &mut Option<BTreeMap<String, String>>) {
        if self.is_empty() {
            return;
        }
        let mut map = target.take().unwrap_or_default();
        self.apply(&mut map);
        *target = (!map.is_empty()).then_some(map);
    }
}

pub fn apply_ce_overrides(target: &mut Option<CloudEventOverrides>, update: &MapUpdate) {
    if update.is_empty() {
        return;
    }
    let mut extensions = target
        .take()
        .map(|o| o.extensions)
        .unwrap_or_default();
    update.apply(&mut extensions);
    *target = (!extensions.is_empty()).then_some(CloudEventOverrides { extensions });
}

/// Existing variables keep their position; new ones are appended.
pub fn apply_env(env: &mut Vec<EnvVar>, update: &MapUpdate) {
    for (name, value) in &update.add {
        match env.iter_mut().find(|e| &e.name == name) {
            Some(existing) => {
                existing.value = Some(value.clone());
                existing.value_from = None;
            }
            None => env.push(EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..Default::default()
            }),
        }
    }
    env.retain(|e| !update.remove.contains(&e.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_add_and_remove() {
        let update = MapUpdate::parse(&strings(&["foo=bar", "a=b=c", "bla-"]), "ce-override").unwrap();
        assert_eq!(update.add["foo"], "bar");
        assert_eq!(update.add["a"], "b=c");
        assert_eq!(update.remove, vec!["bla".to_string()]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(MapUpdate::parse(&strings(&["foo"]), "ce-override").is_err());
        assert!(MapUpdate::parse(&strings(&["=x"]), "ce-override").is_err());
        assert!(MapUpdate::parse(&strings(&["-"]), "ce-override").is_err());
    }

    #[test]
    fn test_add_then_remove() {
        let mut target = Some(CloudEventOverrides {
            extensions: BTreeMap::from([
                ("bla".to_string(), "blub".to_string()),
                ("foo".to_string(), "bar".to_string()),
            ]),
        });
        let update = MapUpdate::parse(&strings(&["bla-", "foo=baz"]), "ce-override").unwrap();
        apply_ce_overrides(&mut target, &update);
        assert_eq!(
            target.unwrap().extensions,
            BTreeMap::from([("foo".to_string(), "baz".to_string())])
        );
    }

    #[test]
    fn test_removing_everything_clears_overrides() {
        let mut target = Some(CloudEventOverrides {
            extensions: BTreeMap::from([("foo".to_string(), "bar".to_string())]),
        });
        apply_ce_overrides(&mut target, &MapUpdate::parse(&strings(&["foo-"]), "x").unwrap());
        assert!(target.is_none());
    }

    #[test]
    fn test_env_keeps_order() {
        let mut env = vec![
            EnvVar {
                name: "A".to_string(),
                value: Some("1".to_string()),
                ..Default::default()
            },
            EnvVar {
                name: "B".to_string(),
                value: Some("2".to_string()),
                ..Default::default()
            },
        ];
        let update = MapUpdate::parse(&strings(&["B=3", "C=4", "A-"]), "env").unwrap();
        apply_env(&mut env, &update);
        let names: Vec<_> = env.iter().map(|e| (e.name.as_str(), e.value.as_deref())).collect();
        assert_eq!(names, vec![("B", Some("3")), ("C", Some("4"))]);
    }
}
