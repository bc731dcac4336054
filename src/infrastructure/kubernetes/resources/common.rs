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

//! Duck types shared by every Knative resource

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";
pub const CONDITION_UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConditionSeverity {
    Error,
    Warning,
    Info,
}

/// A named boolean-with-reason attached to a resource's status.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn new(type_: &str, status: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: &str, message: &str) -> Self {
        self.reason = Some(reason.to_string());
        self.message = Some(message.to_string());
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == CONDITION_TRUE
    }

    pub fn is_false(&self) -> bool {
        self.status == CONDITION_FALSE
    }

    pub fn is_ready_type(&self) -> bool {
        self.type_ == CONDITION_READY
    }

    /// An empty severity is an error.
    pub fn severity(&self) -> ConditionSeverity {
        match self.severity.as_deref() {
            Some("Warning") => ConditionSeverity::Warning,
            Some("Info") => ConditionSeverity::Info,
            _ => ConditionSeverity::Error,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Addressable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Reference to a cluster object by kind, apiVersion and name.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KReference {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    pub api_version: String,
}

/// A sink address: either a URI or an object reference.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<KReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Destination {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            reference: None,
            uri: Some(uri.into()),
        }
    }

    pub fn from_ref(reference: KReference) -> Self {
        Self {
            reference: Some(reference),
            uri: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_none() && self.uri.is_none()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudEventOverrides {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_letter_sink: Option<Destination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<i32>,
}

/// Sink and overrides carried by every source kind.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    #[serde(default)]
    pub sink: Destination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ce_overrides: Option<CloudEventOverrides>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    #[serde(flatten)]
    pub base: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_uri: Option<String>,
}

/// Read access to `status.conditions[]`.
pub trait HasConditions {
    fn conditions(&self) -> &[Condition];

    fn ready_condition(&self) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.is_ready_type())
    }
}

impl HasConditions for Status {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_severity_defaults_to_error() {
        let mut cond = Condition::new("Ready", CONDITION_FALSE);
        assert_eq!(cond.severity(), ConditionSeverity::Error);
        cond.severity = Some("Warning".to_string());
        assert_eq!(cond.severity(), ConditionSeverity::Warning);
        cond.severity = Some("Info".to_string());
        assert_eq!(cond.severity(), ConditionSeverity::Info);
    }

    #[test]
    fn test_destination_serializes_ref_key() {
        let dest = Destination::from_ref(KReference {
            kind: "Service".to_string(),
            namespace: Some("default".to_string()),
            name: "mysvc".to_string(),
            api_version: "serving.knative.dev/v1".to_string(),
        });
        let value = serde_json::to_value(&dest).unwrap();
        assert_eq!(value["ref"]["apiVersion"], "serving.knative.dev/v1");
        assert!(value.get("uri").is_none());
    }

    #[test]
    fn test_status_ready_condition_lookup() {
        let status = Status {
            conditions: vec![
                Condition::new("Active", CONDITION_TRUE),
                Condition::new("Ready", CONDITION_FALSE),
            ],
            ..Default::default()
        };
        assert!(status.ready_condition().unwrap().is_false());
    }
}
