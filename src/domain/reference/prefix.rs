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

//! Reference prefixes and their group/version/resource targets

use crate::infrastructure::constants::{
    EVENTING_GROUP, EVENTING_VERSION, MESSAGING_GROUP, MESSAGING_VERSION, SERVING_GROUP,
    SERVING_VERSION,
};
use crate::infrastructure::kubernetes::dynamic_resource;
use kube::api::ApiResource;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gvr {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl Gvr {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Parse `group/version/Kind`, turning the kind into a plural resource.
    pub fn guess(dotted: &str) -> Option<Self> {
        let parts: Vec<&str> = dotted.split('/').collect();
        match parts.as_slice() {
            [group, version, kind] if !version.is_empty() && !kind.is_empty() => {
                Some(Self::new(group, version, &kind_to_resource(kind)))
            }
            _ => None,
        }
    }

    /// Resolve an apiVersion/kind pair using the same transformation as `guess`.
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        Self::new(group, version, &kind_to_resource(kind))
    }

    pub fn api_resource(&self) -> ApiResource {
        dynamic_resource(&self.group, &self.version, "", &self.resource)
    }
}

impl fmt::Display for Gvr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.version, self.resource)
    }
}

/// Lowercase the kind and make it plural by appending `s` when missing.
pub fn kind_to_resource(kind: &str) -> String {
    let lower = kind.to_lowercase();
    if lower.ends_with('s') {
        lower
    } else {
        format!("{}s", lower)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    pub prefix: String,
    pub gvr: Gvr,
}

/// Ordered prefix table. For each target the canonical alias comes first.
#[derive(Debug, Clone)]
pub struct PrefixTable {
    entries: Vec<PrefixEntry>,
}

impl Default for PrefixTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PrefixTable {
    pub fn with_defaults() -> Self {
        let ksvc = Gvr::new(SERVING_GROUP, SERVING_VERSION, "services");
        let core_service = Gvr::new("", "v1", "services");
        let entries = vec![
            ("ksvc", ksvc.clone()),
            ("kservice", ksvc),
            ("kroute", Gvr::new(SERVING_GROUP, SERVING_VERSION, "routes")),
            ("broker", Gvr::new(EVENTING_GROUP, EVENTING_VERSION, "brokers")),
            ("channel", Gvr::new(MESSAGING_GROUP, MESSAGING_VERSION, "channels")),
            ("service", core_service.clone()),
            ("svc", core_service),
        ]
        .into_iter()
        .map(|(prefix, gvr)| PrefixEntry {
            prefix: prefix.to_string(),
            gvr,
        })
        .collect();
        Self { entries }
    }

    /// Add or override a prefix. An existing prefix keeps its position.
    pub fn insert(&mut self, prefix: &str, gvr: Gvr) {
        match self.entries.iter_mut().find(|e| e.prefix == prefix) {
            Some(entry) => entry.gvr = gvr,
            None => self.entries.push(PrefixEntry {
                prefix: prefix.to_string(),
                gvr,
            }),
        }
    }

    pub fn entries(&self) -> &[PrefixEntry] {
        &self.entries
    }

    /// Case-sensitive lookup, falling back to the `group/version/Kind` form.
    pub fn lookup(&self, prefix: &str) -> Option<Gvr> {
        self.entries
            .iter()
            .find(|e| e.prefix == prefix)
            .map(|e| e.gvr.clone())
            .or_else(|| Gvr::guess(prefix))
    }

    /// First alias registered for `gvr`.
    pub fn alias_for(&self, gvr: &Gvr) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.gvr == gvr)
            .map(|e| e.prefix.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_alias_preferred() {
        let table = PrefixTable::with_defaults();
        for prefix in ["ksvc", "kservice"] {
            let gvr = table.lookup(prefix).unwrap();
            assert_eq!(table.alias_for(&gvr), Some("ksvc"));
        }
        for prefix in ["service", "svc"] {
            let gvr = table.lookup(prefix).unwrap();
            assert_eq!(table.alias_for(&gvr), Some("service"));
        }
        for prefix in ["kroute", "broker", "channel"] {
            let gvr = table.lookup(prefix).unwrap();
            assert_eq!(table.alias_for(&gvr), Some(prefix));
        }
    }

    #[test]
    fn test_guess_from_dotted_form() {
        let gvr = PrefixTable::with_defaults()
            .lookup("sources.knative.dev/v1/PingSource")
            .unwrap();
        assert_eq!(gvr, Gvr::new("sources.knative.dev", "v1", "pingsources"));

        let gvr = Gvr::guess("example.com/v1alpha1/Widgets").unwrap();
        assert_eq!(gvr.resource, "widgets");
        assert!(Gvr::guess("nope").is_none());
        assert!(Gvr::guess("a/b").is_none());
    }

    #[test]
    fn test_user_entries_override_defaults() {
        let mut table = PrefixTable::with_defaults();
        table.insert("svc", Gvr::new("example.com", "v1", "things"));
        table.insert("kafka", Gvr::new("messaging.knative.dev", "v1beta1", "kafkachannels"));

        assert_eq!(table.lookup("svc").unwrap().resource, "things");
        assert_eq!(table.entries().last().unwrap().prefix, "kafka");
        assert_eq!(table.entries().len(), 8);
    }

    #[test]
    fn test_kind_transformation_matches_api_version_kind() {
        let gvr = Gvr::from_api_version_kind("serving.knative.dev/v1", "Service");
        assert_eq!(gvr, Gvr::new("serving.knative.dev", "v1", "services"));
        let gvr = Gvr::from_api_version_kind("v1", "Service");
        assert_eq!(gvr, Gvr::new("", "v1", "services"));
    }
}
