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

//! Builders for the four source kinds

use super::overrides::{apply_ce_overrides, apply_env, MapUpdate};
use super::resource_requirements;
use crate::infrastructure::constants::{APISERVER_MODE_REFERENCE, APISERVER_MODE_RESOURCE};
use crate::infrastructure::kubernetes::resources::{
    ApiServerResource, ApiServerSource, ApiServerSourceSpec, BindingSubject, ContainerSource,
    ContainerSourceSpec, Destination, PingSource, PingSourceSpec, SinkBinding, SinkBindingSpec,
    SourceSpec,
};
use crate::shared::error::{KnError, Result};
use k8s_openapi::api::core::v1::{Container, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use regex::Regex;
use std::collections::BTreeMap;

const BASE64_PATTERN: &str = r"^([A-Za-z0-9+/]{4})*([A-Za-z0-9+/]{3}=|[A-Za-z0-9+/]{2}==)?$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEncoding {
    Text,
    Base64,
}

/// Pick the encoding for ping data. Without an explicit encoding, data that
/// looks like base64 is taken as base64.
pub fn select_encoding(data: &str, encoding: Option<&str>) -> Result<DataEncoding> {
    match encoding {
        None | Some("") => {
            let re = Regex::new(BASE64_PATTERN)?;
            if !data.is_empty() && re.is_match(data) {
                Ok(DataEncoding::Base64)
            } else {
                Ok(DataEncoding::Text)
            }
        }
        Some("text") => Ok(DataEncoding::Text),
        Some("base64") => Ok(DataEncoding::Base64),
        Some(other) => Err(KnError::InvalidEncoding(other.to_string())),
    }
}

fn selector_from(raw: &str, what: &str) -> Result<LabelSelector> {
    let mut labels = BTreeMap::new();
    for pair in raw.split(',').filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .filter(|(k, _)| !k.is_empty())
            .ok_or_else(|| KnError::validation(format!("invalid {} selector '{}'", what, raw)))?;
        labels.insert(key.to_string(), value.to_string());
    }
    if labels.is_empty() {
        return Err(KnError::validation(format!("empty {} selector", what)));
    }
    Ok(LabelSelector {
        match_labels: Some(labels),
        match_expressions: None,
    })
}

/// Parse `Kind:apiVersion[:key=value,...]`.
pub fn parse_apiserver_resource(raw: &str) -> Result<ApiServerResource> {
    let parts: Vec<&str> = raw.splitn(3, ':').collect();
    match parts.as_slice() {
        [kind, api_version, rest @ ..] if !kind.is_empty() && !api_version.is_empty() => {
            let selector = match rest.first() {
                Some(sel) if !sel.is_empty() => Some(selector_from(sel, "resource")?),
                _ => None,
            };
            Ok(ApiServerResource {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
                selector,
            })
        }
        _ => Err(KnError::validation(format!(
            "invalid resource '{}', expected Kind:apiVersion[:key=value,...]",
            raw
        ))),
    }
}

/// Parse `Kind:apiVersion:name` or `Kind:apiVersion:key=value,...`.
pub fn parse_binding_subject(raw: &str, namespace: &str) -> Result<BindingSubject> {
    let parts: Vec<&str> = raw.splitn(3, ':').collect();
    match parts.as_slice() {
        [kind, api_version, target]
            if !kind.is_empty() && !api_version.is_empty() && !target.is_empty() =>
        {
            let mut subject = BindingSubject {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
                namespace: Some(namespace.to_string()),
                name: None,
                selector: None,
            };
            if target.contains('=') {
                subject.selector = Some(selector_from(target, "subject")?);
            } else {
                subject.name = Some(target.to_string());
            }
            Ok(subject)
        }
        _ => Err(KnError::validation(format!(
            "invalid subject '{}', expected Kind:apiVersion:name or Kind:apiVersion:key=value,...",
            raw
        ))),
    }
}

fn named_meta<K: kube::Resource>(obj: &mut K, namespace: &str) {
    obj.meta_mut().namespace = Some(namespace.to_string());
}

fn apply_source(source: &mut SourceSpec, sink: Option<Destination>, overrides: &MapUpdate) {
    if let Some(sink) = sink {
        source.sink = sink;
    }
    apply_ce_overrides(&mut source.ce_overrides, overrides);
}

pub struct PingSourceBuilder {
    source: PingSource,
}

impl PingSourceBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut source = PingSource::new(name, PingSourceSpec::default());
        named_meta(&mut source, namespace);
        Self { source }
    }

    pub fn from_existing(source: PingSource) -> Self {
        Self { source }
    }

    pub fn schedule(mut self, schedule: &str) -> Self {
        self.source.spec.schedule = schedule.to_string();
        self
    }

    /// Sets exactly one of `data` and `dataBase64`.
    pub fn data(mut self, data: &str, encoding: Option<&str>) -> Result<Self> {
        let spec = &mut self.source.spec;
        match select_encoding(data, encoding)? {
            DataEncoding::Text => {
                spec.data = data.to_string();
                spec.data_base64.clear();
            }
            DataEncoding::Base64 => {
                spec.data_base64 = data.to_string();
                spec.data.clear();
            }
        }
        Ok(self)
    }

    pub fn sink(mut self, sink: Option<Destination>) -> Self {
        apply_source(&mut self.source.spec.source, sink, &MapUpdate::default());
        self
    }

    pub fn ce_overrides(mut self, update: &MapUpdate) -> Self {
        apply_ce_overrides(&mut self.source.spec.source.ce_overrides, update);
        self
    }

    pub fn build(self) -> Result<PingSource> {
        if self.source.spec.source.sink.is_empty() {
            return Err(KnError::SinkRequired);
        }
        Ok(self.source)
    }
}

pub struct ApiServerSourceBuilder {
    source: ApiServerSource,
}

impl ApiServerSourceBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut source = ApiServerSource::new(
            name,
            ApiServerSourceSpec {
                mode: APISERVER_MODE_REFERENCE.to_string(),
                ..Default::default()
            },
        );
        named_meta(&mut source, namespace);
        Self { source }
    }

    pub fn from_existing(source: ApiServerSource) -> Self {
        Self { source }
    }

    /// Replaces the watched resources.
    pub fn resources(mut self, resources: Vec<ApiServerResource>) -> Self {
        self.source.spec.resources = resources;
        self
    }

    pub fn mode(mut self, mode: &str) -> Result<Self> {
        if mode != APISERVER_MODE_REFERENCE && mode != APISERVER_MODE_RESOURCE {
            return Err(KnError::validation(format!(
                "mode must be one of '{}' or '{}', got '{}'",
                APISERVER_MODE_REFERENCE, APISERVER_MODE_RESOURCE, mode
            )));
        }
        self.source.spec.mode = mode.to_string();
        Ok(self)
    }

    pub fn service_account(mut self, service_account: &str) -> Self {
        self.source.spec.service_account_name = service_account.to_string();
        self
    }

    pub fn sink(mut self, sink: Option<Destination>) -> Self {
        apply_source(&mut self.source.spec.source, sink, &MapUpdate::default());
        self
    }

    pub fn ce_overrides(mut self, update: &MapUpdate) -> Self {
        apply_ce_overrides(&mut self.source.spec.source.ce_overrides, update);
        self
    }

    pub fn build(self) -> Result<ApiServerSource> {
        if self.source.spec.resources.is_empty() {
            return Err(KnError::validation("at least one resource is required"));
        }
        if self.source.spec.source.sink.is_empty() {
            return Err(KnError::SinkRequired);
        }
        Ok(self.source)
    }
}

pub struct SinkBindingBuilder {
    binding: SinkBinding,
}

impl SinkBindingBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut binding = SinkBinding::new(name, SinkBindingSpec::default());
        named_meta(&mut binding, namespace);
        Self { binding }
    }

    pub fn from_existing(binding: SinkBinding) -> Self {
        Self { binding }
    }

    pub fn subject(mut self, subject: BindingSubject) -> Self {
        self.binding.spec.subject = subject;
        self
    }

    pub fn sink(mut self, sink: Option<Destination>) -> Self {
        apply_source(&mut self.binding.spec.source, sink, &MapUpdate::default());
        self
    }

    pub fn ce_overrides(mut self, update: &MapUpdate) -> Self {
        apply_ce_overrides(&mut self.binding.spec.source.ce_overrides, update);
        self
    }

    /// The subject needs a name or a label selector.
    pub fn build(self) -> Result<SinkBinding> {
        let subject = &self.binding.spec.subject;
        let has_name = subject.name.as_deref().is_some_and(|n| !n.is_empty());
        let has_selector = subject
            .selector
            .as_ref()
            .and_then(|s| s.match_labels.as_ref())
            .is_some_and(|l| !l.is_empty());
        if !has_name && !has_selector {
            return Err(KnError::validation(
                "subject must specify a name or a label selector",
            ));
        }
        if self.binding.spec.source.sink.is_empty() {
            return Err(KnError::SinkRequired);
        }
        Ok(self.binding)
    }
}

pub struct ContainerSourceBuilder {
    source: ContainerSource,
}

impl ContainerSourceBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut source = ContainerSource::new(name, ContainerSourceSpec::default());
        named_meta(&mut source, namespace);
        Self { source }
    }

    pub fn from_existing(source: ContainerSource) -> Self {
        Self { source }
    }

    fn container(&mut self) -> &mut Container {
        let spec = self
            .source
            .spec
            .template
            .spec
            .get_or_insert_with(PodSpec::default);
        if spec.containers.is_empty() {
            spec.containers.push(Container::default());
        }
        &mut spec.containers[0]
    }

    pub fn image(mut self, image: &str) -> Self {
        self.container().image = Some(image.to_string());
        self
    }

    pub fn env(mut self, update: &MapUpdate) -> Self {
        let container = self.container();
        let mut env = container.env.take().unwrap_or_default();
        apply_env(&mut env, update);
        container.env = (!env.is_empty()).then_some(env);
        self
    }

    pub fn args(mut self, args: &[String]) -> Self {
        if !args.is_empty() {
            self.container().args = Some(args.to_vec());
        }
        self
    }

    /// cpu and memory become both requests and limits.
    pub fn resources(mut self, cpu: Option<&str>, memory: Option<&str>) -> Self {
        if cpu.is_none() && memory.is_none() {
            return self;
        }
        let container = self.container();
        let mut requirements = container.resources.take().unwrap_or_default();
        let mut values = BTreeMap::new();
        if let Some(cpu) = cpu {
            values.insert("cpu".to_string(), cpu.to_string());
        }
        if let Some(memory) = memory {
            values.insert("memory".to_string(), memory.to_string());
        }
        let quantities = resource_requirements::quantities(&values);
        requirements
            .requests
            .get_or_insert_with(BTreeMap::new)
            .extend(quantities.clone());
        requirements
            .limits
            .get_or_insert_with(BTreeMap::new)
            .extend(quantities);
        container.resources = Some(requirements);
        self
    }

    pub fn sink(mut self, sink: Option<Destination>) -> Self {
        apply_source(&mut self.source.spec.source, sink, &MapUpdate::default());
        self
    }

    pub fn ce_overrides(mut self, update: &MapUpdate) -> Self {
        apply_ce_overrides(&mut self.source.spec.source.ce_overrides, update);
        self
    }

    pub fn build(self) -> Result<ContainerSource> {
        let has_image = self
            .source
            .spec
            .template
            .spec
            .as_ref()
            .and_then(|s| s.containers.first())
            .and_then(|c| c.image.as_deref())
            .is_some_and(|i| !i.is_empty());
        if !has_image {
            return Err(KnError::validation("an image is required"));
        }
        if self.source.spec.source.sink.is_empty() {
            return Err(KnError::SinkRequired);
        }
        Ok(self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri_sink() -> Option<Destination> {
        Some(Destination::from_uri("http://sink.example"))
    }

    #[test]
    fn test_base64_detection() {
        assert_eq!(select_encoding("ZGF0YQ==", None).unwrap(), DataEncoding::Base64);
        assert_eq!(select_encoding("maxwell", None).unwrap(), DataEncoding::Text);
        assert_eq!(select_encoding("ZGF0YQ==", Some("text")).unwrap(), DataEncoding::Text);
        assert_eq!(select_encoding("maxwell", Some("base64")).unwrap(), DataEncoding::Base64);
        assert!(matches!(
            select_encoding("x", Some("hex")),
            Err(KnError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_ping_sets_exactly_one_data_field() {
        let ping = PingSourceBuilder::new("p", "default")
            .data("maxwell", None)
            .unwrap()
            .sink(uri_sink())
            .build()
            .unwrap();
        assert_eq!(ping.spec.data, "maxwell");
        assert!(ping.spec.data_base64.is_empty());

        let ping = PingSourceBuilder::from_existing(ping)
            .data("ZGF0YQ==", None)
            .unwrap()
            .build()
            .unwrap();
        assert!(ping.spec.data.is_empty());
        assert_eq!(ping.spec.data_base64, "ZGF0YQ==");
    }

    #[test]
    fn test_ping_requires_sink() {
        let err = PingSourceBuilder::new("p", "default").build().unwrap_err();
        assert!(matches!(err, KnError::SinkRequired));
    }

    #[test]
    fn test_apiserver_resource_parsing() {
        let res = parse_apiserver_resource("Deployment:apps/v1:app=web,tier=fe").unwrap();
        assert_eq!(res.api_version, "apps/v1");
        assert_eq!(res.kind, "Deployment");
        assert_eq!(res.selector.unwrap().match_labels.unwrap().len(), 2);

        let res = parse_apiserver_resource("Pod:v1").unwrap();
        assert!(res.selector.is_none());
        assert!(parse_apiserver_resource("Pod").is_err());
    }

    #[test]
    fn test_apiserver_mode_validated() {
        assert!(ApiServerSourceBuilder::new("a", "default").mode("Resource").is_ok());
        assert!(ApiServerSourceBuilder::new("a", "default").mode("Other").is_err());
    }

    #[test]
    fn test_binding_subject_name_or_selector() {
        let subject = parse_binding_subject("Deployment:apps/v1:app=web", "default").unwrap();
        assert!(subject.name.is_none());
        let subject = parse_binding_subject("Deployment:apps/v1:web", "default").unwrap();
        assert_eq!(subject.name.as_deref(), Some("web"));

        let err = SinkBindingBuilder::new("b", "default")
            .sink(uri_sink())
            .build()
            .unwrap_err();
        assert!(matches!(err, KnError::Validation(_)));
    }

    #[test]
    fn test_container_source_resources() {
        let source = ContainerSourceBuilder::new("c", "default")
            .image("gcr.io/heartbeats")
            .args(&["--period=1".to_string()])
            .resources(Some("100m"), Some("64Mi"))
            .sink(uri_sink())
            .build()
            .unwrap();
        let container = &source.spec.template.spec.unwrap().containers[0];
        let resources = container.resources.as_ref().unwrap();
        assert_eq!(resources.requests.as_ref().unwrap()["cpu"].0, "100m");
        assert_eq!(resources.limits.as_ref().unwrap()["memory"].0, "64Mi");
    }
}
