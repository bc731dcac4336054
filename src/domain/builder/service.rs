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

//! Knative Service builder

use super::overrides::{apply_env, MapUpdate};
use super::resource_requirements::quantities;
use crate::domain::config::Profile;
use crate::infrastructure::constants::{ANNOTATION_MAX_SCALE, ANNOTATION_MIN_SCALE};
use crate::infrastructure::kubernetes::resources::{RevisionTemplateSpec, Service, ServiceSpec};
use crate::shared::error::{KnError, Result};
use k8s_openapi::api::core::v1::{Container, ContainerPort};
use std::collections::BTreeMap;

pub struct ServiceBuilder {
    service: Service,
}

impl ServiceBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut service = Service::new(name, ServiceSpec::default());
        service.metadata.namespace = Some(namespace.to_string());
        Self { service }
    }

    pub fn from_existing(service: Service) -> Self {
        Self { service }
    }

    fn template(&mut self) -> &mut RevisionTemplateSpec {
        &mut self.service.spec.template
    }

    fn container(&mut self) -> &mut Container {
        let containers = &mut self.service.spec.template.spec.containers;
        if containers.is_empty() {
            containers.push(Container::default());
        }
        &mut containers[0]
    }

    fn template_annotation(&mut self, key: &str, value: String) {
        self.template()
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value);
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

    pub fn port(mut self, port: i32) -> Self {
        self.container().ports = Some(vec![ContainerPort {
            container_port: port,
            ..Default::default()
        }]);
        self
    }

    /// Labels go on the service and on the revision template.
    pub fn labels(mut self, update: &MapUpdate) -> Self {
        update.apply_optional(&mut self.service.metadata.labels);
        update.apply_optional(&mut self.template().metadata.labels);
        self
    }

    pub fn annotations(mut self, update: &MapUpdate) -> Self {
        update.apply_optional(&mut self.service.metadata.annotations);
        update.apply_optional(&mut self.template().metadata.annotations);
        self
    }

    pub fn scale_min(mut self, min: i32) -> Self {
        self.template_annotation(ANNOTATION_MIN_SCALE, min.to_string());
        self
    }

    pub fn scale_max(mut self, max: i32) -> Self {
        self.template_annotation(ANNOTATION_MAX_SCALE, max.to_string());
        self
    }

    pub fn concurrency_limit(mut self, limit: i64) -> Self {
        self.template().spec.container_concurrency = Some(limit);
        self
    }

    pub fn service_account(mut self, account: &str) -> Self {
        self.template().spec.service_account_name = Some(account.to_string());
        self
    }

    /// Revision names are prefixed with the service name.
    pub fn revision_name(mut self, revision: &str) -> Self {
        let service_name = self.service.metadata.name.clone().unwrap_or_default();
        let prefix = format!("{}-", service_name);
        let name = if revision.starts_with(&prefix) {
            revision.to_string()
        } else {
            format!("{}{}", prefix, revision)
        };
        self.template().metadata.name = Some(name);
        self
    }

    /// Let the server generate the next revision name.
    pub fn clear_revision_name(mut self) -> Self {
        self.template().metadata.name = None;
        self
    }

    /// Merge a profile into the template, or remove every key it defines.
    pub fn profile(mut self, profile: &Profile, remove: bool) -> Self {
        let metadata = &mut self.template().metadata;
        let mut labels = MapUpdate::default();
        let mut annotations = MapUpdate::default();
        for label in &profile.labels {
            if remove {
                labels.remove.push(label.name.clone());
            } else {
                labels.add.insert(label.name.clone(), label.value.clone());
            }
        }
        for annotation in &profile.annotations {
            if remove {
                annotations.remove.push(annotation.name.clone());
            } else {
                annotations
                    .add
                    .insert(annotation.name.clone(), annotation.value.clone());
            }
        }
        labels.apply_optional(&mut metadata.labels);
        annotations.apply_optional(&mut metadata.annotations);
        self
    }

    pub fn requests(mut self, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            let resources = self.container().resources.get_or_insert_with(Default::default);
            resources
                .requests
                .get_or_insert_with(BTreeMap::new)
                .extend(quantities(values));
        }
        self
    }

    pub fn limits(mut self, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            let resources = self.container().resources.get_or_insert_with(Default::default);
            resources
                .limits
                .get_or_insert_with(BTreeMap::new)
                .extend(quantities(values));
        }
        self
    }

    pub fn build(self) -> Result<Service> {
        let has_image = self
            .service
            .spec
            .template
            .spec
            .containers
            .first()
            .and_then(|c| c.image.as_deref())
            .is_some_and(|i| !i.is_empty());
        if !has_image {
            return Err(KnError::validation("an image is required, use --image"));
        }
        Ok(self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::UserConfig;

    fn update(values: &[&str]) -> MapUpdate {
        let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        MapUpdate::parse(&values, "test").unwrap()
    }

    #[test]
    fn test_build_requires_image() {
        assert!(ServiceBuilder::new("s", "default").build().is_err());
    }

    #[test]
    fn test_full_service() {
        let svc = ServiceBuilder::new("hello", "default")
            .image("gcr.io/hello")
            .env(&update(&["TARGET=world"]))
            .port(8080)
            .labels(&update(&["team=blue"]))
            .scale_min(1)
            .scale_max(3)
            .concurrency_limit(10)
            .service_account("runner")
            .revision_name("v1")
            .requests(&BTreeMap::from([("cpu".to_string(), "100m".to_string())]))
            .build()
            .unwrap();

        let template = &svc.spec.template;
        assert_eq!(template.metadata.name.as_deref(), Some("hello-v1"));
        let annotations = template.metadata.annotations.as_ref().unwrap();
        assert_eq!(annotations[ANNOTATION_MIN_SCALE], "1");
        assert_eq!(annotations[ANNOTATION_MAX_SCALE], "3");
        assert_eq!(svc.metadata.labels.as_ref().unwrap()["team"], "blue");
        assert_eq!(template.spec.container_concurrency, Some(10));
        let container = &template.spec.containers[0];
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 8080);
        assert_eq!(container.env.as_ref().unwrap()[0].name, "TARGET");
    }

    #[test]
    fn test_profile_add_and_remove() {
        let config = UserConfig::default();
        let istio = config.profile("istio").unwrap();
        let svc = ServiceBuilder::new("hello", "default")
            .image("img")
            .annotations(&update(&["keep=me"]))
            .profile(&istio, false)
            .build()
            .unwrap();
        let annotations = svc.spec.template.metadata.annotations.clone().unwrap();
        assert_eq!(annotations["sidecar.istio.io/inject"], "true");

        let svc = ServiceBuilder::from_existing(svc)
            .profile(&istio, true)
            .build()
            .unwrap();
        let annotations = svc.spec.template.metadata.annotations.unwrap();
        assert!(!annotations.contains_key("sidecar.istio.io/inject"));
        assert_eq!(annotations["keep"], "me");
    }
}
