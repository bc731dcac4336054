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

use crate::shared::error::{KnError, Result};
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::Client;
use tracing::debug;

/// Untyped access to the cluster. Every command goes through this seam so
/// that tests can swap in an in-memory cluster.
///
/// A `None` namespace addresses cluster-scoped objects for single-object
/// calls and all namespaces for `list`.
#[async_trait::async_trait]
pub trait ClusterApi: Send + Sync {
    /// Namespace of the current kubeconfig context.
    fn default_namespace(&self) -> &str;

    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>>;

    async fn create(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject>;

    async fn replace(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject>;

    async fn delete(&self, resource: &ApiResource, namespace: Option<&str>, name: &str)
        -> Result<()>;
}

/// Build an `ApiResource` from its group/version/kind and plural.
pub fn dynamic_resource(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
    let api_version = if group.is_empty() {
        version.to_string()
    } else {
        format!("{}/{}", group, version)
    };
    ApiResource {
        group: group.to_string(),
        version: version.to_string(),
        api_version,
        kind: kind.to_string(),
        plural: plural.to_string(),
    }
}

pub struct KubeClusterApi {
    client: Client,
    default_namespace: String,
}

impl KubeClusterApi {
    pub fn new(client: Client, default_namespace: String) -> Self {
        Self {
            client,
            default_namespace,
        }
    }

    pub fn get_client(&self) -> Client {
        self.client.clone()
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

fn object_name(obj: &DynamicObject) -> Result<&str> {
    obj.metadata
        .name
        .as_deref()
        .ok_or_else(|| KnError::validation("object name is required"))
}

#[async_trait::async_trait]
impl ClusterApi for KubeClusterApi {
    fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        debug!(verb = "GET", resource = %resource.plural, namespace = ?namespace, name, "cluster request");
        let result = self.api(resource, namespace).get(name).await;
        debug!(verb = "GET", resource = %resource.plural, ok = result.is_ok(), "cluster response");
        Ok(result?)
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        debug!(verb = "LIST", resource = %resource.plural, namespace = ?namespace, selector = ?label_selector, "cluster request");
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        let list = self.api(resource, namespace).list(&params).await?;
        debug!(verb = "LIST", resource = %resource.plural, count = list.items.len(), "cluster response");
        Ok(list.items)
    }

    async fn create(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        debug!(verb = "POST", resource = %resource.plural, namespace = ?namespace, name = ?obj.metadata.name, "cluster request");
        let pp = PostParams::default();
        let created = self.api(resource, namespace).create(&pp, obj).await?;
        Ok(created)
    }

    async fn replace(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let name = object_name(obj)?;
        debug!(
            verb = "PUT",
            resource = %resource.plural,
            namespace = ?namespace,
            name,
            resource_version = ?obj.metadata.resource_version,
            "cluster request"
        );
        let pp = PostParams::default();
        let replaced = self.api(resource, namespace).replace(name, &pp, obj).await?;
        Ok(replaced)
    }

    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        debug!(verb = "DELETE", resource = %resource.plural, namespace = ?namespace, name, "cluster request");
        self.api(resource, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_resource_core_group() {
        let res = dynamic_resource("", "v1", "Service", "services");
        assert_eq!(res.api_version, "v1");
        let res = dynamic_resource("serving.knative.dev", "v1", "Service", "services");
        assert_eq!(res.api_version, "serving.knative.dev/v1");
    }
}
