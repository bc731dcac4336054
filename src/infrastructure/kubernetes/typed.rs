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

use super::client::ClusterApi;
use crate::shared::error::Result;
use kube::api::{ApiResource, DynamicObject};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed view of one resource kind on top of [`ClusterApi`].
pub struct TypedApi<K> {
    cluster: Arc<dyn ClusterApi>,
    resource: ApiResource,
    namespace: Option<String>,
    _kind: PhantomData<K>,
}

impl<K> Clone for TypedApi<K> {
    fn clone(&self) -> Self {
        Self {
            cluster: self.cluster.clone(),
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            _kind: PhantomData,
        }
    }
}

pub fn to_dynamic<T: Serialize>(obj: &T) -> Result<DynamicObject> {
    Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
}

pub fn from_dynamic<T: DeserializeOwned>(obj: DynamicObject) -> Result<T> {
    Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
}

impl<K> TypedApi<K>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn namespaced(cluster: Arc<dyn ClusterApi>, namespace: &str) -> Self {
        Self {
            cluster,
            resource: ApiResource::erase::<K>(&()),
            namespace: Some(namespace.to_string()),
            _kind: PhantomData,
        }
    }

    /// Addresses every namespace; only meaningful for `list`.
    pub fn all(cluster: Arc<dyn ClusterApi>) -> Self {
        Self {
            cluster,
            resource: ApiResource::erase::<K>(&()),
            namespace: None,
            _kind: PhantomData,
        }
    }

    pub fn resource(&self) -> &ApiResource {
        &self.resource
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn kind(&self) -> &str {
        &self.resource.kind
    }

    pub async fn get(&self, name: &str) -> Result<K> {
        let obj = self
            .cluster
            .get(&self.resource, self.namespace(), name)
            .await?;
        from_dynamic(obj)
    }

    pub async fn list(&self) -> Result<Vec<K>> {
        self.list_selected(None).await
    }

    pub async fn list_with_labels(&self, selector: &str) -> Result<Vec<K>> {
        self.list_selected(Some(selector)).await
    }

    async fn list_selected(&self, selector: Option<&str>) -> Result<Vec<K>> {
        self.cluster
            .list(&self.resource, self.namespace(), selector)
            .await?
            .into_iter()
            .map(from_dynamic)
            .collect()
    }

    pub async fn create(&self, obj: &K) -> Result<K> {
        let created = self
            .cluster
            .create(&self.resource, self.namespace(), &to_dynamic(obj)?)
            .await?;
        from_dynamic(created)
    }

    pub async fn replace(&self, obj: &K) -> Result<K> {
        let replaced = self
            .cluster
            .replace(&self.resource, self.namespace(), &to_dynamic(obj)?)
            .await?;
        from_dynamic(replaced)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.cluster
            .delete(&self.resource, self.namespace(), name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::fake::FakeCluster;
    use crate::infrastructure::kubernetes::resources::{
        ChannelTemplateSpec, Channel, ChannelSpec,
    };

    #[tokio::test]
    async fn test_typed_create_and_get() {
        let fake = Arc::new(FakeCluster::default());
        let api: TypedApi<Channel> = TypedApi::namespaced(fake.clone(), "test");
        let spec = ChannelSpec {
            channel_template: Some(ChannelTemplateSpec::new(
                "messaging.knative.dev",
                "v1",
                "InMemoryChannel",
            )),
            ..Default::default()
        };
        api.create(&Channel::new("pipe", spec)).await.unwrap();

        let fetched = api.get("pipe").await.unwrap();
        assert_eq!(fetched.metadata.namespace.as_deref(), Some("test"));
        assert_eq!(
            fetched.spec.channel_template.unwrap().kind,
            "InMemoryChannel"
        );
        assert_eq!(api.kind(), "Channel");
    }
}
