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

//! In-memory `ClusterApi` that records every call.
//!
//! Objects are keyed by (group, plural, namespace, name). Writes enforce
//! resourceVersion matching the way the API server does, and failures are
//! reported as `kube::Error::Api` so they pass through the same error mapping
//! as real responses.

use super::client::ClusterApi;
use super::resources::common::{Condition, CONDITION_READY, CONDITION_TRUE};
use crate::shared::error::{KnError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{ApiResource, DynamicObject};
use kube::error::ErrorResponse;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    List,
    Create,
    Replace,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Action {
    pub verb: Verb,
    pub resource: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub body: Option<DynamicObject>,
}

impl Action {
    pub fn is(&self, verb: Verb, resource: &str) -> bool {
        self.verb == verb && self.resource == resource
    }
}

type Key = (String, String, String, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<Key, DynamicObject>,
    actions: Vec<Action>,
    pending_conflicts: usize,
    forbidden_lists: BTreeSet<String>,
    ready_on_write: bool,
    next_uid: u64,
}

pub struct FakeCluster {
    default_namespace: String,
    state: Mutex<State>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new("default")
    }
}

fn key(resource: &ApiResource, namespace: Option<&str>, name: &str) -> Key {
    (
        resource.group.clone(),
        resource.plural.clone(),
        namespace.unwrap_or_default().to_string(),
        name.to_string(),
    )
}

fn qualified(resource: &ApiResource) -> String {
    if resource.group.is_empty() {
        resource.plural.clone()
    } else {
        format!("{}.{}", resource.plural, resource.group)
    }
}

fn api_error(code: u16, reason: &str, message: String) -> KnError {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
    .into()
}

fn not_found(resource: &ApiResource, name: &str) -> KnError {
    api_error(
        404,
        "NotFound",
        format!("{} \"{}\" not found", qualified(resource), name),
    )
}

fn conflict(resource: &ApiResource, name: &str) -> KnError {
    api_error(
        409,
        "Conflict",
        format!(
            "Operation cannot be fulfilled on {} \"{}\": the object has been modified; please apply your changes to the latest version and try again",
            qualified(resource),
            name
        ),
    )
}

fn matches_selector(obj: &DynamicObject, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    let labels = obj.metadata.labels.clone().unwrap_or_default();
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels.get(k).map(|l| l == v).unwrap_or(false),
            None => labels.contains_key(term),
        })
}

fn mark_ready(obj: &mut DynamicObject) {
    let conditions = serde_json::json!([Condition::new(CONDITION_READY, CONDITION_TRUE)]);
    if let Some(data) = obj.data.as_object_mut() {
        let status = data
            .entry("status")
            .or_insert_with(|| serde_json::json!({}));
        if let Some(status) = status.as_object_mut() {
            status.insert("conditions".to_string(), conditions);
        }
    }
}

impl FakeCluster {
    pub fn new(default_namespace: &str) -> Self {
        Self {
            default_namespace: default_namespace.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fail the next `count` replace calls with a version conflict.
    pub fn inject_conflicts(&self, count: usize) {
        self.lock().pending_conflicts = count;
    }

    /// Make list calls on `plural` answer 403.
    pub fn forbid_list(&self, plural: &str) {
        self.lock().forbidden_lists.insert(plural.to_string());
    }

    /// Set `Ready=True` on every created or replaced object.
    pub fn ready_on_write(&self, enabled: bool) {
        self.lock().ready_on_write = enabled;
    }

    /// Store an object directly, without recording an action.
    pub fn insert_dynamic(&self, resource: &ApiResource, mut obj: DynamicObject) {
        let mut state = self.lock();
        let name = obj.metadata.name.clone().unwrap_or_default();
        if obj.metadata.resource_version.is_none() {
            obj.metadata.resource_version = Some("1".to_string());
        }
        let namespace = obj.metadata.namespace.clone();
        state
            .objects
            .insert(key(resource, namespace.as_deref(), &name), obj);
    }

    pub fn insert<K>(&self, obj: &K) -> Result<()>
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let resource = ApiResource::erase::<K>(&());
        let dynamic: DynamicObject = serde_json::from_value(serde_json::to_value(obj)?)?;
        self.insert_dynamic(&resource, dynamic);
        Ok(())
    }

    pub fn stored_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<DynamicObject> {
        self.lock()
            .objects
            .get(&key(resource, namespace, name))
            .cloned()
    }

    pub fn stored<K>(&self, namespace: &str, name: &str) -> Option<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let resource = ApiResource::erase::<K>(&());
        let obj = self.stored_dynamic(&resource, Some(namespace), name)?;
        serde_json::to_value(obj)
            .ok()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn clear_actions(&self) {
        self.lock().actions.clear();
    }

    fn record(
        state: &mut State,
        verb: Verb,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: Option<&str>,
        body: Option<&DynamicObject>,
    ) {
        state.actions.push(Action {
            verb,
            resource: resource.plural.clone(),
            namespace: namespace.map(str::to_string),
            name: name.map(str::to_string),
            body: body.cloned(),
        });
    }
}

#[async_trait::async_trait]
impl ClusterApi for FakeCluster {
    fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        let mut state = self.lock();
        Self::record(&mut state, Verb::Get, resource, namespace, Some(name), None);
        state
            .objects
            .get(&key(resource, namespace, name))
            .cloned()
            .ok_or_else(|| not_found(resource, name))
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        let mut state = self.lock();
        Self::record(&mut state, Verb::List, resource, namespace, None, None);
        if state.forbidden_lists.contains(&resource.plural) {
            return Err(api_error(
                403,
                "Forbidden",
                format!(
                    "{} is forbidden: User \"fake\" cannot list resource \"{}\" in API group \"{}\"",
                    qualified(resource),
                    resource.plural,
                    resource.group
                ),
            ));
        }
        Ok(state
            .objects
            .iter()
            .filter(|((group, plural, ns, _), _)| {
                group == &resource.group
                    && plural == &resource.plural
                    && namespace.map(|n| n == ns).unwrap_or(true)
            })
            .map(|(_, obj)| obj)
            .filter(|obj| matches_selector(obj, label_selector))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let mut state = self.lock();
        let name = obj.metadata.name.clone().unwrap_or_default();
        Self::record(&mut state, Verb::Create, resource, namespace, Some(&name), Some(obj));
        let k = key(resource, namespace, &name);
        if state.objects.contains_key(&k) {
            return Err(api_error(
                409,
                "AlreadyExists",
                format!("{} \"{}\" already exists", qualified(resource), name),
            ));
        }
        state.next_uid += 1;
        let mut stored = obj.clone();
        stored.metadata.namespace = namespace.map(str::to_string);
        stored.metadata.resource_version = Some("1".to_string());
        stored.metadata.uid = Some(format!("fake-uid-{}", state.next_uid));
        stored.metadata.generation = Some(1);
        stored.metadata.creation_timestamp = Some(Time(chrono::Utc::now()));
        if state.ready_on_write {
            mark_ready(&mut stored);
        }
        state.objects.insert(k, stored.clone());
        Ok(stored)
    }

    async fn replace(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let mut state = self.lock();
        let name = obj.metadata.name.clone().unwrap_or_default();
        Self::record(&mut state, Verb::Replace, resource, namespace, Some(&name), Some(obj));
        let k = key(resource, namespace, &name);
        let current_version = match state.objects.get(&k) {
            Some(current) => current.metadata.resource_version.clone(),
            None => return Err(not_found(resource, &name)),
        };
        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(conflict(resource, &name));
        }
        if obj.metadata.resource_version.is_some()
            && obj.metadata.resource_version != current_version
        {
            return Err(conflict(resource, &name));
        }
        let next_version = current_version
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let mut stored = obj.clone();
        stored.metadata.resource_version = Some(next_version.to_string());
        stored.metadata.generation = Some(stored.metadata.generation.unwrap_or(1) + 1);
        if state.ready_on_write {
            mark_ready(&mut stored);
        }
        state.objects.insert(k, stored.clone());
        Ok(stored)
    }

    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        let mut state = self.lock();
        Self::record(&mut state, Verb::Delete, resource, namespace, Some(name), None);
        state
            .objects
            .remove(&key(resource, namespace, name))
            .map(|_| ())
            .ok_or_else(|| not_found(resource, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::resources::{Channel, ChannelSpec};

    fn channel(name: &str, ns: &str) -> Channel {
        let mut ch = Channel::new(name, ChannelSpec::default());
        ch.metadata.namespace = Some(ns.to_string());
        ch
    }

    #[tokio::test]
    async fn test_stale_resource_version_conflicts() {
        let fake = FakeCluster::default();
        fake.insert(&channel("pipe", "default")).unwrap();
        let resource = ApiResource::erase::<Channel>(&());

        let mut obj = fake.get(&resource, Some("default"), "pipe").await.unwrap();
        let updated = fake.replace(&resource, Some("default"), &obj).await.unwrap();
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));

        obj.metadata.resource_version = Some("1".to_string());
        let err = fake.replace(&resource, Some("default"), &obj).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_not_found_message_names_resource() {
        let fake = FakeCluster::default();
        let resource = ApiResource::erase::<Channel>(&());
        let err = fake.delete(&resource, Some("test"), "pipe").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "channels.messaging.knative.dev \"pipe\" not found"
        );
    }

    #[tokio::test]
    async fn test_list_filters_namespace_and_labels() {
        let fake = FakeCluster::default();
        let mut labelled = channel("a", "one");
        labelled.metadata.labels = Some([("tier".to_string(), "x".to_string())].into());
        fake.insert(&labelled).unwrap();
        fake.insert(&channel("b", "two")).unwrap();
        let resource = ApiResource::erase::<Channel>(&());

        assert_eq!(fake.list(&resource, None, None).await.unwrap().len(), 2);
        assert_eq!(fake.list(&resource, Some("two"), None).await.unwrap().len(), 1);
        assert_eq!(
            fake.list(&resource, None, Some("tier=x")).await.unwrap().len(),
            1
        );

        fake.forbid_list("channels");
        assert!(fake.list(&resource, None, None).await.unwrap_err().is_forbidden());
    }
}
