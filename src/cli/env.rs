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

//! Per-invocation state handed to every command

use super::commands::GlobalArgs;
use super::display::PrintContext;
use super::flags::NamespaceFlags;
use crate::domain::config::UserConfig;
use crate::domain::reference::PrefixTable;
use crate::infrastructure::constants::DEFAULT_WAIT_TIMEOUT_SECONDS;
use crate::infrastructure::kubernetes::{ClusterApi, KubeParams, TypedApi};
use crate::shared::error::Result;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;

/// Connection parameters, user configuration and the lazily opened cluster
/// connection. Nothing here outlives one command.
pub struct CommandEnv {
    params: KubeParams,
    pub config: UserConfig,
    pub prefixes: PrefixTable,
    pub color: bool,
    /// No update retry starts after this instant.
    deadline: Instant,
    cluster: OnceCell<Arc<dyn ClusterApi>>,
}

fn default_deadline() -> Instant {
    Instant::now() + Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECONDS)
}

impl CommandEnv {
    pub fn from_args(global: &GlobalArgs) -> Result<Self> {
        let config = UserConfig::load(global.config.as_deref())?;
        let params = KubeParams {
            kubeconfig: global.kubeconfig.clone(),
            context: global.context.clone(),
            cluster: global.cluster.clone(),
            as_user: global.as_user.clone(),
            as_uid: global.as_uid.clone(),
            as_groups: global.as_groups.clone(),
        };
        Ok(Self {
            params,
            prefixes: config.prefix_table(),
            config,
            color: false,
            deadline: default_deadline(),
            cluster: OnceCell::new(),
        })
    }

    /// Environment bound to an already connected cluster.
    pub fn with_cluster(cluster: Arc<dyn ClusterApi>, config: UserConfig) -> Self {
        Self {
            params: KubeParams::default(),
            prefixes: config.prefix_table(),
            config,
            color: false,
            deadline: default_deadline(),
            cluster: OnceCell::new_with(Some(cluster)),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub async fn cluster(&self) -> Result<Arc<dyn ClusterApi>> {
        let cluster = self
            .cluster
            .get_or_try_init(|| self.params.connect())
            .await?;
        Ok(cluster.clone())
    }

    /// The `-n` value, else the namespace of the kubeconfig context.
    pub async fn namespace(&self, flags: &NamespaceFlags) -> Result<String> {
        match flags.namespace.as_deref().filter(|n| !n.is_empty()) {
            Some(ns) => Ok(ns.to_string()),
            None => Ok(self.cluster().await?.default_namespace().to_string()),
        }
    }

    pub async fn api<K>(&self, namespace: &str) -> Result<TypedApi<K>>
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        Ok(TypedApi::namespaced(self.cluster().await?, namespace))
    }

    pub fn print_context(&self, namespace: &str) -> PrintContext {
        let mut ctx = PrintContext::new(namespace, self.prefixes.clone());
        ctx.color = self.color;
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::fake::FakeCluster;

    #[tokio::test]
    async fn test_namespace_falls_back_to_context() {
        let env = CommandEnv::with_cluster(Arc::new(FakeCluster::new("team-a")), UserConfig::default());
        let ns = env.namespace(&NamespaceFlags::default()).await.unwrap();
        assert_eq!(ns, "team-a");

        let flags = NamespaceFlags {
            namespace: Some("other".to_string()),
        };
        assert_eq!(env.namespace(&flags).await.unwrap(), "other");
    }
}
