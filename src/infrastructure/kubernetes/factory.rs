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

//! Client construction from kubeconfig parameters

use super::client::{ClusterApi, KubeClusterApi};
use super::warnings::WarningDeduplicator;
use crate::shared::error::{KnError, Result};
use http::Response;
use kube::client::{ClientBuilder, DynBody};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use std::path::Path;
use std::sync::Arc;
use tower::util::MapResponseLayer;
use tracing::{debug, info};

#[cfg(windows)]
const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: char = ':';

/// Connection parameters taken from the global flags.
#[derive(Debug, Clone, Default)]
pub struct KubeParams {
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub cluster: Option<String>,
    pub as_user: Option<String>,
    pub as_uid: Option<String>,
    pub as_groups: Vec<String>,
}

impl KubeParams {
    fn validate_identity(&self) -> Result<()> {
        let has_user = self.as_user.as_deref().is_some_and(|u| !u.is_empty());
        if !has_user && (!self.as_groups.is_empty() || self.as_uid.is_some()) {
            return Err(KnError::Config(
                "requesting uid or groups without impersonating a user".to_string(),
            ));
        }
        if self.as_uid.is_some() {
            return Err(KnError::Config(
                "impersonating a uid is not supported by this client".to_string(),
            ));
        }
        Ok(())
    }

    fn options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: None,
        }
    }

    /// Resolve a `kube::Config` following the kubeconfig loading rules.
    pub async fn build_config(&self) -> Result<Config> {
        self.validate_identity()?;

        let mut config = match self.kubeconfig.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => self.config_from_path(path).await?,
            None => self.config_from_defaults().await?,
        };

        if let Some(user) = self.as_user.as_ref().filter(|u| !u.is_empty()) {
            debug!(user = %user, groups = ?self.as_groups, "impersonating");
            config.auth_info.impersonate = Some(user.clone());
            if !self.as_groups.is_empty() {
                config.auth_info.impersonate_groups = Some(self.as_groups.clone());
            }
        }
        Ok(config)
    }

    async fn config_from_path(&self, path: &str) -> Result<Config> {
        if !Path::new(path).exists() {
            if path.contains(PATH_LIST_SEPARATOR) {
                return Err(KnError::MultipleConfigsNotSupported(path.to_string()));
            }
            return Err(KnError::ConfigFileNotFound(path.to_string()));
        }
        let kubeconfig = Kubeconfig::read_from(path)
            .map_err(|e| KnError::Config(format!("failed to load kubeconfig '{}': {}", path, e)))?;
        Config::from_custom_kubeconfig(kubeconfig, &self.options())
            .await
            .map_err(|e| KnError::Config(e.to_string()))
    }

    async fn config_from_defaults(&self) -> Result<Config> {
        match Kubeconfig::read() {
            Ok(kubeconfig) => Config::from_custom_kubeconfig(kubeconfig, &self.options())
                .await
                .map_err(|e| KnError::Config(e.to_string())),
            Err(err) => {
                debug!(error = %err, "no kubeconfig found, trying in-cluster configuration");
                Config::incluster().map_err(|_| KnError::NoKubeconfig)
            }
        }
    }

    /// Build the cluster seam bound to the context's default namespace.
    pub async fn connect(&self) -> Result<Arc<dyn ClusterApi>> {
        let config = self.build_config().await?;
        let namespace = config.default_namespace.clone();
        info!(cluster_url = %config.cluster_url, namespace = %namespace, "connecting to cluster");
        let warnings = WarningDeduplicator::default();
        let client = ClientBuilder::try_from(config)?
            .with_layer(&MapResponseLayer::new(
                move |response: Response<Box<DynBody>>| warnings.inspect(response),
            ))
            .build();
        Ok(Arc::new(KubeClusterApi::new(client, namespace)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: dev
  cluster:
    server: https://127.0.0.1:6443
contexts:
- name: dev
  context:
    cluster: dev
    user: dev
    namespace: team-a
current-context: dev
users:
- name: dev
  user:
    token: abc
"#;

    fn kubeconfig_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(KUBECONFIG.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_missing_single_file() {
        let params = KubeParams {
            kubeconfig: Some("/nonexistent/kubeconfig".to_string()),
            ..Default::default()
        };
        let err = params.build_config().await.unwrap_err();
        assert!(matches!(err, KnError::ConfigFileNotFound(_)));
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_missing_path_list() {
        let params = KubeParams {
            kubeconfig: Some("/nonexistent/a:/nonexistent/b".to_string()),
            ..Default::default()
        };
        let err = params.build_config().await.unwrap_err();
        assert!(matches!(err, KnError::MultipleConfigsNotSupported(_)));
    }

    #[tokio::test]
    async fn test_existing_file_is_used_with_impersonation() {
        let file = kubeconfig_file();
        let params = KubeParams {
            kubeconfig: Some(file.path().to_string_lossy().to_string()),
            as_user: Some("alice".to_string()),
            as_groups: vec!["devs".to_string()],
            ..Default::default()
        };
        let config = params.build_config().await.unwrap();
        assert_eq!(config.default_namespace, "team-a");
        assert_eq!(config.auth_info.impersonate.as_deref(), Some("alice"));
        assert_eq!(
            config.auth_info.impersonate_groups,
            Some(vec!["devs".to_string()])
        );
    }

    #[tokio::test]
    async fn test_groups_without_user_rejected() {
        let params = KubeParams {
            as_groups: vec!["devs".to_string()],
            ..Default::default()
        };
        let err = params.build_config().await.unwrap_err();
        assert!(matches!(err, KnError::Config(_)));
    }
}
