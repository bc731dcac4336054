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

//! Polling for readiness and deletion

use crate::infrastructure::constants::{
    DEFAULT_ERROR_WINDOW_SECONDS, DEFAULT_WAIT_TIMEOUT_SECONDS, WAIT_POLL_INTERVAL_MS,
};
use crate::infrastructure::kubernetes::resources::{Condition, HasConditions};
use crate::infrastructure::kubernetes::TypedApi;
use crate::shared::error::{KnError, Result};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    /// How long `Ready=False` must hold before it counts as a failure.
    pub error_window: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECONDS),
            error_window: Duration::from_secs(DEFAULT_ERROR_WINDOW_SECONDS),
            poll_interval: Duration::from_millis(WAIT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitConfig {
    pub fn new(timeout_secs: u64, error_window_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            error_window: Duration::from_secs(error_window_secs),
            ..Default::default()
        }
    }
}

fn failure_reason(cond: &Condition) -> String {
    match (cond.reason.as_deref(), cond.message.as_deref()) {
        (Some(r), Some(m)) if !r.is_empty() && !m.is_empty() => format!("{}: {}", r, m),
        (Some(r), _) if !r.is_empty() => r.to_string(),
        (_, Some(m)) => m.to_string(),
        _ => "unknown reason".to_string(),
    }
}

/// Poll until `Ready` is `True`, stays `False` for the error window, or the
/// timeout expires.
pub async fn wait_for_ready<K>(api: &TypedApi<K>, name: &str, config: WaitConfig) -> Result<K>
where
    K: Resource<DynamicType = ()>
        + HasConditions
        + Serialize
        + DeserializeOwned
        + Clone
        + Send
        + Sync,
{
    let start = Instant::now();
    let mut false_since: Option<Instant> = None;

    loop {
        let obj = api.get(name).await?;
        let ready = obj.ready_condition().cloned();
        debug!(kind = api.kind(), name, ready = ?ready.as_ref().map(|c| &c.status), "polling readiness");

        match ready {
            Some(cond) if cond.is_true() => return Ok(obj),
            Some(cond) if cond.is_false() => {
                let since = *false_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= config.error_window {
                    return Err(KnError::NotReady {
                        kind: api.kind().to_string(),
                        name: name.to_string(),
                        reason: failure_reason(&cond),
                    });
                }
            }
            _ => false_since = None,
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(KnError::Timeout(format!(
                "{} '{}' not ready after {} seconds",
                api.kind(),
                name,
                config.timeout.as_secs()
            )));
        }
        let remaining = config.timeout - elapsed;
        tokio::time::sleep(config.poll_interval.min(remaining)).await;
    }
}

/// Poll until the object is gone.
pub async fn wait_for_deletion<K>(api: &TypedApi<K>, name: &str, timeout: Duration) -> Result<()>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone + Send + Sync,
{
    let start = Instant::now();
    loop {
        match api.get(name).await {
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
            Ok(_) => debug!(kind = api.kind(), name, "waiting for deletion"),
        }
        if start.elapsed() >= timeout {
            return Err(KnError::Timeout(format!(
                "{} '{}' not deleted after {} seconds",
                api.kind(),
                name,
                timeout.as_secs()
            )));
        }
        tokio::time::sleep(Duration::from_millis(WAIT_POLL_INTERVAL_MS)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::fake::FakeCluster;
    use crate::infrastructure::kubernetes::resources::serving::ServiceStatus;
    use crate::infrastructure::kubernetes::resources::{Service, ServiceSpec, Status};
    use std::sync::Arc;

    fn service(ready: Option<Condition>) -> Service {
        let mut svc = Service::new("hello", ServiceSpec::default());
        svc.metadata.namespace = Some("default".to_string());
        svc.status = Some(ServiceStatus {
            base: Status {
                conditions: ready.into_iter().collect(),
                ..Default::default()
            },
            ..Default::default()
        });
        svc
    }

    fn service_with(ready: Option<Condition>) -> (Arc<FakeCluster>, TypedApi<Service>) {
        let fake = Arc::new(FakeCluster::default());
        fake.insert(&service(ready)).unwrap();
        let api = TypedApi::namespaced(fake.clone(), "default");
        (fake, api)
    }

    fn fast(timeout_ms: u64, window_ms: u64) -> WaitConfig {
        WaitConfig {
            timeout: Duration::from_millis(timeout_ms),
            error_window: Duration::from_millis(window_ms),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_ready_returns_immediately() {
        let (_fake, api) = service_with(Some(Condition::new("Ready", "True")));
        assert!(wait_for_ready(&api, "hello", fast(1000, 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_false_after_window_fails() {
        let cond = Condition::new("Ready", "False").with_reason("RevisionFailed", "image pull");
        let (_fake, api) = service_with(Some(cond));
        let err = wait_for_ready(&api, "hello", fast(1000, 20)).await.unwrap_err();
        match err {
            KnError::NotReady { reason, .. } => assert_eq!(reason, "RevisionFailed: image pull"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_false_flicker_restarts_error_window() {
        let failing = || Condition::new("Ready", "False").with_reason("RevisionFailed", "crash");
        let (fake, api) = service_with(Some(failing()));

        let flipper = fake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            flipper
                .insert(&service(Some(Condition::new("Ready", "Unknown"))))
                .unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            flipper.insert(&service(Some(failing()))).unwrap();
        });

        let start = Instant::now();
        let err = wait_for_ready(&api, "hello", fast(2000, 60)).await.unwrap_err();
        assert!(matches!(err, KnError::NotReady { .. }));
        // a window counted from the first False would have expired at 60ms
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_unknown_times_out() {
        let (_fake, api) = service_with(Some(Condition::new("Ready", "Unknown")));
        let err = wait_for_ready(&api, "hello", fast(30, 0)).await.unwrap_err();
        assert!(matches!(err, KnError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_deletion_of_missing_object_completes() {
        let (_fake, api) = service_with(None);
        wait_for_deletion(&api, "other", Duration::from_millis(10))
            .await
            .unwrap();
    }
}
