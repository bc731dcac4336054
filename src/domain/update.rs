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

//! Get-modify-put with retry on version conflicts

use crate::infrastructure::constants::{
    UPDATE_BACKOFF_FACTOR, UPDATE_BACKOFF_MAX_DELAY_MS, UPDATE_BACKOFF_MIN_DELAY_MS,
};
use crate::infrastructure::kubernetes::TypedApi;
use crate::shared::error::{KnError, Result};
use backon::{BackoffBuilder, ExponentialBuilder};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

fn backoff(max_attempts: usize) -> impl Iterator<Item = Duration> {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(UPDATE_BACKOFF_MIN_DELAY_MS))
        .with_max_delay(Duration::from_millis(UPDATE_BACKOFF_MAX_DELAY_MS))
        .with_factor(UPDATE_BACKOFF_FACTOR)
        .with_max_times(max_attempts)
        .with_jitter()
        .build()
}

/// Fetch `name`, apply `mutate` to the fresh copy and write it back.
///
/// A conflicting write is retried from the GET until `max_attempts` writes
/// were issued, or until `deadline` has passed. `mutate` receives a new copy
/// on every attempt and must give the same result each time.
pub async fn update_with_retry<K, F>(
    api: &TypedApi<K>,
    name: &str,
    max_attempts: usize,
    deadline: Option<Instant>,
    mut mutate: F,
) -> Result<K>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone + Send + Sync,
    F: FnMut(K) -> Result<K>,
{
    let max_attempts = max_attempts.max(1);
    let mut delays = backoff(max_attempts);
    let mut attempt = 0;
    let expired = || deadline.is_some_and(|d| Instant::now() >= d);

    loop {
        attempt += 1;
        let current = api.get(name).await?;
        if current.meta().deletion_timestamp.is_some() {
            return Err(KnError::MarkedForDeletion {
                kind: api.kind().to_lowercase(),
                name: name.to_string(),
            });
        }

        let updated = mutate(current)?;
        debug!(kind = api.kind(), name, attempt, "updating");
        match api.replace(&updated).await {
            Ok(obj) => return Ok(obj),
            Err(err) if err.is_conflict() && attempt < max_attempts => {
                if expired() {
                    warn!(kind = api.kind(), name, attempt, "deadline passed, giving up on conflict");
                    return Err(err);
                }
                let delay = delays
                    .next()
                    .unwrap_or(Duration::from_millis(UPDATE_BACKOFF_MAX_DELAY_MS));
                debug!(kind = api.kind(), name, attempt, ?delay, "conflict, retrying");
                tokio::time::sleep(delay).await;
                if expired() {
                    warn!(kind = api.kind(), name, attempt, "deadline passed during backoff");
                    return Err(err);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::constants::DEFAULT_MAX_UPDATE_ATTEMPTS;
    use crate::infrastructure::kubernetes::fake::{FakeCluster, Verb};
    use crate::infrastructure::kubernetes::resources::{Channel, ChannelSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use std::sync::Arc;

    fn setup(deleting: bool) -> (Arc<FakeCluster>, TypedApi<Channel>) {
        let fake = Arc::new(FakeCluster::default());
        let mut ch = Channel::new("pipe", ChannelSpec::default());
        ch.metadata.namespace = Some("default".to_string());
        if deleting {
            ch.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        }
        fake.insert(&ch).unwrap();
        let api = TypedApi::namespaced(fake.clone(), "default");
        (fake, api)
    }

    fn label(mut ch: Channel) -> Result<Channel> {
        ch.metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert("touched".to_string(), "yes".to_string());
        Ok(ch)
    }

    fn puts(fake: &FakeCluster) -> usize {
        fake.actions()
            .iter()
            .filter(|a| a.verb == Verb::Replace)
            .count()
    }

    #[tokio::test]
    async fn test_update_success() {
        let (fake, api) = setup(false);
        let updated = update_with_retry(&api, "pipe", DEFAULT_MAX_UPDATE_ATTEMPTS, None, label)
            .await
            .unwrap();
        assert_eq!(updated.metadata.labels.unwrap()["touched"], "yes");
        assert_eq!(puts(&fake), 1);
    }

    #[tokio::test]
    async fn test_retries_until_attempts_exhausted() {
        let (fake, api) = setup(false);
        fake.inject_conflicts(100);
        let err = update_with_retry(&api, "pipe", DEFAULT_MAX_UPDATE_ATTEMPTS, None, label)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(puts(&fake), DEFAULT_MAX_UPDATE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_conflicts() {
        let (fake, api) = setup(false);
        fake.inject_conflicts(2);
        update_with_retry(&api, "pipe", DEFAULT_MAX_UPDATE_ATTEMPTS, None, label)
            .await
            .unwrap();
        assert_eq!(puts(&fake), 3);
    }

    #[tokio::test]
    async fn test_marked_for_deletion_never_puts() {
        let (fake, api) = setup(true);
        let err = update_with_retry(&api, "pipe", DEFAULT_MAX_UPDATE_ATTEMPTS, None, label)
            .await
            .unwrap_err();
        assert!(matches!(err, KnError::MarkedForDeletion { .. }));
        assert_eq!(
            err.to_string(),
            "can't update channel 'pipe' because it has been marked for deletion"
        );
        assert_eq!(puts(&fake), 0);
    }

    #[tokio::test]
    async fn test_not_found_passes_through() {
        let (fake, api) = setup(false);
        let err = update_with_retry(&api, "missing", DEFAULT_MAX_UPDATE_ATTEMPTS, None, label)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(puts(&fake), 0);
    }

    #[tokio::test]
    async fn test_mutator_error_stops_before_put() {
        let (fake, api) = setup(false);
        let err = update_with_retry(&api, "pipe", DEFAULT_MAX_UPDATE_ATTEMPTS, None, |_| {
            Err(KnError::validation("nope"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(puts(&fake), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_stops_retrying() {
        let (fake, api) = setup(false);
        fake.inject_conflicts(100);
        let err = update_with_retry(
            &api,
            "pipe",
            DEFAULT_MAX_UPDATE_ATTEMPTS,
            Some(Instant::now()),
            label,
        )
        .await
        .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(puts(&fake), 1);
        assert!(fake.actions().iter().all(|a| a.verb != Verb::Delete));
    }

    #[tokio::test]
    async fn test_deadline_expiring_during_backoff_stops_retrying() {
        let (fake, api) = setup(false);
        fake.inject_conflicts(100);
        let deadline = Instant::now() + Duration::from_millis(2);
        let err = update_with_retry(&api, "pipe", DEFAULT_MAX_UPDATE_ATTEMPTS, Some(deadline), label)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(puts(&fake), 1);
        let gets = fake.actions().iter().filter(|a| a.verb == Verb::Get).count();
        assert_eq!(gets, 1);
    }
}
