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

//! Sink parsing, resolution against the cluster, and reverse rendering

use super::parser::{parse_ref, ParsedRef};
use super::prefix::{Gvr, PrefixTable};
use crate::infrastructure::constants::DEFAULT_SINK_PREFIX;
use crate::infrastructure::kubernetes::resources::{Destination, KReference};
use crate::infrastructure::kubernetes::ClusterApi;
use crate::shared::error::{KnError, Result};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Url(String),
    KubeRef {
        gvr: Gvr,
        name: String,
        namespace: String,
    },
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Url(url) => write!(f, "{}", url),
            SinkTarget::KubeRef {
                gvr,
                name,
                namespace,
            } => write!(f, "{}:{}:{}", gvr, name, namespace),
        }
    }
}

/// Turn a sink flag value into a target. No cluster call is made.
pub fn parse_sink(sink: &str, current_namespace: &str, table: &PrefixTable) -> Result<SinkTarget> {
    parse_with_default(sink, DEFAULT_SINK_PREFIX, current_namespace, table)
}

pub fn parse_with_default(
    sink: &str,
    default_prefix: &str,
    current_namespace: &str,
    table: &PrefixTable,
) -> Result<SinkTarget> {
    if sink.is_empty() {
        return Err(KnError::SinkRequired);
    }
    match parse_ref(sink, default_prefix) {
        ParsedRef::Url(raw) => {
            url::Url::parse(&raw).map_err(|e| KnError::sink_invalid(sink, e.into()))?;
            Ok(SinkTarget::Url(raw))
        }
        ParsedRef::Named(parsed) => {
            if parsed.name.is_empty() {
                return Err(KnError::sink_invalid(
                    sink,
                    KnError::validation("a name is required"),
                ));
            }
            let gvr = table.lookup(&parsed.prefix).ok_or_else(|| {
                KnError::sink_invalid(
                    sink,
                    KnError::validation(format!("unknown sink prefix '{}'", parsed.prefix)),
                )
            })?;
            let namespace = if parsed.namespace.is_empty() {
                current_namespace.to_string()
            } else {
                parsed.namespace
            };
            Ok(SinkTarget::KubeRef {
                gvr,
                name: parsed.name,
                namespace,
            })
        }
    }
}

/// Verify a target exists and build a destination from the server's view of it.
pub async fn resolve_sink(cluster: &dyn ClusterApi, target: &SinkTarget) -> Result<Destination> {
    match target {
        SinkTarget::Url(url) => Ok(Destination::from_uri(url.clone())),
        SinkTarget::KubeRef {
            gvr,
            name,
            namespace,
        } => {
            debug!(gvr = %gvr, name = %name, namespace = %namespace, "resolving sink");
            let obj = cluster
                .get(&gvr.api_resource(), Some(namespace), name)
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        KnError::sink_invalid(target.to_string(), e)
                    } else {
                        e
                    }
                })?;
            let types = obj.types.unwrap_or_default();
            Ok(Destination::from_ref(KReference {
                kind: types.kind,
                namespace: Some(namespace.clone()),
                name: name.clone(),
                api_version: types.api_version,
            }))
        }
    }
}

/// Parse and resolve in one step; empty input yields `None`.
pub async fn resolve_optional(
    cluster: &dyn ClusterApi,
    sink: Option<&str>,
    current_namespace: &str,
    table: &PrefixTable,
) -> Result<Option<Destination>> {
    match sink {
        Some(raw) => {
            let target = parse_sink(raw, current_namespace, table)?;
            Ok(Some(resolve_sink(cluster, &target).await?))
        }
        None => Ok(None),
    }
}

/// Render a reference as `prefix:name[:namespace]`.
pub fn ref_as_text(gvr: &Gvr, name: &str, namespace: &str, current_namespace: &str, table: &PrefixTable) -> String {
    let prefix = table
        .alias_for(gvr)
        .map(str::to_string)
        .unwrap_or_else(|| gvr.to_string());
    if namespace.is_empty() || namespace == current_namespace {
        format!("{}:{}", prefix, name)
    } else {
        format!("{}:{}:{}", prefix, name, namespace)
    }
}

/// Reverse of parse/resolve used in list and describe output.
pub fn sink_to_text(dest: &Destination, current_namespace: &str, table: &PrefixTable) -> String {
    match (&dest.reference, &dest.uri) {
        (Some(r), _) => {
            let gvr = Gvr::from_api_version_kind(&r.api_version, &r.kind);
            ref_as_text(
                &gvr,
                &r.name,
                r.namespace.as_deref().unwrap_or_default(),
                current_namespace,
                table,
            )
        }
        (None, Some(uri)) => uri.clone(),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::fake::FakeCluster;
    use crate::infrastructure::kubernetes::resources::{Service, ServiceSpec};

    #[test]
    fn test_empty_sink_required() {
        let table = PrefixTable::with_defaults();
        assert!(matches!(
            parse_sink("", "default", &table),
            Err(KnError::SinkRequired)
        ));
    }

    #[test]
    fn test_unknown_prefix_invalid() {
        let table = PrefixTable::with_defaults();
        let err = parse_sink("bogus:name", "default", &table).unwrap_err();
        assert!(matches!(err, KnError::SinkInvalid { .. }));
    }

    #[test]
    fn test_bad_url_invalid() {
        let table = PrefixTable::with_defaults();
        let err = parse_sink("http://[::1", "default", &table).unwrap_err();
        assert!(matches!(err, KnError::SinkInvalid { .. }));
    }

    #[test]
    fn test_reference_round_trip() {
        let table = PrefixTable::with_defaults();
        for entry in table.entries() {
            for namespace in ["", "default", "other"] {
                let text = ref_as_text(&entry.gvr, "foo", namespace, "default", &table);
                let target = parse_sink(&text, "default", &table).unwrap();
                let expected_ns = if namespace.is_empty() { "default" } else { namespace };
                assert_eq!(
                    target,
                    SinkTarget::KubeRef {
                        gvr: entry.gvr.clone(),
                        name: "foo".to_string(),
                        namespace: expected_ns.to_string(),
                    }
                );
            }
        }
    }

    #[test]
    fn test_unregistered_gvr_round_trips_through_dotted_form() {
        let table = PrefixTable::with_defaults();
        let gvr = Gvr::new("sources.knative.dev", "v1", "pingsources");
        let text = ref_as_text(&gvr, "p", "ns1", "default", &table);
        assert_eq!(text, "sources.knative.dev/v1/pingsources:p:ns1");
        let target = parse_sink(&text, "default", &table).unwrap();
        assert_eq!(
            target,
            SinkTarget::KubeRef {
                gvr,
                name: "p".to_string(),
                namespace: "ns1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_uses_server_kind() {
        let fake = FakeCluster::default();
        let mut svc = Service::new("mysvc", ServiceSpec::default());
        svc.metadata.namespace = Some("default".to_string());
        fake.insert(&svc).unwrap();

        let table = PrefixTable::with_defaults();
        let target = parse_sink("ksvc:mysvc", "default", &table).unwrap();
        let dest = resolve_sink(&fake, &target).await.unwrap();
        let reference = dest.reference.unwrap();
        assert_eq!(reference.kind, "Service");
        assert_eq!(reference.api_version, "serving.knative.dev/v1");
        assert_eq!(reference.namespace.as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn test_resolve_missing_wraps_not_found() {
        let fake = FakeCluster::default();
        let table = PrefixTable::with_defaults();
        let target = parse_sink("mysvc", "default", &table).unwrap();
        let err = resolve_sink(&fake, &target).await.unwrap_err();
        assert!(matches!(err, KnError::SinkInvalid { .. }));
        assert!(err
            .to_string()
            .contains("services.serving.knative.dev \"mysvc\" not found"));
    }

    #[test]
    fn test_sink_to_text_prefers_canonical_alias() {
        let table = PrefixTable::with_defaults();
        let dest = Destination::from_ref(KReference {
            kind: "Service".to_string(),
            namespace: Some("default".to_string()),
            name: "mysvc".to_string(),
            api_version: "serving.knative.dev/v1".to_string(),
        });
        assert_eq!(sink_to_text(&dest, "default", &table), "ksvc:mysvc");
        assert_eq!(sink_to_text(&dest, "other", &table), "ksvc:mysvc:default");
        assert_eq!(
            sink_to_text(&Destination::from_uri("http://x.y"), "default", &table),
            "http://x.y"
        );
    }
}
