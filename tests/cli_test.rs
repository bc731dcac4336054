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

//! End-to-end command tests against the in-memory cluster.

use clap::Parser;
use kn_kube::cli::{self, CliArgs, CommandEnv};
use kn_kube::domain::config::UserConfig;
use kn_kube::infrastructure::kubernetes::fake::{FakeCluster, Verb};
use kn_kube::infrastructure::kubernetes::resources::{
    ApiServerResource, ApiServerSource, ApiServerSourceSpec, CloudEventOverrides, Destination,
    KReference, PingSource, Service, ServiceSpec, SourceSpec, Trigger, TriggerSpec,
};
use kn_kube::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

struct Harness {
    cluster: Arc<FakeCluster>,
    env: CommandEnv,
}

impl Harness {
    fn new() -> Self {
        let cluster = Arc::new(FakeCluster::new("default"));
        let env = CommandEnv::with_cluster(cluster.clone(), UserConfig::default());
        Self { cluster, env }
    }

    async fn run(&self, line: &[&str]) -> Result<String> {
        let args = CliArgs::try_parse_from(std::iter::once("kn").chain(line.iter().copied()))
            .expect("command line parses");
        let mut out = Vec::new();
        cli::run(args, &self.env, &mut out).await?;
        Ok(String::from_utf8(out).expect("utf-8 output"))
    }

    fn trigger(&self, name: &str) {
        let mut trigger = Trigger::new(
            name,
            TriggerSpec {
                broker: "default".to_string(),
                ..Default::default()
            },
        );
        trigger.metadata.namespace = Some("default".to_string());
        self.cluster.insert(&trigger).unwrap();
    }

    fn service(&self, name: &str, namespace: &str) {
        let mut svc = Service::new(name, ServiceSpec::default());
        svc.metadata.namespace = Some(namespace.to_string());
        self.cluster.insert(&svc).unwrap();
    }
}

fn ksvc_ref(name: &str, namespace: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": "Service",
        "apiVersion": "serving.knative.dev/v1",
        "name": name,
        "namespace": namespace,
    })
}

#[tokio::test]
async fn test_channel_create_posts_template() {
    let h = Harness::new();
    let out = h
        .run(&[
            "channel",
            "create",
            "pipe",
            "--type",
            "messaging.knative.dev:v1:InMemoryChannel",
            "-n",
            "test",
        ])
        .await
        .unwrap();

    assert!(out.contains("created"));
    assert!(out.contains("pipe"));
    assert!(out.contains("test"));

    let actions = h.cluster.actions();
    let create = actions
        .iter()
        .find(|a| a.is(Verb::Create, "channels"))
        .expect("channel created");
    assert_eq!(create.namespace.as_deref(), Some("test"));
    let body = create.body.as_ref().unwrap();
    assert_eq!(
        body.data["spec"]["channelTemplate"]["apiVersion"],
        "messaging.knative.dev/v1"
    );
    assert_eq!(body.data["spec"]["channelTemplate"]["kind"], "InMemoryChannel");
}

#[tokio::test]
async fn test_delete_absent_channel_fails() {
    let h = Harness::new();
    let err = h
        .run(&["channel", "delete", "pipe", "-n", "test"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert_ne!(err.exit_code(), 0);
}

#[tokio::test]
async fn test_ping_create_with_text_data_and_overrides() {
    let h = Harness::new();
    h.service("mysvc", "default");
    h.run(&[
        "source",
        "ping",
        "create",
        "myping",
        "--sink",
        "ksvc:mysvc",
        "--schedule",
        "* * * * */2",
        "--data",
        "maxwell",
        "--ce-override",
        "bla=blub",
        "--ce-override",
        "foo=bar",
    ])
    .await
    .unwrap();

    let ping: PingSource = h.cluster.stored("default", "myping").unwrap();
    assert_eq!(ping.spec.schedule, "* * * * */2");
    assert_eq!(ping.spec.data, "maxwell");
    assert!(ping.spec.data_base64.is_empty());

    let sink = serde_json::to_value(&ping.spec.source.sink).unwrap();
    assert_eq!(sink["ref"], ksvc_ref("mysvc", "default"));

    let extensions = ping.spec.source.ce_overrides.unwrap().extensions;
    assert_eq!(
        extensions,
        BTreeMap::from([
            ("bla".to_string(), "blub".to_string()),
            ("foo".to_string(), "bar".to_string()),
        ])
    );
}

#[tokio::test]
async fn test_ping_create_detects_base64_data() {
    let h = Harness::new();
    h.service("mysvc", "default");
    h.run(&[
        "source",
        "ping",
        "create",
        "myping",
        "--sink",
        "ksvc:mysvc",
        "--schedule",
        "* * * * */2",
        "--data",
        "ZGF0YQ==",
    ])
    .await
    .unwrap();

    let ping: PingSource = h.cluster.stored("default", "myping").unwrap();
    assert_eq!(ping.spec.data_base64, "ZGF0YQ==");
    assert!(ping.spec.data.is_empty());
}

#[tokio::test]
async fn test_ping_create_with_missing_sink_service() {
    let h = Harness::new();
    let err = h
        .run(&[
            "source", "ping", "create", "myping", "--sink", "ksvc:absent", "--schedule", "* * * * *",
        ])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("absent"));
    assert!(h.cluster.actions().iter().all(|a| a.verb != Verb::Create));
}

#[tokio::test]
async fn test_apiserver_update_replaces_fields() {
    let h = Harness::new();
    h.service("svc2", "default");
    let mut source = ApiServerSource::new(
        "src",
        ApiServerSourceSpec {
            resources: vec![ApiServerResource {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                selector: None,
            }],
            mode: "Resource".to_string(),
            service_account_name: "sa1".to_string(),
            source: SourceSpec {
                sink: Destination::from_ref(KReference {
                    kind: "Service".to_string(),
                    namespace: Some("default".to_string()),
                    name: "svc1".to_string(),
                    api_version: "serving.knative.dev/v1".to_string(),
                }),
                ce_overrides: Some(CloudEventOverrides {
                    extensions: BTreeMap::from([
                        ("bla".to_string(), "blub".to_string()),
                        ("foo".to_string(), "bar".to_string()),
                    ]),
                }),
            },
        },
    );
    source.metadata.namespace = Some("default".to_string());
    h.cluster.insert(&source).unwrap();

    h.run(&[
        "source",
        "apiserver",
        "update",
        "src",
        "--service-account",
        "sa2",
        "--sink",
        "ksvc:svc2",
        "--ce-override",
        "bla-",
        "--ce-override",
        "foo=baz",
        "--mode",
        "Reference",
        "--resource",
        "Pod:v1",
    ])
    .await
    .unwrap();

    assert!(h
        .cluster
        .actions()
        .iter()
        .any(|a| a.is(Verb::Replace, "apiserversources")));
    let updated: ApiServerSource = h.cluster.stored("default", "src").unwrap();
    assert_eq!(updated.spec.service_account_name, "sa2");
    assert_eq!(updated.spec.mode, "Reference");
    assert_eq!(updated.spec.resources.len(), 1);
    assert_eq!(updated.spec.resources[0].kind, "Pod");
    assert_eq!(updated.spec.resources[0].api_version, "v1");
    let sink = serde_json::to_value(&updated.spec.source.sink).unwrap();
    assert_eq!(sink["ref"], ksvc_ref("svc2", "default"));
    assert_eq!(
        updated.spec.source.ce_overrides.unwrap().extensions,
        BTreeMap::from([("foo".to_string(), "baz".to_string())])
    );
}

#[tokio::test]
async fn test_trigger_broker_is_immutable() {
    let h = Harness::new();
    let mut trigger = Trigger::new(
        "t1",
        TriggerSpec {
            broker: "default".to_string(),
            ..Default::default()
        },
    );
    trigger.metadata.namespace = Some("default".to_string());
    h.cluster.insert(&trigger).unwrap();

    let err = h
        .run(&["trigger", "update", "t1", "--broker", "newbroker"])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot update trigger 't1' because broker is immutable"
    );

    let actions = h.cluster.actions();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].is(Verb::Get, "triggers"));
}

#[tokio::test]
async fn test_trigger_broker_change_skips_sink_lookup() {
    let h = Harness::new();
    h.trigger("t1");
    h.service("svc", "default");

    let err = h
        .run(&["trigger", "update", "t1", "--broker", "other", "--sink", "svc"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("broker is immutable"));

    let actions = h.cluster.actions();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].is(Verb::Get, "triggers"));
}

#[tokio::test]
async fn test_update_stops_retrying_after_command_deadline() {
    let Harness { cluster, env } = Harness::new();
    let h = Harness {
        cluster,
        env: env.with_deadline(Instant::now()),
    };
    h.trigger("t1");
    h.cluster.inject_conflicts(100);

    let err = h
        .run(&["trigger", "update", "t1", "--filter", "type=dev.example"])
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let replaces = h
        .cluster
        .actions()
        .iter()
        .filter(|a| a.is(Verb::Replace, "triggers"))
        .count();
    assert_eq!(replaces, 1);
}

#[tokio::test]
async fn test_service_delete_name_rules() {
    let h = Harness::new();
    let err = h.run(&["service", "delete"]).await.unwrap_err();
    assert!(err.is_usage());

    let err = h.run(&["service", "delete", "a", "--all"]).await.unwrap_err();
    assert!(err.is_usage());

    let out = h.run(&["service", "delete", "--all"]).await.unwrap();
    assert_eq!(out, "No services found.\n");
}

#[tokio::test]
async fn test_service_delete_all() {
    let h = Harness::new();
    h.service("one", "default");
    h.service("two", "default");
    h.service("elsewhere", "other");

    let out = h
        .run(&["service", "delete", "--all", "--no-wait"])
        .await
        .unwrap();
    assert!(out.contains("Service 'one' deleted in namespace 'default'."));
    assert!(out.contains("Service 'two' deleted in namespace 'default'."));
    assert!(h.cluster.stored::<Service>("other", "elsewhere").is_some());
    assert!(h.cluster.stored::<Service>("default", "one").is_none());
}

#[tokio::test]
async fn test_empty_list_message() {
    let h = Harness::new();
    let out = h.run(&["broker", "list"]).await.unwrap();
    assert_eq!(out, "No brokers found.\n");
}

#[tokio::test]
async fn test_completion_lists_matching_names() {
    let h = Harness::new();
    h.service("hello", "default");
    h.service("help", "default");
    h.service("world", "default");

    let out = h
        .run(&["__complete", "service", "describe", "he"])
        .await
        .unwrap();
    assert_eq!(out, "hello\nhelp\n");

    let out = h
        .run(&["__complete", "service", "describe", "hello", ""])
        .await
        .unwrap();
    assert!(out.is_empty());
}
