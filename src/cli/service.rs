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

//! `kn service`: Knative Service lifecycle, including readiness waiting

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use super::route::traffic_text;
use crate::domain::builder::{resource_requirements, MapUpdate, ServiceBuilder};
use crate::domain::config::{Profile, UserConfig};
use crate::domain::{wait_for_deletion, wait_for_ready, WaitConfig};
use crate::infrastructure::constants::{
    ANNOTATION_MAX_SCALE, ANNOTATION_MIN_SCALE, DEFAULT_ERROR_WINDOW_SECONDS,
    DEFAULT_WAIT_TIMEOUT_SECONDS,
};
use crate::infrastructure::kubernetes::resources::Service;
use crate::infrastructure::kubernetes::TypedApi;
use crate::shared::error::{KnError, Result};
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

#[derive(Args, Debug)]
pub struct ServiceCommand {
    #[command(subcommand)]
    pub action: ServiceAction,
}

#[derive(Subcommand, Debug)]
pub enum ServiceAction {
    /// Create a service
    Create(ServiceCreate),
    /// Update a service, creating a new revision
    Update(ServiceUpdate),
    /// Delete services by name, or all of them
    Delete(ServiceDelete),
    /// List services
    #[command(visible_alias = "ls")]
    List(ServiceList),
    /// Show details of a service
    Describe(ServiceDescribe),
    /// Wait for a service to become ready
    Wait(ServiceWait),
}

/// Flags shaping the revision template, shared by create and update.
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceFlags {
    /// Container image
    #[arg(long)]
    pub image: Option<String>,

    /// Environment variable NAME=VALUE, or NAME- to remove
    #[arg(long = "env", short = 'e', value_name = "NAME=VALUE")]
    pub env: Vec<String>,

    /// Container port
    #[arg(long, short = 'p')]
    pub port: Option<i32>,

    /// Label KEY=VALUE for service and revision, or KEY- to remove
    #[arg(long = "label", short = 'l', value_name = "KEY=VALUE")]
    pub labels: Vec<String>,

    /// Annotation KEY=VALUE for service and revision, or KEY- to remove
    #[arg(long = "annotation", short = 'a', value_name = "KEY=VALUE")]
    pub annotations: Vec<String>,

    /// Minimum number of replicas
    #[arg(long)]
    pub scale_min: Option<i32>,

    /// Maximum number of replicas
    #[arg(long)]
    pub scale_max: Option<i32>,

    /// Hard limit of concurrent requests per replica
    #[arg(long)]
    pub concurrency_limit: Option<i64>,

    #[arg(long)]
    pub service_account: Option<String>,

    /// Name of the new revision, prefixed with the service name
    #[arg(long)]
    pub revision_name: Option<String>,

    /// Apply a named profile, or NAME- to remove it
    #[arg(long)]
    pub profile: Option<String>,

    /// Resource requests, e.g. cpu=100m,memory=64Mi
    #[arg(long)]
    pub request: Option<String>,

    /// Resource limits, e.g. cpu=500m,memory=128Mi
    #[arg(long)]
    pub limit: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct WaitFlags {
    /// Return right after the request is accepted
    #[arg(long)]
    pub no_wait: bool,

    /// Seconds to wait for readiness
    #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_SECONDS)]
    pub wait_timeout: u64,

    /// Seconds a failing Ready condition must persist before giving up
    #[arg(long, default_value_t = DEFAULT_ERROR_WINDOW_SECONDS)]
    pub wait_window: u64,
}

impl WaitFlags {
    fn config(&self) -> WaitConfig {
        WaitConfig::new(self.wait_timeout, self.wait_window)
    }
}

#[derive(Parser, Debug)]
pub struct ServiceCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: ServiceFlags,

    #[command(flatten)]
    pub wait: WaitFlags,
}

#[derive(Parser, Debug)]
pub struct ServiceUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: ServiceFlags,

    #[command(flatten)]
    pub wait: WaitFlags,
}

#[derive(Parser, Debug)]
pub struct ServiceDelete {
    pub names: Vec<String>,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Delete every service in the namespace
    #[arg(long)]
    pub all: bool,

    /// Return without waiting for the services to disappear
    #[arg(long)]
    pub no_wait: bool,

    #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_SECONDS)]
    pub wait_timeout: u64,
}

#[derive(Parser, Debug)]
pub struct ServiceList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct ServiceDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

#[derive(Parser, Debug)]
pub struct ServiceWait {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_SECONDS)]
    pub wait_timeout: u64,

    #[arg(long, default_value_t = DEFAULT_ERROR_WINDOW_SECONDS)]
    pub wait_window: u64,
}

/// Flag values after parsing, applied identically on every update retry.
#[derive(Debug, Default)]
struct ServiceInput {
    image: Option<String>,
    env: MapUpdate,
    port: Option<i32>,
    labels: MapUpdate,
    annotations: MapUpdate,
    scale_min: Option<i32>,
    scale_max: Option<i32>,
    concurrency_limit: Option<i64>,
    service_account: Option<String>,
    revision_name: Option<String>,
    profile: Option<(Profile, bool)>,
    requests: BTreeMap<String, String>,
    limits: BTreeMap<String, String>,
}

fn lookup_profile(config: &UserConfig, raw: &str) -> Result<(Profile, bool)> {
    let (name, remove) = match raw.strip_suffix('-') {
        Some(name) => (name, true),
        None => (raw, false),
    };
    let profile = config
        .profile(name)
        .ok_or_else(|| KnError::validation(format!("profile '{}' is not defined", name)))?;
    Ok((profile, remove))
}

impl ServiceFlags {
    fn parse(&self, config: &UserConfig) -> Result<ServiceInput> {
        let requirements = |raw: &Option<String>, flag: &str| match raw {
            Some(raw) => resource_requirements::parse(raw, flag),
            None => Ok(BTreeMap::new()),
        };
        Ok(ServiceInput {
            image: self.image.clone(),
            env: MapUpdate::parse(&self.env, "env")?,
            port: self.port,
            labels: MapUpdate::parse(&self.labels, "label")?,
            annotations: MapUpdate::parse(&self.annotations, "annotation")?,
            scale_min: self.scale_min,
            scale_max: self.scale_max,
            concurrency_limit: self.concurrency_limit,
            service_account: self.service_account.clone(),
            revision_name: self.revision_name.clone(),
            profile: self
                .profile
                .as_deref()
                .map(|raw| lookup_profile(config, raw))
                .transpose()?,
            requests: requirements(&self.request, "request")?,
            limits: requirements(&self.limit, "limit")?,
        })
    }
}

impl ServiceInput {
    fn apply(&self, mut builder: ServiceBuilder) -> ServiceBuilder {
        if let Some(image) = &self.image {
            builder = builder.image(image);
        }
        builder = builder
            .env(&self.env)
            .labels(&self.labels)
            .annotations(&self.annotations)
            .requests(&self.requests)
            .limits(&self.limits);
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(min) = self.scale_min {
            builder = builder.scale_min(min);
        }
        if let Some(max) = self.scale_max {
            builder = builder.scale_max(max);
        }
        if let Some(limit) = self.concurrency_limit {
            builder = builder.concurrency_limit(limit);
        }
        if let Some(account) = &self.service_account {
            builder = builder.service_account(account);
        }
        builder = match &self.revision_name {
            Some(revision) => builder.revision_name(revision),
            None => builder.clear_revision_name(),
        };
        if let Some((profile, remove)) = &self.profile {
            builder = builder.profile(profile, *remove);
        }
        builder
    }
}

fn template_annotation<'a>(service: &'a Service, key: &str) -> Option<&'a String> {
    service
        .spec
        .template
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(key))
}

impl Printable for Service {
    const HEADERS: &'static [&'static str] =
        &["NAME", "URL", "LATEST", "AGE", "CONDITIONS", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.url().unwrap_or_default(),
            self.status
                .as_ref()
                .and_then(|s| s.latest_created_revision_name.clone())
                .unwrap_or_default(),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::condition_summary(self),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for Service {
    fn describe(&self, w: &mut DescribeWriter, _ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.optional(0, "URL", self.url());
        let template = &self.spec.template.spec;
        if let Some(container) = template.containers.first() {
            w.optional(0, "Image", container.image.as_deref());
            if let Some(env) = &container.env {
                let vars: Vec<String> = env
                    .iter()
                    .map(|e| format!("{}={}", e.name, e.value.as_deref().unwrap_or_default()))
                    .collect();
                w.list(0, "Env", &vars);
            }
            if let Some(port) = container.ports.as_ref().and_then(|p| p.first()) {
                w.line(0, "Port", port.container_port);
            }
        }
        w.optional(0, "ServiceAccount", template.service_account_name.as_deref());
        w.optional(0, "Concurrency", template.container_concurrency);
        let min = template_annotation(self, ANNOTATION_MIN_SCALE);
        let max = template_annotation(self, ANNOTATION_MAX_SCALE);
        if min.is_some() || max.is_some() {
            w.line(
                0,
                "Scale",
                format!(
                    "{} ... {}",
                    min.map(String::as_str).unwrap_or("0"),
                    max.map(String::as_str).unwrap_or("\u{221e}")
                ),
            );
        }

        if let Some(status) = &self.status {
            let traffic: Vec<String> = status.traffic.iter().map(traffic_text).collect();
            if !traffic.is_empty() {
                w.header(0, "Revisions");
                for line in &traffic {
                    w.line(1, "Target", line);
                }
            }
            w.optional(0, "Latest", status.latest_ready_revision_name.as_deref());
        }
    }

    fn url(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.url.clone())
    }

    fn has_url() -> bool {
        true
    }
}

async fn await_ready(
    api: &TypedApi<Service>,
    name: &str,
    config: WaitConfig,
    out: &mut dyn Write,
) -> Result<()> {
    info!(name, timeout = config.timeout.as_secs(), "waiting for service readiness");
    let service = wait_for_ready(api, name, config).await?;
    match service.url() {
        Some(url) => writeln!(out, "Service '{}' is ready at URL: {}", name, url)?,
        None => writeln!(out, "Service '{}' is ready.", name)?,
    }
    Ok(())
}

impl ServiceCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            ServiceAction::Create(cmd) => cmd.execute(env, out).await,
            ServiceAction::Update(cmd) => cmd.execute(env, out).await,
            ServiceAction::Delete(cmd) => cmd.execute(env, out).await,
            ServiceAction::List(cmd) => {
                resource::list::<Service>(env, &cmd.flags, "services", out).await
            }
            ServiceAction::Describe(cmd) => {
                resource::describe::<Service>(env, &cmd.flags, &cmd.name, out).await
            }
            ServiceAction::Wait(cmd) => cmd.execute(env, out).await,
        }
    }
}

impl ServiceCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("--image", self.flags.image.is_some())
            .required("--image")?;
        let input = self.flags.parse(&env.config)?;
        let namespace = env.namespace(&self.ns).await?;
        let service = input
            .apply(ServiceBuilder::new(&self.name, &namespace))
            .build()?;
        resource::create(env, &namespace, &service, out).await?;

        if !self.wait.no_wait {
            let api = env.api::<Service>(&namespace).await?;
            await_ready(&api, &self.name, self.wait.config(), out).await?;
        }
        Ok(())
    }
}

impl ServiceUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let input = self.flags.parse(&env.config)?;
        let namespace = env.namespace(&self.ns).await?;
        let deadline = Instant::now() + Duration::from_secs(self.wait.wait_timeout);
        resource::update_until::<Service, _>(
            env,
            &namespace,
            &self.name,
            deadline,
            |service| input.apply(ServiceBuilder::from_existing(service)).build(),
            out,
        )
        .await?;

        if !self.wait.no_wait {
            let api = env.api::<Service>(&namespace).await?;
            await_ready(&api, &self.name, self.wait.config(), out).await?;
        }
        Ok(())
    }
}

impl ServiceDelete {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("NAME", !self.names.is_empty())
            .flag("--all", self.all)
            .exactly_one(&["NAME", "--all"])?;
        let namespace = env.namespace(&self.ns).await?;
        let api = env.api::<Service>(&namespace).await?;

        let names = if self.all {
            let names: Vec<String> = api.list().await?.iter().map(|s| s.name_any()).collect();
            if names.is_empty() {
                writeln!(out, "No services found.")?;
                return Ok(());
            }
            names
        } else {
            self.names.clone()
        };

        let timeout = Duration::from_secs(self.wait_timeout);
        for name in &names {
            api.delete(name).await?;
            if !self.no_wait {
                wait_for_deletion(&api, name, timeout).await?;
            }
            resource::report(out, api.kind(), name, "deleted", &namespace)?;
        }
        Ok(())
    }
}

impl ServiceWait {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let namespace = env.namespace(&self.ns).await?;
        let api = env.api::<Service>(&namespace).await?;
        await_ready(
            &api,
            &self.name,
            WaitConfig::new(self.wait_timeout, self.wait_window),
            out,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile_rejected() {
        let flags = ServiceFlags {
            profile: Some("nope".to_string()),
            ..Default::default()
        };
        let err = flags.parse(&UserConfig::default()).unwrap_err();
        assert!(err.to_string().contains("profile 'nope'"));
    }

    #[test]
    fn test_profile_removal_suffix() {
        let (_, remove) = lookup_profile(&UserConfig::default(), "istio-").unwrap();
        assert!(remove);
        let (_, remove) = lookup_profile(&UserConfig::default(), "istio").unwrap();
        assert!(!remove);
    }

    #[test]
    fn test_update_keeps_image_and_drops_revision_name() {
        let existing = ServiceBuilder::new("hello", "default")
            .image("gcr.io/hello")
            .revision_name("v1")
            .build()
            .unwrap();
        let input = ServiceFlags {
            env: vec!["A=1".to_string()],
            ..Default::default()
        }
        .parse(&UserConfig::default())
        .unwrap();
        let updated = input
            .apply(ServiceBuilder::from_existing(existing))
            .build()
            .unwrap();
        let template = &updated.spec.template;
        assert!(template.metadata.name.is_none());
        assert_eq!(
            template.spec.containers[0].image.as_deref(),
            Some("gcr.io/hello")
        );
    }
}
