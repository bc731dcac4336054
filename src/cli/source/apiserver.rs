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

//! `kn source apiserver`

use crate::cli::display::human;
use crate::cli::display::{DescribeWriter, PrintContext, Printable};
use crate::cli::env::CommandEnv;
use crate::cli::flags::{DescribeFlags, ListFlags, NamespaceFlags, SinkFlags};
use crate::cli::resource::{self, Describable};
use crate::domain::builder::{parse_apiserver_resource, ApiServerSourceBuilder};
use crate::domain::reference::sink::sink_to_text;
use crate::infrastructure::kubernetes::resources::{ApiServerResource, ApiServerSource};
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ApiServerCommand {
    #[command(subcommand)]
    pub action: ApiServerAction,
}

#[derive(Subcommand, Debug)]
pub enum ApiServerAction {
    /// Create an API server source
    Create(ApiServerCreate),
    /// Update an API server source
    Update(ApiServerUpdate),
    /// Delete an API server source
    Delete(ApiServerDelete),
    /// List API server sources
    #[command(visible_alias = "ls")]
    List(ApiServerList),
    /// Show details of an API server source
    Describe(ApiServerDescribe),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ApiServerFlags {
    /// Watched resource Kind:apiVersion[:key=value,...], repeatable
    #[arg(long = "resource", value_name = "KIND:APIVERSION[:SELECTOR]")]
    pub resources: Vec<String>,

    /// Event payload mode: Reference or Resource
    #[arg(long)]
    pub mode: Option<String>,

    /// Service account used to watch the resources
    #[arg(long)]
    pub service_account: Option<String>,

    #[command(flatten)]
    pub sink: SinkFlags,
}

impl ApiServerFlags {
    fn parse_resources(&self) -> Result<Vec<ApiServerResource>> {
        self.resources
            .iter()
            .map(|raw| parse_apiserver_resource(raw))
            .collect()
    }

    fn apply(
        &self,
        mut builder: ApiServerSourceBuilder,
        resources: &[ApiServerResource],
    ) -> Result<ApiServerSourceBuilder> {
        if !resources.is_empty() {
            builder = builder.resources(resources.to_vec());
        }
        if let Some(mode) = &self.mode {
            builder = builder.mode(mode)?;
        }
        if let Some(account) = &self.service_account {
            builder = builder.service_account(account);
        }
        Ok(builder)
    }
}

#[derive(Parser, Debug)]
pub struct ApiServerCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: ApiServerFlags,
}

#[derive(Parser, Debug)]
pub struct ApiServerUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: ApiServerFlags,
}

#[derive(Parser, Debug)]
pub struct ApiServerDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct ApiServerList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct ApiServerDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

fn resource_text(resource: &ApiServerResource) -> String {
    format!("{}:{}", resource.kind, resource.api_version)
}

impl Printable for ApiServerSource {
    const HEADERS: &'static [&'static str] =
        &["NAME", "RESOURCES", "SINK", "AGE", "CONDITIONS", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        let resources: Vec<String> = self.spec.resources.iter().map(resource_text).collect();
        vec![
            self.name_any(),
            resources.join(","),
            sink_to_text(&self.spec.source.sink, &ctx.namespace, &ctx.prefixes),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::condition_summary(self),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for ApiServerSource {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.optional(0, "ServiceAccountName", Some(&self.spec.service_account_name));
        w.optional(0, "EventMode", Some(&self.spec.mode));
        if !self.spec.resources.is_empty() {
            w.header(0, "Resources");
            for r in &self.spec.resources {
                w.line(1, "Kind", format!("{} ({})", r.kind, r.api_version));
                if let Some(labels) = r.selector.as_ref().and_then(|s| s.match_labels.as_ref()) {
                    w.map(1, "Selector", labels);
                }
            }
        }
        w.destination(0, "Sink", &self.spec.source.sink, &ctx.namespace, &ctx.prefixes);
        w.ce_overrides(self.spec.source.ce_overrides.as_ref());
    }
}

impl ApiServerCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            ApiServerAction::Create(cmd) => cmd.execute(env, out).await,
            ApiServerAction::Update(cmd) => cmd.execute(env, out).await,
            ApiServerAction::Delete(cmd) => {
                resource::delete::<ApiServerSource>(env, &cmd.ns, &cmd.name, out).await
            }
            ApiServerAction::List(cmd) => {
                resource::list::<ApiServerSource>(env, &cmd.flags, "apiserver sources", out).await
            }
            ApiServerAction::Describe(cmd) => {
                resource::describe::<ApiServerSource>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl ApiServerCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let resources = self.flags.parse_resources()?;
        let namespace = env.namespace(&self.ns).await?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        let source = self
            .flags
            .apply(ApiServerSourceBuilder::new(&self.name, &namespace), &resources)?
            .sink(sink.sink)
            .ce_overrides(&sink.overrides)
            .build()?;
        resource::create(env, &namespace, &source, out).await?;
        Ok(())
    }
}

impl ApiServerUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let resources = self.flags.parse_resources()?;
        let namespace = env.namespace(&self.ns).await?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        resource::update::<ApiServerSource, _>(
            env,
            &namespace,
            &self.name,
            |source| {
                self.flags
                    .apply(ApiServerSourceBuilder::from_existing(source), &resources)?
                    .sink(sink.sink.clone())
                    .ce_overrides(&sink.overrides)
                    .build()
            },
            out,
        )
        .await?;
        Ok(())
    }
}
