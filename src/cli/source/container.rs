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

//! `kn source container`

use crate::cli::display::human;
use crate::cli::display::{DescribeWriter, PrintContext, Printable};
use crate::cli::env::CommandEnv;
use crate::cli::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags, SinkFlags};
use crate::cli::resource::{self, Describable};
use crate::domain::builder::{ContainerSourceBuilder, MapUpdate};
use crate::domain::reference::sink::sink_to_text;
use crate::infrastructure::kubernetes::resources::ContainerSource;
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use k8s_openapi::api::core::v1::Container;
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ContainerCommand {
    #[command(subcommand)]
    pub action: ContainerAction,
}

#[derive(Subcommand, Debug)]
pub enum ContainerAction {
    /// Create a container source
    Create(ContainerCreate),
    /// Update a container source
    Update(ContainerUpdate),
    /// Delete a container source
    Delete(ContainerDelete),
    /// List container sources
    #[command(visible_alias = "ls")]
    List(ContainerList),
    /// Show details of a container source
    Describe(ContainerDescribe),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ContainerFlags {
    /// Image producing the events
    #[arg(long)]
    pub image: Option<String>,

    /// Environment variable NAME=VALUE, or NAME- to remove
    #[arg(long = "env", short = 'e', value_name = "NAME=VALUE")]
    pub env: Vec<String>,

    /// Container argument, repeatable
    #[arg(long = "arg", value_name = "ARG")]
    pub args: Vec<String>,

    /// CPU request and limit, e.g. 100m
    #[arg(long)]
    pub cpu: Option<String>,

    /// Memory request and limit, e.g. 64Mi
    #[arg(long)]
    pub memory: Option<String>,

    #[command(flatten)]
    pub sink: SinkFlags,
}

impl ContainerFlags {
    fn apply(&self, mut builder: ContainerSourceBuilder, env: &MapUpdate) -> ContainerSourceBuilder {
        if let Some(image) = &self.image {
            builder = builder.image(image);
        }
        builder
            .env(env)
            .args(&self.args)
            .resources(self.cpu.as_deref(), self.memory.as_deref())
    }
}

#[derive(Parser, Debug)]
pub struct ContainerCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: ContainerFlags,
}

#[derive(Parser, Debug)]
pub struct ContainerUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: ContainerFlags,
}

#[derive(Parser, Debug)]
pub struct ContainerDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct ContainerList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct ContainerDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

fn first_container(source: &ContainerSource) -> Option<&Container> {
    source
        .spec
        .template
        .spec
        .as_ref()
        .and_then(|s| s.containers.first())
}

impl Printable for ContainerSource {
    const HEADERS: &'static [&'static str] =
        &["NAME", "IMAGE", "SINK", "AGE", "CONDITIONS", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            first_container(self)
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            sink_to_text(&self.spec.source.sink, &ctx.namespace, &ctx.prefixes),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::condition_summary(self),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for ContainerSource {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        if let Some(container) = first_container(self) {
            w.optional(0, "Image", container.image.as_deref());
            if let Some(env) = &container.env {
                let vars: Vec<String> = env
                    .iter()
                    .map(|e| format!("{}={}", e.name, e.value.as_deref().unwrap_or_default()))
                    .collect();
                w.list(0, "Env", &vars);
            }
            if let Some(args) = &container.args {
                w.list(0, "Args", args);
            }
        }
        w.destination(0, "Sink", &self.spec.source.sink, &ctx.namespace, &ctx.prefixes);
        w.ce_overrides(self.spec.source.ce_overrides.as_ref());
    }
}

impl ContainerCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            ContainerAction::Create(cmd) => cmd.execute(env, out).await,
            ContainerAction::Update(cmd) => cmd.execute(env, out).await,
            ContainerAction::Delete(cmd) => {
                resource::delete::<ContainerSource>(env, &cmd.ns, &cmd.name, out).await
            }
            ContainerAction::List(cmd) => {
                resource::list::<ContainerSource>(env, &cmd.flags, "container sources", out).await
            }
            ContainerAction::Describe(cmd) => {
                resource::describe::<ContainerSource>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl ContainerCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("--image", self.flags.image.is_some())
            .required("--image")?;
        let vars = MapUpdate::parse(&self.flags.env, "env")?;
        let namespace = env.namespace(&self.ns).await?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        let source = self
            .flags
            .apply(ContainerSourceBuilder::new(&self.name, &namespace), &vars)
            .sink(sink.sink)
            .ce_overrides(&sink.overrides)
            .build()?;
        resource::create(env, &namespace, &source, out).await?;
        Ok(())
    }
}

impl ContainerUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let vars = MapUpdate::parse(&self.flags.env, "env")?;
        let namespace = env.namespace(&self.ns).await?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        resource::update::<ContainerSource, _>(
            env,
            &namespace,
            &self.name,
            |source| {
                self.flags
                    .apply(ContainerSourceBuilder::from_existing(source), &vars)
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
