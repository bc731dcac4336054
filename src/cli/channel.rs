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

//! `kn channel`

use super::discovery::{discover_types, print_types, TypeInfo};
use super::display::human;
use super::display::{DescribeWriter, OutputFormat, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::domain::builder::{parse_channel_type, ChannelBuilder};
use crate::infrastructure::constants::{LABEL_SUBSCRIBABLE, MESSAGING_GROUP};
use crate::infrastructure::kubernetes::resources::Channel;
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ChannelCommand {
    #[command(subcommand)]
    pub action: ChannelAction,
}

#[derive(Subcommand, Debug)]
pub enum ChannelAction {
    /// Create a channel
    Create(ChannelCreate),
    /// Delete a channel
    Delete(ChannelDelete),
    /// List channels
    #[command(visible_alias = "ls")]
    List(ChannelList),
    /// List installed channel types
    ListTypes(ChannelListTypes),
    /// Show details of a channel
    Describe(ChannelDescribe),
}

#[derive(Parser, Debug)]
pub struct ChannelCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Channel type as Group:Version:Kind, or an alias such as imc
    #[arg(long = "type")]
    pub channel_type: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ChannelDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct ChannelList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct ChannelListTypes {
    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Output format: json, yaml or name
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    #[arg(long)]
    pub no_headers: bool,
}

#[derive(Parser, Debug)]
pub struct ChannelDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

impl Printable for Channel {
    const HEADERS: &'static [&'static str] = &["NAME", "TYPE", "URL", "AGE", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.spec
                .channel_template
                .as_ref()
                .map(|t| t.kind.clone())
                .unwrap_or_default(),
            self.url().unwrap_or_default(),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for Channel {
    fn describe(&self, w: &mut DescribeWriter, _ctx: &PrintContext) {
        w.metadata(&self.metadata);
        if let Some(template) = &self.spec.channel_template {
            w.line(0, "Type", format!("{} ({})", template.kind, template.api_version));
        }
        w.optional(0, "URL", self.url());
    }

    fn url(&self) -> Option<String> {
        self.status
            .as_ref()
            .and_then(|s| s.address.as_ref())
            .and_then(|a| a.url.clone())
    }

    fn has_url() -> bool {
        true
    }
}

pub fn builtin_channel_types() -> Vec<TypeInfo> {
    vec![
        TypeInfo::new(
            "InMemoryChannel",
            MESSAGING_GROUP,
            "v1",
            "inmemorychannels",
            "The events are stored in memory",
        ),
        TypeInfo::new(
            "KafkaChannel",
            MESSAGING_GROUP,
            "v1beta1",
            "kafkachannels",
            "The events are stored in Kafka",
        ),
    ]
}

impl ChannelCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            ChannelAction::Create(cmd) => cmd.execute(env, out).await,
            ChannelAction::Delete(cmd) => {
                resource::delete::<Channel>(env, &cmd.ns, &cmd.name, out).await
            }
            ChannelAction::List(cmd) => {
                resource::list::<Channel>(env, &cmd.flags, "channels", out).await
            }
            ChannelAction::ListTypes(cmd) => cmd.execute(env, out).await,
            ChannelAction::Describe(cmd) => {
                resource::describe::<Channel>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl ChannelCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let channel_type = self
            .channel_type
            .as_deref()
            .map(|t| parse_channel_type(t, &env.config))
            .transpose()?;
        let namespace = env.namespace(&self.ns).await?;
        let channel = ChannelBuilder::new(&self.name, &namespace)
            .channel_type(channel_type.as_ref())
            .build();
        resource::create(env, &namespace, &channel, out).await?;
        Ok(())
    }
}

impl ChannelListTypes {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let format = OutputFormat::parse_optional(self.output.as_deref(), OutputFormat::LIST)?;
        let namespace = env.namespace(&self.ns).await?;
        let cluster = env.cluster().await?;
        let types = discover_types(
            cluster.as_ref(),
            &namespace,
            LABEL_SUBSCRIBABLE,
            &builtin_channel_types(),
        )
        .await?;
        let mut ctx = env.print_context(&namespace);
        ctx.no_headers = self.no_headers;
        print_types(&types, "ChannelTypeList", "channels", format, &ctx, out)
    }
}
