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

//! `kn eventtype`

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::domain::builder::EventTypeBuilder;
use crate::domain::reference::sink::{parse_with_default, resolve_sink};
use crate::infrastructure::constants::DEFAULT_SINK_PREFIX;
use crate::infrastructure::kubernetes::resources::{EventType, KReference};
use crate::shared::error::{KnError, Result};
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct EventTypeCommand {
    #[command(subcommand)]
    pub action: EventTypeAction,
}

#[derive(Subcommand, Debug)]
pub enum EventTypeAction {
    /// Create an event type
    Create(EventTypeCreate),
    /// Delete an event type
    Delete(EventTypeDelete),
    /// List event types
    #[command(visible_alias = "ls")]
    List(EventTypeList),
    /// Show details of an event type
    Describe(EventTypeDescribe),
}

#[derive(Parser, Debug)]
pub struct EventTypeCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// CloudEvent type attribute
    #[arg(long = "type")]
    pub event_type: Option<String>,

    /// CloudEvent source attribute, must be a URI
    #[arg(long)]
    pub source: Option<String>,

    /// Broker the events arrive through
    #[arg(long)]
    pub broker: Option<String>,

    /// Object the events arrive through, as [PREFIX:]NAME[:NAMESPACE]
    #[arg(long)]
    pub reference: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Parser, Debug)]
pub struct EventTypeDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct EventTypeList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct EventTypeDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

fn reference_text(reference: Option<&KReference>) -> String {
    reference
        .map(|r| format!("{}:{}", r.kind, r.name))
        .unwrap_or_default()
}

impl Printable for EventType {
    const HEADERS: &'static [&'static str] =
        &["NAME", "TYPE", "SOURCE", "REFERENCE", "AGE", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.spec.type_.clone(),
            self.spec.source.clone().unwrap_or_default(),
            reference_text(self.spec.reference.as_ref()),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for EventType {
    fn describe(&self, w: &mut DescribeWriter, _ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.line(0, "Type", &self.spec.type_);
        w.optional(0, "Source", self.spec.source.as_deref());
        w.optional(0, "Schema", self.spec.schema.as_deref());
        w.optional(0, "Description", self.spec.description.as_deref());
        if let Some(r) = &self.spec.reference {
            w.header(0, "Reference");
            w.line(1, "Kind", &r.kind);
            w.line(1, "Name", &r.name);
            w.line(1, "APIVersion", &r.api_version);
        }
    }
}

impl EventTypeCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            EventTypeAction::Create(cmd) => cmd.execute(env, out).await,
            EventTypeAction::Delete(cmd) => {
                resource::delete::<EventType>(env, &cmd.ns, &cmd.name, out).await
            }
            EventTypeAction::List(cmd) => {
                resource::list::<EventType>(env, &cmd.flags, "eventtypes", out).await
            }
            EventTypeAction::Describe(cmd) => {
                resource::describe::<EventType>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl EventTypeCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("--type", self.event_type.is_some())
            .flag("--broker", self.broker.is_some())
            .flag("--reference", self.reference.is_some())
            .required("--type")?
            .mutually_exclusive(&["--broker", "--reference"])?;

        let namespace = env.namespace(&self.ns).await?;
        let mut builder =
            EventTypeBuilder::new(&self.name, &namespace, self.event_type.as_deref().unwrap_or_default())
                .source(self.source.as_deref())?
                .description(self.description.as_deref());

        if let Some(broker) = &self.broker {
            builder = builder.broker(broker);
        }
        if let Some(raw) = &self.reference {
            let target = parse_with_default(raw, DEFAULT_SINK_PREFIX, &namespace, &env.prefixes)?;
            let cluster = env.cluster().await?;
            let destination = resolve_sink(cluster.as_ref(), &target).await?;
            let reference = destination.reference.ok_or_else(|| {
                KnError::validation(format!(
                    "reference '{}' must name a cluster object, not a URL",
                    raw
                ))
            })?;
            builder = builder.reference(reference);
        }

        resource::create(env, &namespace, &builder.build()?, out).await?;
        Ok(())
    }
}
