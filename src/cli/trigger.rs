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

//! `kn trigger`

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::domain::builder::{MapUpdate, TriggerBuilder};
use crate::domain::reference::sink::{resolve_optional, sink_to_text};
use crate::infrastructure::kubernetes::resources::Trigger;
use crate::shared::error::{KnError, Result};
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct TriggerCommand {
    #[command(subcommand)]
    pub action: TriggerAction,
}

#[derive(Subcommand, Debug)]
pub enum TriggerAction {
    /// Create a trigger
    Create(TriggerCreate),
    /// Update a trigger
    Update(TriggerUpdate),
    /// Delete a trigger
    Delete(TriggerDelete),
    /// List triggers
    #[command(visible_alias = "ls")]
    List(TriggerList),
    /// Show details of a trigger
    Describe(TriggerDescribe),
}

#[derive(Parser, Debug)]
pub struct TriggerCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Name of the broker the trigger subscribes to
    #[arg(long, default_value = "default")]
    pub broker: String,

    /// Attribute filter KEY=VALUE, or KEY- to remove
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Subscriber: a URL, or [PREFIX:]NAME[:NAMESPACE]
    #[arg(long, short = 's')]
    pub sink: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TriggerUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Not updatable; given only to report that
    #[arg(long)]
    pub broker: Option<String>,

    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    #[arg(long, short = 's')]
    pub sink: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TriggerDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct TriggerList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct TriggerDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

impl Printable for Trigger {
    const HEADERS: &'static [&'static str] =
        &["NAME", "BROKER", "SINK", "AGE", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.spec.broker.clone(),
            sink_to_text(&self.spec.subscriber, &ctx.namespace, &ctx.prefixes),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for Trigger {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.line(0, "Broker", &self.spec.broker);
        if let Some(filter) = &self.spec.filter {
            if !filter.attributes.is_empty() {
                w.header(0, "Filter");
                for (k, v) in &filter.attributes {
                    w.line(1, k, v);
                }
            }
        }
        w.destination(0, "Sink", &self.spec.subscriber, &ctx.namespace, &ctx.prefixes);
    }
}

impl TriggerCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            TriggerAction::Create(cmd) => cmd.execute(env, out).await,
            TriggerAction::Update(cmd) => cmd.execute(env, out).await,
            TriggerAction::Delete(cmd) => {
                resource::delete::<Trigger>(env, &cmd.ns, &cmd.name, out).await
            }
            TriggerAction::List(cmd) => {
                resource::list::<Trigger>(env, &cmd.flags, "triggers", out).await
            }
            TriggerAction::Describe(cmd) => {
                resource::describe::<Trigger>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl TriggerCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let filters = MapUpdate::parse(&self.filters, "filter")?;
        let namespace = env.namespace(&self.ns).await?;
        let cluster = env.cluster().await?;
        let sink =
            resolve_optional(cluster.as_ref(), self.sink.as_deref(), &namespace, &env.prefixes)
                .await?;
        let trigger = TriggerBuilder::new(&self.name, &namespace, &self.broker)
            .filters(&filters)
            .subscriber(sink)
            .build()?;
        resource::create(env, &namespace, &trigger, out).await?;
        Ok(())
    }
}

impl TriggerUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let filters = MapUpdate::parse(&self.filters, "filter")?;
        let namespace = env.namespace(&self.ns).await?;
        let broker_given = self.broker.is_some();
        let sink = if broker_given {
            None
        } else {
            let cluster = env.cluster().await?;
            resolve_optional(cluster.as_ref(), self.sink.as_deref(), &namespace, &env.prefixes)
                .await?
        };
        let name = self.name.clone();

        resource::update::<Trigger, _>(
            env,
            &namespace,
            &self.name,
            |trigger| {
                if broker_given {
                    return Err(KnError::validation(format!(
                        "cannot update trigger '{}' because broker is immutable",
                        name
                    )));
                }
                TriggerBuilder::from_existing(trigger)
                    .filters(&filters)
                    .subscriber(sink.clone())
                    .build()
            },
            out,
        )
        .await?;
        Ok(())
    }
}
