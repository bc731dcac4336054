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

//! `kn broker`

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::domain::builder::BrokerBuilder;
use crate::domain::reference::sink::resolve_optional;
use crate::infrastructure::constants::ANNOTATION_BROKER_CLASS;
use crate::infrastructure::kubernetes::resources::Broker;
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct BrokerCommand {
    #[command(subcommand)]
    pub action: BrokerAction,
}

#[derive(Subcommand, Debug)]
pub enum BrokerAction {
    /// Create a broker
    Create(BrokerCreate),
    /// Delete a broker
    Delete(BrokerDelete),
    /// List brokers
    #[command(visible_alias = "ls")]
    List(BrokerList),
    /// Show details of a broker
    Describe(BrokerDescribe),
}

#[derive(Parser, Debug)]
pub struct BrokerCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Broker class, defaults to MTChannelBasedBroker
    #[arg(long)]
    pub class: Option<String>,

    /// Sink for events that could not be delivered
    #[arg(long = "dl-sink")]
    pub dl_sink: Option<String>,
}

#[derive(Parser, Debug)]
pub struct BrokerDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct BrokerList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct BrokerDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

fn broker_class(broker: &Broker) -> String {
    broker
        .annotations()
        .get(ANNOTATION_BROKER_CLASS)
        .cloned()
        .unwrap_or_default()
}

impl Printable for Broker {
    const HEADERS: &'static [&'static str] = &["NAME", "URL", "AGE", "CONDITIONS", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.url().unwrap_or_default(),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::condition_summary(self),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for Broker {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.optional(0, "Class", Some(broker_class(self)));
        w.optional(0, "URL", self.url());
        if let Some(sink) = self
            .spec
            .delivery
            .as_ref()
            .and_then(|d| d.dead_letter_sink.as_ref())
        {
            w.destination(0, "Dead Letter Sink", sink, &ctx.namespace, &ctx.prefixes);
        }
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

impl BrokerCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            BrokerAction::Create(cmd) => cmd.execute(env, out).await,
            BrokerAction::Delete(cmd) => {
                resource::delete::<Broker>(env, &cmd.ns, &cmd.name, out).await
            }
            BrokerAction::List(cmd) => {
                resource::list::<Broker>(env, &cmd.flags, "brokers", out).await
            }
            BrokerAction::Describe(cmd) => {
                resource::describe::<Broker>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl BrokerCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let namespace = env.namespace(&self.ns).await?;
        let cluster = env.cluster().await?;
        let dead_letter = resolve_optional(
            cluster.as_ref(),
            self.dl_sink.as_deref(),
            &namespace,
            &env.prefixes,
        )
        .await?;
        let broker = BrokerBuilder::new(&self.name, &namespace)
            .class(self.class.as_deref())
            .dead_letter_sink(dead_letter)
            .build();
        resource::create(env, &namespace, &broker, out).await?;
        Ok(())
    }
}
