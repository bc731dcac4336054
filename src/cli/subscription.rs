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

//! `kn subscription`

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::domain::builder::{channel_reference, SubscriptionBuilder};
use crate::domain::reference::sink::{resolve_optional, sink_to_text};
use crate::infrastructure::kubernetes::resources::{Destination, Subscription};
use crate::infrastructure::kubernetes::ClusterApi;
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct SubscriptionCommand {
    #[command(subcommand)]
    pub action: SubscriptionAction,
}

#[derive(Subcommand, Debug)]
pub enum SubscriptionAction {
    /// Create a subscription
    Create(SubscriptionCreate),
    /// Update a subscription
    Update(SubscriptionUpdate),
    /// Delete a subscription
    Delete(SubscriptionDelete),
    /// List subscriptions
    #[command(visible_alias = "ls")]
    List(SubscriptionList),
    /// Show details of a subscription
    Describe(SubscriptionDescribe),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SubscriptionSinks {
    /// Subscriber: a URL, or [PREFIX:]NAME[:NAMESPACE]
    #[arg(long, short = 's')]
    pub sink: Option<String>,

    /// Where replies of the subscriber are sent
    #[arg(long = "sink-reply")]
    pub reply: Option<String>,

    /// Where undeliverable events are sent
    #[arg(long = "sink-dead-letter")]
    pub dead_letter: Option<String>,
}

struct ResolvedSinks {
    subscriber: Option<Destination>,
    reply: Option<Destination>,
    dead_letter: Option<Destination>,
}

impl SubscriptionSinks {
    async fn resolve(
        &self,
        cluster: &dyn ClusterApi,
        namespace: &str,
        env: &CommandEnv,
    ) -> Result<ResolvedSinks> {
        Ok(ResolvedSinks {
            subscriber: resolve_optional(cluster, self.sink.as_deref(), namespace, &env.prefixes)
                .await?,
            reply: resolve_optional(cluster, self.reply.as_deref(), namespace, &env.prefixes)
                .await?,
            dead_letter: resolve_optional(
                cluster,
                self.dead_letter.as_deref(),
                namespace,
                &env.prefixes,
            )
            .await?,
        })
    }
}

#[derive(Parser, Debug)]
pub struct SubscriptionCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Channel to subscribe to: NAME, channel:NAME or Group:Version:Kind:NAME
    #[arg(long, short = 'c')]
    pub channel: Option<String>,

    #[command(flatten)]
    pub sinks: SubscriptionSinks,
}

#[derive(Parser, Debug)]
pub struct SubscriptionUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub sinks: SubscriptionSinks,
}

#[derive(Parser, Debug)]
pub struct SubscriptionDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct SubscriptionList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct SubscriptionDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

impl Printable for Subscription {
    const HEADERS: &'static [&'static str] = &[
        "NAME",
        "CHANNEL",
        "SUBSCRIBER",
        "REPLY",
        "DEAD LETTER SINK",
        "READY",
        "REASON",
    ];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        let text = |d: Option<&Destination>| {
            d.map(|d| sink_to_text(d, &ctx.namespace, &ctx.prefixes))
                .unwrap_or_default()
        };
        vec![
            self.name_any(),
            format!("{}:{}", self.spec.channel.kind, self.spec.channel.name),
            text(self.spec.subscriber.as_ref()),
            text(self.spec.reply.as_ref()),
            text(
                self.spec
                    .delivery
                    .as_ref()
                    .and_then(|d| d.dead_letter_sink.as_ref()),
            ),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for Subscription {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.line(
            0,
            "Channel",
            format!(
                "{}:{} ({})",
                self.spec.channel.kind, self.spec.channel.name, self.spec.channel.api_version
            ),
        );
        if let Some(subscriber) = &self.spec.subscriber {
            w.destination(0, "Subscriber", subscriber, &ctx.namespace, &ctx.prefixes);
        }
        if let Some(reply) = &self.spec.reply {
            w.destination(0, "Reply", reply, &ctx.namespace, &ctx.prefixes);
        }
        if let Some(dls) = self
            .spec
            .delivery
            .as_ref()
            .and_then(|d| d.dead_letter_sink.as_ref())
        {
            w.destination(0, "DeadLetterSink", dls, &ctx.namespace, &ctx.prefixes);
        }
    }
}

impl SubscriptionCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            SubscriptionAction::Create(cmd) => cmd.execute(env, out).await,
            SubscriptionAction::Update(cmd) => cmd.execute(env, out).await,
            SubscriptionAction::Delete(cmd) => {
                resource::delete::<Subscription>(env, &cmd.ns, &cmd.name, out).await
            }
            SubscriptionAction::List(cmd) => {
                resource::list::<Subscription>(env, &cmd.flags, "subscriptions", out).await
            }
            SubscriptionAction::Describe(cmd) => {
                resource::describe::<Subscription>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl SubscriptionCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("--channel", self.channel.is_some())
            .required("--channel")?;
        let channel = channel_reference(self.channel.as_deref().unwrap_or_default())?;
        let namespace = env.namespace(&self.ns).await?;
        let cluster = env.cluster().await?;
        let sinks = self.sinks.resolve(cluster.as_ref(), &namespace, env).await?;

        let subscription = SubscriptionBuilder::new(&self.name, &namespace, channel)
            .subscriber(sinks.subscriber)
            .reply(sinks.reply)
            .dead_letter_sink(sinks.dead_letter)
            .build();
        resource::create(env, &namespace, &subscription, out).await?;
        Ok(())
    }
}

impl SubscriptionUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let namespace = env.namespace(&self.ns).await?;
        let cluster = env.cluster().await?;
        let sinks = self.sinks.resolve(cluster.as_ref(), &namespace, env).await?;

        resource::update::<Subscription, _>(
            env,
            &namespace,
            &self.name,
            |subscription| {
                Ok(SubscriptionBuilder::from_existing(subscription)
                    .subscriber(sinks.subscriber.clone())
                    .reply(sinks.reply.clone())
                    .dead_letter_sink(sinks.dead_letter.clone())
                    .build())
            },
            out,
        )
        .await?;
        Ok(())
    }
}
