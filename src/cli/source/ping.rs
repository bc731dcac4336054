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

//! `kn source ping`

use crate::cli::display::human;
use crate::cli::display::{DescribeWriter, PrintContext, Printable};
use crate::cli::env::CommandEnv;
use crate::cli::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags, SinkFlags};
use crate::cli::resource::{self, Describable};
use crate::domain::builder::PingSourceBuilder;
use crate::domain::reference::sink::sink_to_text;
use crate::infrastructure::kubernetes::resources::PingSource;
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct PingCommand {
    #[command(subcommand)]
    pub action: PingAction,
}

#[derive(Subcommand, Debug)]
pub enum PingAction {
    /// Create a ping source
    Create(PingCreate),
    /// Update a ping source
    Update(PingUpdate),
    /// Delete a ping source
    Delete(PingDelete),
    /// List ping sources
    #[command(visible_alias = "ls")]
    List(PingList),
    /// Show details of a ping source
    Describe(PingDescribe),
}

#[derive(Args, Debug, Clone, Default)]
pub struct PingFlags {
    /// Cron schedule, e.g. "*/2 * * * *"
    #[arg(long)]
    pub schedule: Option<String>,

    /// Event payload
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Payload encoding: text or base64, detected from the data when unset
    #[arg(long, short = 'e')]
    pub encoding: Option<String>,

    #[command(flatten)]
    pub sink: SinkFlags,
}

impl PingFlags {
    fn check(&self) -> Result<()> {
        if self.encoding.is_some() {
            FlagRules::new()
                .flag("--data", self.data.is_some())
                .required("--data")?;
        }
        Ok(())
    }

    fn apply(&self, mut builder: PingSourceBuilder) -> Result<PingSourceBuilder> {
        if let Some(schedule) = &self.schedule {
            builder = builder.schedule(schedule);
        }
        if let Some(data) = &self.data {
            builder = builder.data(data, self.encoding.as_deref())?;
        }
        Ok(builder)
    }
}

#[derive(Parser, Debug)]
pub struct PingCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: PingFlags,
}

#[derive(Parser, Debug)]
pub struct PingUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: PingFlags,
}

#[derive(Parser, Debug)]
pub struct PingDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct PingList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct PingDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

impl Printable for PingSource {
    const HEADERS: &'static [&'static str] =
        &["NAME", "SCHEDULE", "SINK", "AGE", "CONDITIONS", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.spec.schedule.clone(),
            sink_to_text(&self.spec.source.sink, &ctx.namespace, &ctx.prefixes),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::condition_summary(self),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for PingSource {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.line(0, "Schedule", &self.spec.schedule);
        w.optional(0, "Timezone", self.spec.timezone.as_deref());
        w.optional(0, "Data", Some(&self.spec.data));
        w.optional(0, "DataBase64", Some(&self.spec.data_base64));
        w.destination(0, "Sink", &self.spec.source.sink, &ctx.namespace, &ctx.prefixes);
        w.ce_overrides(self.spec.source.ce_overrides.as_ref());
    }
}

impl PingCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            PingAction::Create(cmd) => cmd.execute(env, out).await,
            PingAction::Update(cmd) => cmd.execute(env, out).await,
            PingAction::Delete(cmd) => {
                resource::delete::<PingSource>(env, &cmd.ns, &cmd.name, out).await
            }
            PingAction::List(cmd) => {
                resource::list::<PingSource>(env, &cmd.flags, "ping sources", out).await
            }
            PingAction::Describe(cmd) => {
                resource::describe::<PingSource>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl PingCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        self.flags.check()?;
        FlagRules::new()
            .flag("--schedule", self.flags.schedule.is_some())
            .required("--schedule")?;
        let namespace = env.namespace(&self.ns).await?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        let source = self
            .flags
            .apply(PingSourceBuilder::new(&self.name, &namespace))?
            .sink(sink.sink)
            .ce_overrides(&sink.overrides)
            .build()?;
        resource::create(env, &namespace, &source, out).await?;
        Ok(())
    }
}

impl PingUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        self.flags.check()?;
        let namespace = env.namespace(&self.ns).await?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        resource::update::<PingSource, _>(
            env,
            &namespace,
            &self.name,
            |source| {
                self.flags
                    .apply(PingSourceBuilder::from_existing(source))?
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
