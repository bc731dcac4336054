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

//! `kn source binding`

use crate::cli::display::human;
use crate::cli::display::{DescribeWriter, PrintContext, Printable};
use crate::cli::env::CommandEnv;
use crate::cli::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags, SinkFlags};
use crate::cli::resource::{self, Describable};
use crate::domain::builder::{parse_binding_subject, SinkBindingBuilder};
use crate::domain::reference::sink::sink_to_text;
use crate::infrastructure::kubernetes::resources::{BindingSubject, SinkBinding};
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct BindingCommand {
    #[command(subcommand)]
    pub action: BindingAction,
}

#[derive(Subcommand, Debug)]
pub enum BindingAction {
    /// Create a sink binding
    Create(BindingCreate),
    /// Update a sink binding
    Update(BindingUpdate),
    /// Delete a sink binding
    Delete(BindingDelete),
    /// List sink bindings
    #[command(visible_alias = "ls")]
    List(BindingList),
    /// Show details of a sink binding
    Describe(BindingDescribe),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BindingFlags {
    /// Subject as Kind:apiVersion:name or Kind:apiVersion:key=value,...
    #[arg(long)]
    pub subject: Option<String>,

    #[command(flatten)]
    pub sink: SinkFlags,
}

#[derive(Parser, Debug)]
pub struct BindingCreate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: BindingFlags,
}

#[derive(Parser, Debug)]
pub struct BindingUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[command(flatten)]
    pub flags: BindingFlags,
}

#[derive(Parser, Debug)]
pub struct BindingDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct BindingList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct BindingDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

/// Inverse of the `--subject` syntax.
pub fn subject_text(subject: &BindingSubject) -> String {
    let target = match (&subject.name, &subject.selector) {
        (Some(name), _) if !name.is_empty() => name.clone(),
        (_, Some(selector)) => selector
            .match_labels
            .as_ref()
            .map(|labels| {
                labels
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default(),
        _ => String::new(),
    };
    format!("{}:{}:{}", subject.kind, subject.api_version, target)
}

impl Printable for SinkBinding {
    const HEADERS: &'static [&'static str] =
        &["NAME", "SUBJECT", "SINK", "AGE", "CONDITIONS", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            subject_text(&self.spec.subject),
            sink_to_text(&self.spec.source.sink, &ctx.namespace, &ctx.prefixes),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::condition_summary(self),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for SinkBinding {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext) {
        w.metadata(&self.metadata);
        let subject = &self.spec.subject;
        w.header(0, "Subject");
        w.line(1, "Resource", format!("{} ({})", subject.kind, subject.api_version));
        w.optional(1, "Name", subject.name.as_deref());
        if let Some(labels) = subject.selector.as_ref().and_then(|s| s.match_labels.as_ref()) {
            w.map(1, "Selector", labels);
        }
        w.destination(0, "Sink", &self.spec.source.sink, &ctx.namespace, &ctx.prefixes);
        w.ce_overrides(self.spec.source.ce_overrides.as_ref());
    }
}

impl BindingCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            BindingAction::Create(cmd) => cmd.execute(env, out).await,
            BindingAction::Update(cmd) => cmd.execute(env, out).await,
            BindingAction::Delete(cmd) => {
                resource::delete::<SinkBinding>(env, &cmd.ns, &cmd.name, out).await
            }
            BindingAction::List(cmd) => {
                resource::list::<SinkBinding>(env, &cmd.flags, "sink bindings", out).await
            }
            BindingAction::Describe(cmd) => {
                resource::describe::<SinkBinding>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl BindingCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("--subject", self.flags.subject.is_some())
            .required("--subject")?;
        let namespace = env.namespace(&self.ns).await?;
        let subject =
            parse_binding_subject(self.flags.subject.as_deref().unwrap_or_default(), &namespace)?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        let binding = SinkBindingBuilder::new(&self.name, &namespace)
            .subject(subject)
            .sink(sink.sink)
            .ce_overrides(&sink.overrides)
            .build()?;
        resource::create(env, &namespace, &binding, out).await?;
        Ok(())
    }
}

impl BindingUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let namespace = env.namespace(&self.ns).await?;
        let subject = self
            .flags
            .subject
            .as_deref()
            .map(|raw| parse_binding_subject(raw, &namespace))
            .transpose()?;
        let sink = self.flags.sink.resolve(env, &namespace).await?;
        resource::update::<SinkBinding, _>(
            env,
            &namespace,
            &self.name,
            |binding| {
                let mut builder = SinkBindingBuilder::from_existing(binding);
                if let Some(subject) = &subject {
                    builder = builder.subject(subject.clone());
                }
                builder
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_text_round_trips_syntax() {
        for raw in ["Deployment:apps/v1:web", "Deployment:apps/v1:app=web,tier=fe"] {
            let subject = parse_binding_subject(raw, "default").unwrap();
            assert_eq!(subject_text(&subject), raw);
        }
    }
}
