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

//! `kn revision`

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::infrastructure::constants::{LABEL_CONFIGURATION_GENERATION, LABEL_SERVICE};
use crate::infrastructure::kubernetes::resources::Revision;
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct RevisionCommand {
    #[command(subcommand)]
    pub action: RevisionAction,
}

#[derive(Subcommand, Debug)]
pub enum RevisionAction {
    /// List revisions
    #[command(visible_alias = "ls")]
    List(RevisionList),
    /// Show details of a revision
    Describe(RevisionDescribe),
    /// Delete a revision
    Delete(RevisionDelete),
}

#[derive(Parser, Debug)]
pub struct RevisionList {
    #[command(flatten)]
    pub flags: ListFlags,

    /// Only revisions of this service
    #[arg(long, short = 's')]
    pub service: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RevisionDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

#[derive(Parser, Debug)]
pub struct RevisionDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

fn label(revision: &Revision, key: &str) -> String {
    revision.labels().get(key).cloned().unwrap_or_default()
}

impl Printable for Revision {
    const HEADERS: &'static [&'static str] =
        &["NAME", "SERVICE", "GENERATION", "AGE", "READY", "REASON"];

    fn row(&self, ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            label(self, LABEL_SERVICE),
            label(self, LABEL_CONFIGURATION_GENERATION),
            human::age(self.metadata.creation_timestamp.as_ref(), ctx.now),
            human::ready(self),
            human::non_ready_reason(self),
        ]
    }
}

impl Describable for Revision {
    fn describe(&self, w: &mut DescribeWriter, _ctx: &PrintContext) {
        w.metadata(&self.metadata);
        if let Some(container) = self.spec.containers.first() {
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
        w.optional(0, "Service", self.labels().get(LABEL_SERVICE));
        w.optional(0, "Concurrency", self.spec.container_concurrency);
        w.optional(0, "ServiceAccount", self.spec.service_account_name.as_deref());
        if let Some(status) = &self.status {
            w.optional(0, "Replicas", status.actual_replicas.map(|actual| {
                format!("{}/{}", actual, status.desired_replicas.unwrap_or(0))
            }));
        }
    }
}

impl RevisionCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            RevisionAction::List(cmd) => {
                let selector = cmd
                    .service
                    .as_ref()
                    .map(|service| format!("{}={}", LABEL_SERVICE, service));
                resource::list_selected::<Revision>(
                    env,
                    &cmd.flags,
                    selector.as_deref(),
                    "revisions",
                    out,
                )
                .await
            }
            RevisionAction::Describe(cmd) => {
                resource::describe::<Revision>(env, &cmd.flags, &cmd.name, out).await
            }
            RevisionAction::Delete(cmd) => {
                resource::delete::<Revision>(env, &cmd.ns, &cmd.name, out).await
            }
        }
    }
}
