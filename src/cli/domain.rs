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

//! `kn domain`: DomainMapping management

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, FlagRules, ListFlags, NamespaceFlags};
use super::resource::{self, Describable};
use crate::domain::builder::DomainMappingBuilder;
use crate::domain::reference::sink::{parse_with_default, resolve_sink};
use crate::infrastructure::constants::DEFAULT_SINK_PREFIX;
use crate::infrastructure::kubernetes::resources::{DomainMapping, KReference};
use crate::shared::error::{KnError, Result};
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct DomainCommand {
    #[command(subcommand)]
    pub action: DomainAction,
}

#[derive(Subcommand, Debug)]
pub enum DomainAction {
    /// Map a domain onto a service or route
    Create(DomainCreate),
    /// Change the target or TLS secret of a mapping
    Update(DomainUpdate),
    /// Delete a domain mapping
    Delete(DomainDelete),
    /// List domain mappings
    #[command(visible_alias = "ls")]
    List(DomainList),
    /// Show details of a domain mapping
    Describe(DomainDescribe),
}

#[derive(Parser, Debug)]
pub struct DomainCreate {
    /// The domain name, e.g. hello.example.com
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Target as [PREFIX:]NAME[:NAMESPACE], a bare name is a Knative service
    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Secret holding the TLS certificate
    #[arg(long)]
    pub tls: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DomainUpdate {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,

    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Secret holding the TLS certificate, empty to remove TLS
    #[arg(long)]
    pub tls: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DomainDelete {
    pub name: String,

    #[command(flatten)]
    pub ns: NamespaceFlags,
}

#[derive(Parser, Debug)]
pub struct DomainList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct DomainDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

impl Printable for DomainMapping {
    const HEADERS: &'static [&'static str] = &["NAME", "URL", "READY", "KSVC"];

    fn row(&self, _ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.url().unwrap_or_default(),
            human::ready(self),
            self.spec.reference.name.clone(),
        ]
    }
}

impl Describable for DomainMapping {
    fn describe(&self, w: &mut DescribeWriter, _ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.optional(0, "URL", self.url());
        w.header(0, "Reference");
        w.line(1, "APIVersion", &self.spec.reference.api_version);
        w.line(1, "Kind", &self.spec.reference.kind);
        w.line(1, "Name", &self.spec.reference.name);
        w.optional(1, "Namespace", self.spec.reference.namespace.as_deref());
        if let Some(tls) = &self.spec.tls {
            w.line(0, "TLS Secret", &tls.secret_name);
        }
    }

    fn url(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.url.clone())
    }

    fn has_url() -> bool {
        true
    }
}

/// Resolve a `--ref` value; the target must exist and cannot be a URL.
async fn resolve_reference(env: &CommandEnv, raw: &str, namespace: &str) -> Result<KReference> {
    let target = parse_with_default(raw, DEFAULT_SINK_PREFIX, namespace, &env.prefixes)?;
    let cluster = env.cluster().await?;
    let destination = resolve_sink(cluster.as_ref(), &target).await?;
    destination.reference.ok_or_else(|| {
        KnError::validation(format!("reference '{}' must name a cluster object, not a URL", raw))
    })
}

impl DomainCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            DomainAction::Create(cmd) => cmd.execute(env, out).await,
            DomainAction::Update(cmd) => cmd.execute(env, out).await,
            DomainAction::Delete(cmd) => {
                resource::delete::<DomainMapping>(env, &cmd.ns, &cmd.name, out).await
            }
            DomainAction::List(cmd) => {
                resource::list::<DomainMapping>(env, &cmd.flags, "domain mappings", out).await
            }
            DomainAction::Describe(cmd) => {
                resource::describe::<DomainMapping>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

impl DomainCreate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        FlagRules::new()
            .flag("--ref", self.reference.is_some())
            .required("--ref")?;
        let namespace = env.namespace(&self.ns).await?;
        let reference =
            resolve_reference(env, self.reference.as_deref().unwrap_or_default(), &namespace)
                .await?;
        let mapping = DomainMappingBuilder::new(&self.name, &namespace, reference)
            .tls(self.tls.as_deref())
            .build();
        resource::create(env, &namespace, &mapping, out).await?;
        Ok(())
    }
}

impl DomainUpdate {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let namespace = env.namespace(&self.ns).await?;
        let reference = match &self.reference {
            Some(raw) => Some(resolve_reference(env, raw, &namespace).await?),
            None => None,
        };
        resource::update::<DomainMapping, _>(
            env,
            &namespace,
            &self.name,
            |mapping| {
                Ok(DomainMappingBuilder::from_existing(mapping)
                    .reference(reference.clone())
                    .tls(self.tls.as_deref())
                    .build())
            },
            out,
        )
        .await?;
        Ok(())
    }
}
