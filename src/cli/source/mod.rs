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

//! `kn source`: the four built-in source kinds plus cross-kind listing

pub mod apiserver;
pub mod binding;
pub mod container;
pub mod ping;

use super::discovery::{discover_types, print_types, TypeInfo};
use super::display::human;
use super::display::printer::qualified_name;
use super::display::table::NAMESPACE_HEADER;
use super::display::{print_document, OutputFormat, PrintContext, TableRenderer};
use super::env::CommandEnv;
use super::flags::{ListFlags, NamespaceFlags, SinkFlags};
use super::resource::KnResource;
use crate::domain::builder::MapUpdate;
use crate::domain::reference::sink::{resolve_optional, sink_to_text};
use crate::infrastructure::constants::{LABEL_SOURCE, SOURCES_GROUP};
use crate::infrastructure::kubernetes::resources::{
    ApiServerSource, ContainerSource, Destination, HasSink, PingSource, SinkBinding,
};
use crate::infrastructure::kubernetes::{ClusterApi, TypedApi};
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

use apiserver::ApiServerCommand;
use binding::BindingCommand;
use container::ContainerCommand;
use ping::PingCommand;

#[derive(Args, Debug)]
pub struct SourceCommand {
    #[command(subcommand)]
    pub action: SourceAction,
}

#[derive(Subcommand, Debug)]
pub enum SourceAction {
    /// List sources of every kind
    #[command(visible_alias = "ls")]
    List(SourceList),
    /// List installed source types
    ListTypes(SourceListTypes),
    /// Sources emitting events on a cron schedule
    Ping(PingCommand),
    /// Sources turning API server events into CloudEvents
    Apiserver(ApiServerCommand),
    /// Bindings injecting a sink into pod specs
    Binding(BindingCommand),
    /// Sources running a user supplied container
    Container(ContainerCommand),
}

#[derive(Parser, Debug)]
pub struct SourceList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct SourceListTypes {
    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Output format: json, yaml or name
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    #[arg(long)]
    pub no_headers: bool,
}

/// Resolved `--sink` and parsed `--ce-override` values.
pub struct SinkInput {
    pub sink: Option<Destination>,
    pub overrides: MapUpdate,
}

impl SinkFlags {
    pub async fn resolve(&self, env: &CommandEnv, namespace: &str) -> Result<SinkInput> {
        let overrides = MapUpdate::parse(&self.ce_overrides, "ce-override")?;
        let cluster = env.cluster().await?;
        let sink =
            resolve_optional(cluster.as_ref(), self.sink.as_deref(), namespace, &env.prefixes)
                .await?;
        Ok(SinkInput { sink, overrides })
    }
}

pub fn builtin_source_types() -> Vec<TypeInfo> {
    vec![
        TypeInfo::new(
            "ApiServerSource",
            SOURCES_GROUP,
            "v1",
            "apiserversources",
            "Watch and send Kubernetes API events to a sink",
        ),
        TypeInfo::new(
            "SinkBinding",
            SOURCES_GROUP,
            "v1",
            "sinkbindings",
            "Binding for connecting a PodSpecable to a sink",
        ),
        TypeInfo::new(
            "PingSource",
            SOURCES_GROUP,
            "v1",
            "pingsources",
            "Send periodically ping events to a sink",
        ),
        TypeInfo::new(
            "ContainerSource",
            SOURCES_GROUP,
            "v1",
            "containersources",
            "Generate events by Container image and send to a sink",
        ),
    ]
}

/// One row of the cross-kind listing, plus the document for json/yaml.
struct SourceRow {
    namespace: String,
    name: String,
    qualified: String,
    cells: Vec<String>,
    document: serde_json::Value,
}

async fn collect_kind<K>(
    cluster: Arc<dyn ClusterApi>,
    namespace: Option<&str>,
    ctx: &PrintContext,
    rows: &mut Vec<SourceRow>,
) -> Result<()>
where
    K: KnResource + HasSink,
{
    let api = match namespace {
        Some(ns) => TypedApi::<K>::namespaced(cluster, ns),
        None => TypedApi::<K>::all(cluster),
    };
    let items = match api.list().await {
        Ok(items) => items,
        Err(err) if err.is_not_found() => {
            debug!(kind = api.kind(), "source kind not installed, skipping");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let resource = format!("{}.{}", K::plural(&()), K::group(&()));
    for item in items {
        let sink = sink_to_text(&item.source_spec().sink, &ctx.namespace, &ctx.prefixes);
        rows.push(SourceRow {
            namespace: item.namespace().unwrap_or_default(),
            name: item.name_any(),
            qualified: qualified_name(&item),
            cells: vec![
                item.name_any(),
                K::kind(&()).to_string(),
                resource.clone(),
                sink,
                human::ready(&item),
            ],
            document: serde_json::to_value(&item)?,
        });
    }
    Ok(())
}

/// Same order as single-kind listings: by name, or `default` first in input
/// order and then by namespace and name.
fn sort_rows(rows: &mut [SourceRow], all_namespaces: bool) {
    if all_namespaces {
        rows.sort_by(|a, b| {
            let key = |r: &SourceRow| {
                if r.namespace == "default" {
                    (false, String::new(), String::new())
                } else {
                    (true, r.namespace.clone(), r.name.clone())
                }
            };
            key(a).cmp(&key(b))
        });
    } else {
        rows.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl SourceCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            SourceAction::List(cmd) => cmd.execute(env, out).await,
            SourceAction::ListTypes(cmd) => cmd.execute(env, out).await,
            SourceAction::Ping(cmd) => cmd.execute(env, out).await,
            SourceAction::Apiserver(cmd) => cmd.execute(env, out).await,
            SourceAction::Binding(cmd) => cmd.execute(env, out).await,
            SourceAction::Container(cmd) => cmd.execute(env, out).await,
        }
    }
}

impl SourceList {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let format = self.flags.format()?;
        let cluster = env.cluster().await?;
        let namespace = if self.flags.all_namespaces {
            cluster.default_namespace().to_string()
        } else {
            env.namespace(&self.flags.ns).await?
        };
        let scope = (!self.flags.all_namespaces).then_some(namespace.as_str());

        let mut ctx = env.print_context(&namespace);
        ctx.all_namespaces = self.flags.all_namespaces;
        ctx.no_headers = self.flags.no_headers;

        let mut rows = Vec::new();
        collect_kind::<PingSource>(cluster.clone(), scope, &ctx, &mut rows).await?;
        collect_kind::<ApiServerSource>(cluster.clone(), scope, &ctx, &mut rows).await?;
        collect_kind::<SinkBinding>(cluster.clone(), scope, &ctx, &mut rows).await?;
        collect_kind::<ContainerSource>(cluster, scope, &ctx, &mut rows).await?;
        sort_rows(&mut rows, ctx.all_namespaces);

        match format {
            Some(OutputFormat::Name) => {
                for row in &rows {
                    writeln!(out, "{}", row.qualified)?;
                }
                Ok(())
            }
            Some(format) => {
                let items: Vec<serde_json::Value> = rows.into_iter().map(|r| r.document).collect();
                let document = json!({
                    "apiVersion": "v1",
                    "kind": "List",
                    "metadata": {},
                    "items": items,
                });
                print_document(&document, format, out)
            }
            None if rows.is_empty() => {
                writeln!(out, "No sources found.")?;
                Ok(())
            }
            None => {
                let mut headers = Vec::new();
                if ctx.all_namespaces {
                    headers.push(NAMESPACE_HEADER);
                }
                headers.extend_from_slice(&["NAME", "TYPE", "RESOURCE", "SINK", "READY"]);
                let table_rows = rows
                    .into_iter()
                    .map(|r| {
                        let mut cells = Vec::with_capacity(headers.len());
                        if ctx.all_namespaces {
                            cells.push(r.namespace);
                        }
                        cells.extend(r.cells);
                        cells
                    })
                    .collect();
                write!(
                    out,
                    "{}",
                    TableRenderer::new().render_rows(&headers, table_rows, &ctx)
                )?;
                Ok(())
            }
        }
    }
}

impl SourceListTypes {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let format = OutputFormat::parse_optional(self.output.as_deref(), OutputFormat::LIST)?;
        let namespace = env.namespace(&self.ns).await?;
        let cluster = env.cluster().await?;
        let types = discover_types(
            cluster.as_ref(),
            &namespace,
            LABEL_SOURCE,
            &builtin_source_types(),
        )
        .await?;
        let mut ctx = env.print_context(&namespace);
        ctx.no_headers = self.no_headers;
        print_types(&types, "SourceTypeList", "sources", format, &ctx, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(namespace: &str, name: &str) -> SourceRow {
        SourceRow {
            namespace: namespace.to_string(),
            name: name.to_string(),
            qualified: String::new(),
            cells: Vec::new(),
            document: serde_json::Value::Null,
        }
    }

    fn order(rows: &[SourceRow]) -> Vec<String> {
        rows.iter()
            .map(|r| format!("{}/{}", r.namespace, r.name))
            .collect()
    }

    #[test]
    fn test_sort_rows_across_namespaces() {
        let mut rows = vec![
            row("zeta", "a"),
            row("default", "z"),
            row("alpha", "b"),
            row("default", "a"),
            row("alpha", "a"),
        ];
        sort_rows(&mut rows, true);
        assert_eq!(
            order(&rows),
            vec!["default/z", "default/a", "alpha/a", "alpha/b", "zeta/a"]
        );

        sort_rows(&mut rows, false);
        assert_eq!(order(&rows)[0], "default/a");
    }
}
