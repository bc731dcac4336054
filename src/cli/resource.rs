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

//! The create/update/delete/list/describe shape shared by every noun

use super::display::{
    print_list, print_object, sort_for_listing, DescribeWriter, OutputFormat, PrintContext,
    Printable, TableRenderer,
};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, ListFlags, NamespaceFlags};
use crate::domain::update_with_retry;
use crate::infrastructure::constants::DEFAULT_MAX_UPDATE_ATTEMPTS;
use crate::infrastructure::kubernetes::resources::HasConditions;
use crate::infrastructure::kubernetes::TypedApi;
use crate::shared::error::Result;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use tokio::time::Instant;
use tracing::debug;

/// Describe body of one resource kind. Conditions are appended by the caller.
pub trait Describable {
    fn describe(&self, w: &mut DescribeWriter, ctx: &PrintContext);

    /// Address printed by `describe -o url`; `None` when the kind has none.
    fn url(&self) -> Option<String> {
        None
    }

    /// Whether `-o url` is offered at all.
    fn has_url() -> bool {
        false
    }
}

/// Everything a resource kind needs for the generic verbs.
pub trait KnResource:
    Resource<DynamicType = ()>
    + Serialize
    + DeserializeOwned
    + Clone
    + Send
    + Sync
    + Printable
    + Describable
    + HasConditions
{
}

impl<K> KnResource for K where
    K: Resource<DynamicType = ()>
        + Serialize
        + DeserializeOwned
        + Clone
        + Send
        + Sync
        + Printable
        + Describable
        + HasConditions
{
}

/// `<Kind> '<name>' <verb> in namespace '<ns>'.`
pub fn report(
    out: &mut dyn Write,
    kind: &str,
    name: &str,
    verb: &str,
    namespace: &str,
) -> Result<()> {
    writeln!(
        out,
        "{} '{}' {} in namespace '{}'.",
        kind, name, verb, namespace
    )?;
    Ok(())
}

pub async fn create<K: KnResource>(
    env: &CommandEnv,
    namespace: &str,
    obj: &K,
    out: &mut dyn Write,
) -> Result<K> {
    let api: TypedApi<K> = env.api(namespace).await?;
    let created = api.create(obj).await?;
    let name = obj.meta().name.clone().unwrap_or_default();
    report(out, api.kind(), &name, "created", namespace)?;
    Ok(created)
}

/// Run `mutate` through the retrying update pipeline and report it.
pub async fn update<K, F>(
    env: &CommandEnv,
    namespace: &str,
    name: &str,
    mutate: F,
    out: &mut dyn Write,
) -> Result<K>
where
    K: KnResource,
    F: FnMut(K) -> Result<K>,
{
    update_until(env, namespace, name, env.deadline(), mutate, out).await
}

/// Like [`update`], starting no conflict retry after `deadline`.
pub async fn update_until<K, F>(
    env: &CommandEnv,
    namespace: &str,
    name: &str,
    deadline: Instant,
    mutate: F,
    out: &mut dyn Write,
) -> Result<K>
where
    K: KnResource,
    F: FnMut(K) -> Result<K>,
{
    let api: TypedApi<K> = env.api(namespace).await?;
    let updated =
        update_with_retry(&api, name, DEFAULT_MAX_UPDATE_ATTEMPTS, Some(deadline), mutate).await?;
    report(out, api.kind(), name, "updated", namespace)?;
    Ok(updated)
}

pub async fn delete<K: KnResource>(
    env: &CommandEnv,
    flags: &NamespaceFlags,
    name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let namespace = env.namespace(flags).await?;
    let api: TypedApi<K> = env.api(&namespace).await?;
    api.delete(name).await?;
    report(out, api.kind(), name, "deleted", &namespace)
}

pub async fn list<K: KnResource>(
    env: &CommandEnv,
    flags: &ListFlags,
    plural: &str,
    out: &mut dyn Write,
) -> Result<()> {
    list_selected::<K>(env, flags, None, plural, out).await
}

/// List, optionally narrowed by a label selector.
pub async fn list_selected<K: KnResource>(
    env: &CommandEnv,
    flags: &ListFlags,
    selector: Option<&str>,
    plural: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let format = flags.format()?;
    let cluster = env.cluster().await?;
    let (api, namespace) = if flags.all_namespaces {
        let ns = cluster.default_namespace().to_string();
        (TypedApi::<K>::all(cluster), ns)
    } else {
        let ns = env.namespace(&flags.ns).await?;
        (TypedApi::<K>::namespaced(cluster, &ns), ns)
    };
    let items = match selector {
        Some(selector) => api.list_with_labels(selector).await?,
        None => api.list().await?,
    };
    debug!(kind = api.kind(), count = items.len(), "listed");

    let mut ctx = env.print_context(&namespace);
    ctx.all_namespaces = flags.all_namespaces;
    ctx.no_headers = flags.no_headers;
    print_items(items, format, &ctx, plural, out)
}

pub fn print_items<K: KnResource>(
    mut items: Vec<K>,
    format: Option<OutputFormat>,
    ctx: &PrintContext,
    plural: &str,
    out: &mut dyn Write,
) -> Result<()> {
    sort_for_listing(&mut items, ctx.all_namespaces);
    if let Some(format) = format {
        return print_list(&items, format, out);
    }
    if items.is_empty() {
        writeln!(out, "No {} found.", plural)?;
        return Ok(());
    }
    write!(out, "{}", TableRenderer::new().render(&items, ctx))?;
    Ok(())
}

pub async fn describe<K: KnResource>(
    env: &CommandEnv,
    flags: &DescribeFlags,
    name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let allowed = if K::has_url() {
        OutputFormat::DESCRIBE_WITH_URL
    } else {
        OutputFormat::LIST
    };
    let format = OutputFormat::parse_optional(flags.output.as_deref(), allowed)?;
    let namespace = env.namespace(&flags.ns).await?;
    let api: TypedApi<K> = env.api(&namespace).await?;
    let obj = api.get(name).await?;

    match format {
        Some(OutputFormat::Url) => {
            writeln!(out, "{}", obj.url().unwrap_or_default())?;
            Ok(())
        }
        Some(format) => print_object(&obj, format, out),
        None => {
            let ctx = env.print_context(&namespace);
            let mut w = DescribeWriter::new(flags.verbose, env.color);
            obj.describe(&mut w, &ctx);
            w.conditions(obj.conditions());
            write!(out, "{}", w.finish())?;
            Ok(())
        }
    }
}
