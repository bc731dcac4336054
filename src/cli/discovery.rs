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

//! Discovery of installed channel and source types through their CRDs

use super::display::{print_document, OutputFormat, PrintContext, TableRenderer};
use crate::infrastructure::constants::APIEXTENSIONS_GROUP;
use crate::infrastructure::kubernetes::{dynamic_resource, ClusterApi};
use crate::shared::error::{KnError, Result};
use kube::api::{ApiResource, DynamicObject};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

/// One installed (or built-in) type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub name: String,
    pub kind: String,
    pub group: String,
    pub version: String,
    pub plural: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl TypeInfo {
    pub fn new(kind: &str, group: &str, version: &str, plural: &str, description: &str) -> Self {
        Self {
            name: format!("{}.{}", plural, group),
            kind: kind.to_string(),
            group: group.to_string(),
            version: version.to_string(),
            plural: plural.to_string(),
            description: description.to_string(),
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        dynamic_resource(&self.group, &self.version, &self.kind, &self.plural)
    }

    /// Read kind, group, plural and the first served version from a CRD.
    fn from_crd(crd: &DynamicObject) -> Option<Self> {
        let spec = crd.data.get("spec")?;
        let names = spec.get("names")?;
        let kind = names.get("kind")?.as_str()?;
        let plural = names.get("plural")?.as_str()?;
        let group = spec.get("group")?.as_str()?;
        let version = spec
            .get("versions")?
            .as_array()?
            .iter()
            .find(|v| v.get("served").and_then(|s| s.as_bool()).unwrap_or(false))
            .and_then(|v| v.get("name"))
            .and_then(|n| n.as_str())?;
        Some(Self::new(kind, group, version, plural, ""))
    }
}

fn crd_resource() -> ApiResource {
    dynamic_resource(
        APIEXTENSIONS_GROUP,
        "v1",
        "CustomResourceDefinition",
        "customresourcedefinitions",
    )
}

/// Types installed as CRDs carrying `label`. When CRDs may not be listed,
/// fall back to the built-ins that can themselves be listed in `namespace`.
pub async fn discover_types(
    cluster: &dyn ClusterApi,
    namespace: &str,
    label: &str,
    builtins: &[TypeInfo],
) -> Result<Vec<TypeInfo>> {
    match cluster.list(&crd_resource(), None, Some(label)).await {
        Ok(crds) => {
            let mut types: Vec<TypeInfo> = crds.iter().filter_map(TypeInfo::from_crd).collect();
            for t in types.iter_mut() {
                if let Some(builtin) = builtins.iter().find(|b| b.kind == t.kind && b.group == t.group) {
                    t.description = builtin.description.clone();
                }
            }
            types.sort_by(|a, b| a.kind.cmp(&b.kind));
            Ok(types)
        }
        Err(err) if err.is_forbidden() => {
            warn!(error = %err, "listing CRDs is forbidden, probing built-in types");
            let mut available = Vec::new();
            for builtin in builtins {
                match cluster.list(&builtin.api_resource(), Some(namespace), None).await {
                    Ok(_) => available.push(builtin.clone()),
                    Err(e) => debug!(kind = %builtin.kind, error = %e, "built-in type unavailable"),
                }
            }
            Ok(available)
        }
        Err(err) => Err(err),
    }
}

/// Print discovered types. With no types and no output format, `noun` is
/// used for the "nothing installed" error.
pub fn print_types(
    types: &[TypeInfo],
    list_kind: &str,
    noun: &str,
    format: Option<OutputFormat>,
    ctx: &PrintContext,
    out: &mut dyn Write,
) -> Result<()> {
    if let Some(format) = format {
        let document = json!({
            "apiVersion": "client.knative.dev/v1alpha1",
            "kind": list_kind,
            "items": serde_json::to_value(types)?,
        });
        return match format {
            OutputFormat::Name => {
                for t in types {
                    writeln!(out, "{}", t.name)?;
                }
                Ok(())
            }
            other => print_document(&document, other, out),
        };
    }
    if types.is_empty() {
        return Err(KnError::validation(format!(
            "no {} found on the backend, please verify the installation",
            noun
        )));
    }
    let rows = types
        .iter()
        .map(|t| vec![t.kind.clone(), t.name.clone(), t.description.clone()])
        .collect();
    write!(
        out,
        "{}",
        TableRenderer::new().render_rows(&["TYPE", "NAME", "DESCRIPTION"], rows, ctx)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reference::PrefixTable;
    use crate::infrastructure::kubernetes::fake::FakeCluster;

    fn crd(kind: &str, plural: &str, label: &str) -> DynamicObject {
        let mut obj = DynamicObject::new(&format!("{}.messaging.knative.dev", plural), &crd_resource());
        let (k, v) = label.split_once('=').unwrap();
        obj.metadata.labels = Some([(k.to_string(), v.to_string())].into_iter().collect());
        obj.data = json!({
            "spec": {
                "group": "messaging.knative.dev",
                "names": {"kind": kind, "plural": plural},
                "versions": [{"name": "v1beta1", "served": false}, {"name": "v1", "served": true}],
            }
        });
        obj
    }

    fn builtins() -> Vec<TypeInfo> {
        vec![TypeInfo::new(
            "InMemoryChannel",
            "messaging.knative.dev",
            "v1",
            "inmemorychannels",
            "The events are stored in memory",
        )]
    }

    #[tokio::test]
    async fn test_discovers_labelled_crds() {
        let fake = FakeCluster::default();
        let label = "messaging.knative.dev/subscribable=true";
        fake.insert_dynamic(&crd_resource(), crd("InMemoryChannel", "inmemorychannels", label));
        fake.insert_dynamic(&crd_resource(), crd("Other", "others", "app=x"));

        let types = discover_types(&fake, "default", label, &builtins()).await.unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].version, "v1");
        assert_eq!(types[0].description, "The events are stored in memory");
    }

    #[tokio::test]
    async fn test_forbidden_falls_back_to_builtins() {
        let fake = FakeCluster::default();
        fake.forbid_list("customresourcedefinitions");
        let types = discover_types(&fake, "default", "x=y", &builtins()).await.unwrap();
        assert_eq!(types, builtins());

        fake.forbid_list("inmemorychannels");
        let types = discover_types(&fake, "default", "x=y", &builtins()).await.unwrap();
        assert!(types.is_empty());
    }

    #[test]
    fn test_empty_table_is_an_error_unless_formatted() {
        let ctx = PrintContext::new("default", PrefixTable::with_defaults());
        let mut out = Vec::new();
        let err = print_types(&[], "ChannelTypeList", "channels", None, &ctx, &mut out).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no channels found on the backend, please verify the installation"
        );
        print_types(&[], "ChannelTypeList", "channels", Some(OutputFormat::Json), &ctx, &mut out)
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\"items\": []"));
    }
}
