//! Machine readable output: json, yaml, name and url

use crate::shared::error::{KnError, Result};
use kube::{Resource, ResourceExt};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Name,
    Url,
}

impl OutputFormat {
    pub const LIST: &'static [OutputFormat] =
        &[OutputFormat::Json, OutputFormat::Yaml, OutputFormat::Name];
    pub const DESCRIBE_WITH_URL: &'static [OutputFormat] = &[
        OutputFormat::Json,
        OutputFormat::Yaml,
        OutputFormat::Name,
        OutputFormat::Url,
    ];
    pub const DOCUMENT: &'static [OutputFormat] = &[OutputFormat::Json, OutputFormat::Yaml];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Name => "name",
            OutputFormat::Url => "url",
        }
    }

    /// Parse `raw`, accepting only the formats in `allowed`.
    pub fn parse(raw: &str, allowed: &[OutputFormat]) -> Result<Self> {
        allowed
            .iter()
            .copied()
            .find(|f| f.as_str() == raw)
            .ok_or_else(|| KnError::Format {
                format: raw.to_string(),
                allowed: allowed
                    .iter()
                    .map(OutputFormat::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn parse_optional(raw: Option<&str>, allowed: &[OutputFormat]) -> Result<Option<Self>> {
        raw.map(|r| Self::parse(r, allowed)).transpose()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `kind.group/name`, or `kind/name` for the core group.
pub fn qualified_name<K: Resource<DynamicType = ()>>(obj: &K) -> String {
    let kind = K::kind(&()).to_lowercase();
    let group = K::group(&());
    if group.is_empty() {
        format!("{}/{}", kind, obj.name_any())
    } else {
        format!("{}.{}/{}", kind, group, obj.name_any())
    }
}

/// Serialize any document as json or yaml.
pub fn print_document<T: Serialize>(
    value: &T,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        OutputFormat::Yaml => write!(out, "{}", serde_yaml::to_string(value)?)?,
        other => {
            return Err(KnError::Format {
                format: other.to_string(),
                allowed: "json, yaml".to_string(),
            })
        }
    }
    Ok(())
}

/// Print one object. `url` output is handled by the caller.
pub fn print_object<K>(obj: &K, format: OutputFormat, out: &mut dyn Write) -> Result<()>
where
    K: Resource<DynamicType = ()> + Serialize,
{
    match format {
        OutputFormat::Name => {
            writeln!(out, "{}", qualified_name(obj))?;
            Ok(())
        }
        other => print_document(obj, other, out),
    }
}

/// Print a list document. Items keep their own apiVersion and kind; an empty
/// input still yields a list with zero items.
pub fn print_list<K>(items: &[K], format: OutputFormat, out: &mut dyn Write) -> Result<()>
where
    K: Resource<DynamicType = ()> + Serialize,
{
    if format == OutputFormat::Name {
        for item in items {
            writeln!(out, "{}", qualified_name(item))?;
        }
        return Ok(());
    }
    let items = serde_json::to_value(items)?;
    let document = json!({
        "apiVersion": K::api_version(&()),
        "kind": format!("{}List", K::kind(&())),
        "metadata": {},
        "items": items,
    });
    print_document(&document, format, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::resources::{Channel, ChannelSpec};

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert_eq!(
            OutputFormat::parse("yaml", OutputFormat::LIST).unwrap(),
            OutputFormat::Yaml
        );
        let err = OutputFormat::parse("url", OutputFormat::LIST).unwrap_err();
        assert!(matches!(err, KnError::Format { .. }));
        assert!(err.to_string().contains("json, yaml, name"));
    }

    #[test]
    fn test_empty_list_is_not_null() {
        let out = render(|w| print_list::<Channel>(&[], OutputFormat::Json, w));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["kind"], "ChannelList");
        assert_eq!(value["apiVersion"], "messaging.knative.dev/v1");
        assert_eq!(value["items"], json!([]));
    }

    #[test]
    fn test_list_items_carry_type_meta() {
        let items = vec![Channel::new("pipe", ChannelSpec::default())];
        let out = render(|w| print_list(&items, OutputFormat::Yaml, w));
        let value: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(value["items"][0]["kind"], "Channel");
        assert_eq!(value["items"][0]["metadata"]["name"], "pipe");
    }

    #[test]
    fn test_name_format() {
        let ch = Channel::new("pipe", ChannelSpec::default());
        let out = render(|w| print_object(&ch, OutputFormat::Name, w));
        assert_eq!(out, "channel.messaging.knative.dev/pipe\n");
    }
}
