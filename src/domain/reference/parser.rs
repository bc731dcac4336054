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

/// `prefix:name[:namespace]` after splitting. Nothing is validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub prefix: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRef {
    Url(String),
    Named(ResourceRef),
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Split a user reference. A bare name takes `default_prefix`.
pub fn parse_ref(input: &str, default_prefix: &str) -> ParsedRef {
    if is_url(input) {
        return ParsedRef::Url(input.to_string());
    }
    let parts: Vec<&str> = input.splitn(3, ':').collect();
    let resource_ref = match parts.as_slice() {
        [name] => ResourceRef {
            prefix: default_prefix.to_string(),
            name: name.to_string(),
            namespace: String::new(),
        },
        [prefix, name] => ResourceRef {
            prefix: prefix.to_string(),
            name: name.to_string(),
            namespace: String::new(),
        },
        [prefix, name, namespace, ..] => ResourceRef {
            prefix: prefix.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        },
        [] => ResourceRef {
            prefix: default_prefix.to_string(),
            name: String::new(),
            namespace: String::new(),
        },
    };
    ParsedRef::Named(resource_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(prefix: &str, name: &str, namespace: &str) -> ParsedRef {
        ParsedRef::Named(ResourceRef {
            prefix: prefix.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse_ref("mysvc", "ksvc"), named("ksvc", "mysvc", ""));
        assert_eq!(parse_ref("broker:default", "ksvc"), named("broker", "default", ""));
        assert_eq!(parse_ref("svc:foo:other", "ksvc"), named("svc", "foo", "other"));
        assert_eq!(
            parse_ref("https://example.com/path", "ksvc"),
            ParsedRef::Url("https://example.com/path".to_string())
        );
    }

    #[test]
    fn test_extra_colons_stay_in_namespace() {
        assert_eq!(parse_ref("a:b:c:d", "ksvc"), named("a", "b", "c:d"));
    }
}
