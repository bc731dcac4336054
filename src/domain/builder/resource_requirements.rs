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

use crate::shared::error::{KnError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Parse `cpu=100m,memory=64Mi`.
pub fn parse(raw: &str, flag: &str) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for pair in raw.split(',').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                values.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(KnError::usage(format!(
                    "invalid --{} '{}', expected cpu=VALUE,memory=VALUE",
                    flag, raw
                )))
            }
        }
    }
    Ok(values)
}

pub fn quantities(values: &BTreeMap<String, String>) -> BTreeMap<String, Quantity> {
    values
        .iter()
        .map(|(k, v)| (k.clone(), Quantity(v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirements() {
        let values = parse("cpu=100m,memory=64Mi", "request").unwrap();
        assert_eq!(values["cpu"], "100m");
        assert_eq!(quantities(&values)["memory"].0, "64Mi");
        assert!(parse("cpu", "request").is_err());
    }
}
