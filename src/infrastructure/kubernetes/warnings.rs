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

//! Server-sent `Warning` headers, each printed once per process

use http::header::WARNING;
use http::{HeaderMap, Response};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Text of a `Warning` header value: `299 - "text"` yields `text`.
pub fn warning_text(raw: &str) -> String {
    let quoted = raw
        .find('"')
        .zip(raw.rfind('"'))
        .filter(|(start, end)| end > start);
    match quoted {
        Some((start, end)) => raw[start + 1..end]
            .replace("\\\"", "\"")
            .replace("\\\\", "\\"),
        None => raw.trim().to_string(),
    }
}

/// Remembers the warnings already shown. Clones share the same memory.
#[derive(Debug, Clone, Default)]
pub struct WarningDeduplicator {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl WarningDeduplicator {
    /// Warnings in `headers` that were not seen before, in header order.
    pub fn unseen(&self, headers: &HeaderMap) -> Vec<String> {
        let Ok(mut seen) = self.seen.lock() else {
            return Vec::new();
        };
        headers
            .get_all(WARNING)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(warning_text)
            .filter(|text| !text.is_empty() && seen.insert(text.clone()))
            .collect()
    }

    /// Print new warnings of a response to stderr and hand the response on.
    pub fn inspect<B>(&self, response: Response<B>) -> Response<B> {
        for warning in self.unseen(response.headers()) {
            debug!(warning = %warning, "server warning");
            eprintln!("Warning: {}", warning);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(WARNING, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_warning_text() {
        assert_eq!(
            warning_text(r#"299 - "autoscaling/v2beta2 is deprecated""#),
            "autoscaling/v2beta2 is deprecated"
        );
        assert_eq!(warning_text(r#"299 - "say \"hi\"""#), r#"say "hi""#);
        assert_eq!(warning_text(" plain "), "plain");
    }

    #[test]
    fn test_each_warning_reported_once() {
        let dedup = WarningDeduplicator::default();
        let first = dedup.unseen(&headers(&[
            r#"299 - "field is deprecated""#,
            r#"299 - "field is deprecated""#,
            r#"299 - "other""#,
        ]));
        assert_eq!(first, vec!["field is deprecated", "other"]);

        let shared = dedup.clone();
        let second = shared.unseen(&headers(&[r#"299 - "other""#, r#"299 - "new""#]));
        assert_eq!(second, vec!["new"]);
        assert!(dedup.unseen(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_inspect_passes_response_through() {
        let dedup = WarningDeduplicator::default();
        let mut response = Response::new("body");
        response
            .headers_mut()
            .insert(WARNING, HeaderValue::from_static(r#"299 - "x""#));
        let response = dedup.inspect(response);
        assert_eq!(*response.body(), "body");
        assert!(dedup.unseen(response.headers()).is_empty());
    }
}
