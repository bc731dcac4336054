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

use crate::infrastructure::kubernetes::resources::{
    DomainMapping, DomainMappingSpec, KReference, SecretTls,
};

pub struct DomainMappingBuilder {
    mapping: DomainMapping,
}

impl DomainMappingBuilder {
    pub fn new(name: &str, namespace: &str, reference: KReference) -> Self {
        let mut mapping = DomainMapping::new(
            name,
            DomainMappingSpec {
                reference,
                tls: None,
            },
        );
        mapping.metadata.namespace = Some(namespace.to_string());
        Self { mapping }
    }

    pub fn from_existing(mapping: DomainMapping) -> Self {
        Self { mapping }
    }

    pub fn reference(mut self, reference: Option<KReference>) -> Self {
        if let Some(reference) = reference {
            self.mapping.spec.reference = reference;
        }
        self
    }

    /// An empty secret name removes TLS.
    pub fn tls(mut self, secret: Option<&str>) -> Self {
        match secret {
            Some("") => self.mapping.spec.tls = None,
            Some(secret) => {
                self.mapping.spec.tls = Some(SecretTls {
                    secret_name: secret.to_string(),
                })
            }
            None => {}
        }
        self
    }

    pub fn build(self) -> DomainMapping {
        self.mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_set_and_cleared() {
        let reference = KReference {
            kind: "Service".to_string(),
            namespace: Some("default".to_string()),
            name: "hello".to_string(),
            api_version: "serving.knative.dev/v1".to_string(),
        };
        let mapping = DomainMappingBuilder::new("hello.example.com", "default", reference)
            .tls(Some("cert"))
            .build();
        assert_eq!(mapping.spec.tls.as_ref().unwrap().secret_name, "cert");
        let mapping = DomainMappingBuilder::from_existing(mapping).tls(Some("")).build();
        assert!(mapping.spec.tls.is_none());
    }
}
