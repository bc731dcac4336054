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

//! Broker, Trigger and EventType builders

use super::overrides::MapUpdate;
use crate::infrastructure::constants::{
    ANNOTATION_BROKER_CLASS, DEFAULT_BROKER_CLASS, EVENTING_GROUP, EVENTING_VERSION,
};
use crate::infrastructure::kubernetes::resources::{
    Broker, BrokerSpec, DeliverySpec, Destination, EventType, EventTypeSpec, KReference, Trigger,
    TriggerFilter, TriggerSpec,
};
use crate::shared::error::{KnError, Result};
use std::collections::BTreeMap;

pub struct BrokerBuilder {
    broker: Broker,
}

impl BrokerBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut broker = Broker::new(name, BrokerSpec::default());
        broker.metadata.namespace = Some(namespace.to_string());
        Self { broker }
    }

    /// Class annotation; defaults to the multi-tenant channel based broker.
    pub fn class(mut self, class: Option<&str>) -> Self {
        self.broker
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(
                ANNOTATION_BROKER_CLASS.to_string(),
                class.unwrap_or(DEFAULT_BROKER_CLASS).to_string(),
            );
        self
    }

    pub fn dead_letter_sink(mut self, sink: Option<Destination>) -> Self {
        if let Some(sink) = sink {
            self.broker
                .spec
                .delivery
                .get_or_insert_with(DeliverySpec::default)
                .dead_letter_sink = Some(sink);
        }
        self
    }

    pub fn build(self) -> Broker {
        self.broker
    }
}

pub struct TriggerBuilder {
    trigger: Trigger,
}

impl TriggerBuilder {
    pub fn new(name: &str, namespace: &str, broker: &str) -> Self {
        let mut trigger = Trigger::new(
            name,
            TriggerSpec {
                broker: broker.to_string(),
                ..Default::default()
            },
        );
        trigger.metadata.namespace = Some(namespace.to_string());
        Self { trigger }
    }

    pub fn from_existing(trigger: Trigger) -> Self {
        Self { trigger }
    }

    pub fn filters(mut self, update: &MapUpdate) -> Self {
        if update.is_empty() {
            return self;
        }
        let mut attributes = self
            .trigger
            .spec
            .filter
            .take()
            .map(|f| f.attributes)
            .unwrap_or_default();
        update.apply(&mut attributes);
        self.trigger.spec.filter = (!attributes.is_empty()).then_some(TriggerFilter { attributes });
        self
    }

    pub fn subscriber(mut self, sink: Option<Destination>) -> Self {
        if let Some(sink) = sink {
            self.trigger.spec.subscriber = sink;
        }
        self
    }

    pub fn build(self) -> Result<Trigger> {
        if self.trigger.spec.subscriber.is_empty() {
            return Err(KnError::SinkRequired);
        }
        Ok(self.trigger)
    }
}

pub struct EventTypeBuilder {
    event_type: EventType,
}

impl EventTypeBuilder {
    pub fn new(name: &str, namespace: &str, type_: &str) -> Self {
        let mut event_type = EventType::new(
            name,
            EventTypeSpec {
                type_: type_.to_string(),
                ..Default::default()
            },
        );
        event_type.metadata.namespace = Some(namespace.to_string());
        Self { event_type }
    }

    /// The source must be a valid URI reference.
    pub fn source(mut self, source: Option<&str>) -> Result<Self> {
        if let Some(source) = source {
            url::Url::parse(source)?;
            self.event_type.spec.source = Some(source.to_string());
        }
        Ok(self)
    }

    pub fn description(mut self, description: Option<&str>) -> Self {
        self.event_type.spec.description = description.map(str::to_string);
        self
    }

    /// Reference the broker by name in the event type's namespace.
    pub fn broker(mut self, broker: &str) -> Self {
        let namespace = self.event_type.metadata.namespace.clone();
        self.event_type.spec.reference = Some(KReference {
            kind: "Broker".to_string(),
            namespace,
            name: broker.to_string(),
            api_version: format!("{}/{}", EVENTING_GROUP, EVENTING_VERSION),
        });
        self
    }

    pub fn reference(mut self, reference: KReference) -> Self {
        self.event_type.spec.reference = Some(reference);
        self
    }

    pub fn build(self) -> Result<EventType> {
        if self.event_type.spec.type_.is_empty() {
            return Err(KnError::usage("'--type' is required"));
        }
        Ok(self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_class_default() {
        let broker = BrokerBuilder::new("b", "default").class(None).build();
        assert_eq!(
            broker.metadata.annotations.unwrap()[ANNOTATION_BROKER_CLASS],
            DEFAULT_BROKER_CLASS
        );
    }

    #[test]
    fn test_trigger_filters_add_remove() {
        let values: Vec<String> = vec!["type=dev.event".into(), "source=x".into()];
        let trigger = TriggerBuilder::new("t", "default", "default")
            .filters(&MapUpdate::parse(&values, "filter").unwrap())
            .subscriber(Some(Destination::from_uri("http://x")))
            .build()
            .unwrap();
        let trigger = TriggerBuilder::from_existing(trigger)
            .filters(&MapUpdate::parse(&["source-".to_string()], "filter").unwrap())
            .build()
            .unwrap();
        let attrs = trigger.spec.filter.unwrap().attributes;
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["type"], "dev.event");
    }

    #[test]
    fn test_event_type_source_must_be_url() {
        assert!(EventTypeBuilder::new("e", "default", "dev.t")
            .source(Some("not a url"))
            .is_err());
        let et = EventTypeBuilder::new("e", "default", "dev.t")
            .source(Some("https://example.com/src"))
            .unwrap()
            .broker("default")
            .build()
            .unwrap();
        assert_eq!(et.spec.reference.unwrap().kind, "Broker");
    }
}
