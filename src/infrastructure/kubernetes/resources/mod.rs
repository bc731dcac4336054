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

//! Knative resource types

pub mod common;
pub mod eventing;
pub mod messaging;
pub mod serving;
pub mod sources;

pub use common::{
    Addressable, CloudEventOverrides, Condition, ConditionSeverity, DeliverySpec, Destination,
    HasConditions, KReference, SourceSpec, SourceStatus, Status,
};
pub use eventing::{Broker, BrokerSpec, EventType, EventTypeSpec, Trigger, TriggerFilter, TriggerSpec};
pub use messaging::{Channel, ChannelSpec, ChannelTemplateSpec, Subscription, SubscriptionSpec};
pub use serving::{
    DomainMapping, DomainMappingSpec, Revision, RevisionSpec, RevisionTemplateSpec, Route,
    SecretTls, Service, ServiceSpec, TrafficTarget,
};
pub use sources::{
    ApiServerResource, ApiServerSource, ApiServerSourceSpec, BindingSubject, ContainerSource,
    ContainerSourceSpec, PingSource, PingSourceSpec, SinkBinding, SinkBindingSpec,
};

macro_rules! impl_has_conditions {
    ($($kind:ty),* $(,)?) => {
        $(
            impl HasConditions for $kind {
                fn conditions(&self) -> &[Condition] {
                    self.status
                        .as_ref()
                        .map(|s| s.base.conditions.as_slice())
                        .unwrap_or(&[])
                }
            }
        )*
    };
}

impl_has_conditions!(
    Service,
    Revision,
    Route,
    DomainMapping,
    Broker,
    Trigger,
    EventType,
    Channel,
    Subscription,
    PingSource,
    ApiServerSource,
    SinkBinding,
    ContainerSource,
);

/// Sink carried by a source object, whatever its kind.
pub trait HasSink {
    fn source_spec(&self) -> &SourceSpec;
}

macro_rules! impl_has_sink {
    ($($kind:ty),* $(,)?) => {
        $(
            impl HasSink for $kind {
                fn source_spec(&self) -> &SourceSpec {
                    &self.spec.source
                }
            }
        )*
    };
}

impl_has_sink!(PingSource, ApiServerSource, SinkBinding, ContainerSource);
