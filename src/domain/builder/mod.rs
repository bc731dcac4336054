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

//! Fluent builders turning flag input into resource documents

pub mod domain_mapping;
pub mod eventing;
pub mod messaging;
pub mod overrides;
pub mod resource_requirements;
pub mod service;
pub mod sources;

pub use domain_mapping::DomainMappingBuilder;
pub use eventing::{BrokerBuilder, EventTypeBuilder, TriggerBuilder};
pub use messaging::{channel_reference, parse_channel_type, ChannelBuilder, SubscriptionBuilder};
pub use overrides::{apply_ce_overrides, apply_env, MapUpdate};
pub use service::ServiceBuilder;
pub use sources::{
    parse_apiserver_resource, parse_binding_subject, select_encoding, ApiServerSourceBuilder,
    ContainerSourceBuilder, DataEncoding, PingSourceBuilder, SinkBindingBuilder,
};
