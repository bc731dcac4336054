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

//! Channel and Subscription builders

use crate::domain::config::{ChannelType, UserConfig};
use crate::infrastructure::constants::{MESSAGING_GROUP, MESSAGING_VERSION};
use crate::infrastructure::kubernetes::resources::{
    Channel, ChannelSpec, ChannelTemplateSpec, DeliverySpec, Destination, KReference,
    Subscription, SubscriptionSpec,
};
use crate::shared::error::{KnError, Result};

/// Resolve `--type`: an alias first, otherwise `group:version:kind`.
pub fn parse_channel_type(raw: &str, config: &UserConfig) -> Result<ChannelType> {
    if let Some(channel_type) = config.channel_type_alias(raw) {
        return Ok(channel_type);
    }
    let parts: Vec<&str> = raw.split(':').collect();
    match parts.as_slice() {
        [group, version, kind] if !group.is_empty() && !version.is_empty() && !kind.is_empty() => {
            Ok(ChannelType {
                group: group.to_string(),
                version: version.to_string(),
                kind: kind.to_string(),
            })
        }
        _ => Err(KnError::validation(format!(
            "error: incorrect value '{}' for '--type', must be in the format 'Group:Version:Kind' or configure an alias in the kn config",
            raw
        ))),
    }
}

pub struct ChannelBuilder {
    channel: Channel,
}

impl ChannelBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut channel = Channel::new(name, ChannelSpec::default());
        channel.metadata.namespace = Some(namespace.to_string());
        Self { channel }
    }

    pub fn channel_type(mut self, channel_type: Option<&ChannelType>) -> Self {
        self.channel.spec.channel_template = channel_type
            .map(|t| ChannelTemplateSpec::new(&t.group, &t.version, &t.kind));
        self
    }

    pub fn build(self) -> Channel {
        self.channel
    }
}

/// Reference to a channel by name, defaulting to the generic Channel kind.
pub fn channel_reference(raw: &str) -> Result<KReference> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (kind, api_version, name) = match parts.as_slice() {
        [name] => (
            "Channel".to_string(),
            format!("{}/{}", MESSAGING_GROUP, MESSAGING_VERSION),
            name.to_string(),
        ),
        [_, name] => (
            "Channel".to_string(),
            format!("{}/{}", MESSAGING_GROUP, MESSAGING_VERSION),
            name.to_string(),
        ),
        [group, version, kind, name] => (
            kind.to_string(),
            format!("{}/{}", group, version),
            name.to_string(),
        ),
        _ => {
            return Err(KnError::validation(format!(
                "invalid channel '{}', expected NAME, channel:NAME or Group:Version:Kind:NAME",
                raw
            )))
        }
    };
    if name.is_empty() {
        return Err(KnError::validation("channel name must not be empty"));
    }
    Ok(KReference {
        kind,
        namespace: None,
        name,
        api_version,
    })
}

pub struct SubscriptionBuilder {
    subscription: Subscription,
}

impl SubscriptionBuilder {
    pub fn new(name: &str, namespace: &str, channel: KReference) -> Self {
        let mut subscription = Subscription::new(
            name,
            SubscriptionSpec {
                channel,
                subscriber: None,
                reply: None,
                delivery: None,
            },
        );
        subscription.metadata.namespace = Some(namespace.to_string());
        Self { subscription }
    }

    pub fn from_existing(subscription: Subscription) -> Self {
        Self { subscription }
    }

    pub fn subscriber(mut self, sink: Option<Destination>) -> Self {
        if sink.is_some() {
            self.subscription.spec.subscriber = sink;
        }
        self
    }

    pub fn reply(mut self, sink: Option<Destination>) -> Self {
        if sink.is_some() {
            self.subscription.spec.reply = sink;
        }
        self
    }

    pub fn dead_letter_sink(mut self, sink: Option<Destination>) -> Self {
        if let Some(sink) = sink {
            self.subscription
                .spec
                .delivery
                .get_or_insert_with(DeliverySpec::default)
                .dead_letter_sink = Some(sink);
        }
        self
    }

    pub fn build(self) -> Subscription {
        self.subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_forms() {
        let config = UserConfig::default();
        let t = parse_channel_type("messaging.knative.dev:v1:InMemoryChannel", &config).unwrap();
        assert_eq!(t.kind, "InMemoryChannel");
        assert_eq!(parse_channel_type("imc", &config).unwrap(), t);
        assert!(parse_channel_type("foo:bar", &config).is_err());
    }

    #[test]
    fn test_channel_built_with_template() {
        let config = UserConfig::default();
        let t = parse_channel_type("imc", &config).unwrap();
        let channel = ChannelBuilder::new("pipe", "test").channel_type(Some(&t)).build();
        let template = channel.spec.channel_template.unwrap();
        assert_eq!(template.api_version, "messaging.knative.dev/v1");
        assert_eq!(template.group_version(), ("messaging.knative.dev", "v1"));
    }

    #[test]
    fn test_channel_reference_forms() {
        assert_eq!(channel_reference("pipe").unwrap().kind, "Channel");
        assert_eq!(channel_reference("channel:pipe").unwrap().name, "pipe");
        let r = channel_reference("messaging.knative.dev:v1:InMemoryChannel:pipe").unwrap();
        assert_eq!(r.kind, "InMemoryChannel");
        assert!(channel_reference("a:b:c").is_err());
    }
}
