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

/// API groups
pub const SERVING_GROUP: &str = "serving.knative.dev";
pub const EVENTING_GROUP: &str = "eventing.knative.dev";
pub const MESSAGING_GROUP: &str = "messaging.knative.dev";
pub const SOURCES_GROUP: &str = "sources.knative.dev";
pub const APIEXTENSIONS_GROUP: &str = "apiextensions.k8s.io";

/// API versions
pub const SERVING_VERSION: &str = "v1";
pub const DOMAIN_MAPPING_VERSION: &str = "v1beta1";
pub const EVENTING_VERSION: &str = "v1";
pub const EVENT_TYPE_VERSION: &str = "v1beta2";
pub const MESSAGING_VERSION: &str = "v1";
pub const SOURCES_VERSION: &str = "v1";

/// Namespace used when neither flag nor kubeconfig context provides one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Update pipeline
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: usize = 5;
pub const UPDATE_BACKOFF_MIN_DELAY_MS: u64 = 10;
pub const UPDATE_BACKOFF_MAX_DELAY_MS: u64 = 1000;
pub const UPDATE_BACKOFF_FACTOR: f32 = 2.0;

/// Readiness waiting
pub const DEFAULT_WAIT_TIMEOUT_SECONDS: u64 = 600;
pub const DEFAULT_ERROR_WINDOW_SECONDS: u64 = 2;
pub const WAIT_POLL_INTERVAL_MS: u64 = 500;

/// Describe output
pub const TRUNCATE_AT: usize = 100;

/// Labels
pub const LABEL_SERVICE: &str = "serving.knative.dev/service";
pub const LABEL_CONFIGURATION_GENERATION: &str = "serving.knative.dev/configurationGeneration";
pub const LABEL_SUBSCRIBABLE: &str = "messaging.knative.dev/subscribable=true";
pub const LABEL_SOURCE: &str = "duck.knative.dev/source=true";

/// Annotations
pub const ANNOTATION_BROKER_CLASS: &str = "eventing.knative.dev/broker.class";
pub const ANNOTATION_MIN_SCALE: &str = "autoscaling.knative.dev/min-scale";
pub const ANNOTATION_MAX_SCALE: &str = "autoscaling.knative.dev/max-scale";

/// Broker class used when `--class` is not given
pub const DEFAULT_BROKER_CLASS: &str = "MTChannelBasedBroker";

/// Default reference prefix for sink flags and domain `--ref`
pub const DEFAULT_SINK_PREFIX: &str = "ksvc";

/// Channel type used by the `imc` alias
pub const IN_MEMORY_CHANNEL_ALIAS: &str = "imc";
pub const IN_MEMORY_CHANNEL_KIND: &str = "InMemoryChannel";

/// ApiServerSource modes
pub const APISERVER_MODE_REFERENCE: &str = "Reference";
pub const APISERVER_MODE_RESOURCE: &str = "Resource";

/// Config file location under the user config directory
pub const CONFIG_DIR_NAME: &str = "kn";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Log filter environment variable
pub const LOG_ENV: &str = "KN_LOG";
