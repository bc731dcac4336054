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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, KnError>;

#[derive(Error, Debug)]
pub enum KnError {
    /// Wrong argument count, conflicting or missing flags.
    #[error("{0}")]
    Usage(String),

    #[error("no kubeconfig has been provided, please use a valid configuration to connect to the cluster")]
    NoKubeconfig,

    #[error("can not find config file: '{0}'")]
    ConfigFileNotFound(String),

    #[error("config file '{0}' can not be found; multiple paths are not supported with --kubeconfig, use the KUBECONFIG environment variable instead")]
    MultipleConfigsNotSupported(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("sink is required, use --sink to specify one")]
    SinkRequired,

    #[error("invalid sink '{sink}': {source}")]
    SinkInvalid {
        sink: String,
        #[source]
        source: Box<KnError>,
    },

    /// Server message is kept verbatim, it already names the resource.
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    AlreadyExists { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("can't update {kind} '{name}' because it has been marked for deletion")]
    MarkedForDeletion { kind: String, name: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("failed to reach the cluster: {0}")]
    Transport(#[source] kube::Error),

    #[error("invalid output format '{format}', allowed formats are: {allowed}")]
    Format { format: String, allowed: String },

    #[error("invalid encoding '{0}', allowed values are: text, base64")]
    InvalidEncoding(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("{kind} '{name}' is not ready: {reason}")]
    NotReady {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<kube::Error> for KnError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) => match ae.code {
                404 => KnError::NotFound {
                    message: ae.message,
                },
                409 if ae.reason == "AlreadyExists" => KnError::AlreadyExists {
                    message: ae.message,
                },
                409 => KnError::Conflict {
                    message: ae.message,
                },
                403 => KnError::Forbidden(ae.message),
                code => KnError::Api {
                    code,
                    message: ae.message,
                },
            },
            other => KnError::Transport(other),
        }
    }
}

impl KnError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn sink_invalid(sink: impl Into<String>, cause: KnError) -> Self {
        Self::SinkInvalid {
            sink: sink.into(),
            source: Box::new(cause),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KnError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, KnError::Conflict { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, KnError::Forbidden(_))
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, KnError::Usage(_) | KnError::Format { .. })
    }

    /// Process exit status for this error; only its non-zero-ness is contract.
    pub fn exit_code(&self) -> i32 {
        if self.is_usage() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_not_found_keeps_server_message() {
        let err: KnError = api_error(404, "NotFound", "channels.messaging.knative.dev \"pipe\" not found").into();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "channels.messaging.knative.dev \"pipe\" not found"
        );
    }

    #[test]
    fn test_conflict_classification() {
        let exists: KnError = api_error(409, "AlreadyExists", "already exists").into();
        assert!(matches!(exists, KnError::AlreadyExists { .. }));

        let conflict: KnError = api_error(409, "Conflict", "object has been modified").into();
        assert!(conflict.is_conflict());
    }

    #[test]
    fn test_forbidden_and_other_codes() {
        let forbidden: KnError = api_error(403, "Forbidden", "forbidden").into();
        assert!(forbidden.is_forbidden());

        let other: KnError = api_error(500, "InternalError", "boom").into();
        assert!(matches!(other, KnError::Api { code: 500, .. }));
        assert_eq!(other.exit_code(), 1);
    }

    #[test]
    fn test_sink_invalid_wraps_cause() {
        let cause = KnError::NotFound {
            message: "services.serving.knative.dev \"mysvc\" not found".to_string(),
        };
        let err = KnError::sink_invalid("ksvc:mysvc", cause);
        assert!(err.to_string().contains("services.serving.knative.dev \"mysvc\" not found"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_usage_exit_code() {
        assert_eq!(KnError::usage("bad").exit_code(), 2);
    }
}
