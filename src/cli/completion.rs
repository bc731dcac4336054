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

//! Dynamic completion of resource names for shell completion scripts

use super::env::CommandEnv;
use super::flags::NamespaceFlags;
use super::resource::KnResource;
use crate::infrastructure::kubernetes::resources::{
    ApiServerSource, Broker, Channel, ContainerSource, DomainMapping, EventType, PingSource,
    Revision, Route, Service, SinkBinding, Subscription, Trigger,
};
use crate::shared::error::Result;
use clap::Parser;
use kube::ResourceExt;
use std::io::Write;
use tracing::debug;

/// Verbs taking a single resource name.
const NAME_VERBS: &[&str] = &["describe", "delete", "update", "wait"];

#[derive(Parser, Debug)]
pub struct CompleteCommand {
    #[command(flatten)]
    pub ns: NamespaceFlags,

    /// Command words followed by the word being completed
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

/// What to complete: the resource noun and the partial word.
#[derive(Debug, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    pub noun: &'a str,
    pub to_complete: &'a str,
}

/// Split `<noun> [<kind>] <verb> [ARGS…] <toComplete>`. Returns `None` when
/// the verb takes no name or a name was already given.
pub fn completion_request(words: &[String]) -> Option<CompletionRequest<'_>> {
    let (to_complete, command) = words.split_last()?;
    let (noun, rest) = match command {
        [source, kind, rest @ ..] if source == "source" => (kind.as_str(), rest),
        [noun, rest @ ..] => (noun.as_str(), rest),
        [] => return None,
    };
    let (verb, args) = rest.split_first()?;
    if !NAME_VERBS.contains(&verb.as_str()) {
        return None;
    }
    if args.iter().any(|a| !a.starts_with('-')) {
        return None;
    }
    Some(CompletionRequest {
        noun,
        to_complete: to_complete.as_str(),
    })
}

async fn names<K: KnResource>(env: &CommandEnv, namespace: &str) -> Result<Vec<String>> {
    let api = env.api::<K>(namespace).await?;
    Ok(api.list().await?.iter().map(|item| item.name_any()).collect())
}

async fn names_for(env: &CommandEnv, noun: &str, namespace: &str) -> Result<Vec<String>> {
    match noun {
        "service" | "ksvc" => names::<Service>(env, namespace).await,
        "revision" => names::<Revision>(env, namespace).await,
        "route" => names::<Route>(env, namespace).await,
        "domain" => names::<DomainMapping>(env, namespace).await,
        "broker" => names::<Broker>(env, namespace).await,
        "trigger" => names::<Trigger>(env, namespace).await,
        "channel" => names::<Channel>(env, namespace).await,
        "subscription" | "sub" => names::<Subscription>(env, namespace).await,
        "eventtype" => names::<EventType>(env, namespace).await,
        "ping" => names::<PingSource>(env, namespace).await,
        "apiserver" => names::<ApiServerSource>(env, namespace).await,
        "binding" => names::<SinkBinding>(env, namespace).await,
        "container" => names::<ContainerSource>(env, namespace).await,
        _ => Ok(Vec::new()),
    }
}

impl CompleteCommand {
    /// Never fails: anything that goes wrong yields no suggestions.
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        let Some(request) = completion_request(&self.words) else {
            return Ok(());
        };
        let namespace = match env.namespace(&self.ns).await {
            Ok(ns) => ns,
            Err(err) => {
                debug!(error = %err, "no namespace for completion");
                return Ok(());
            }
        };
        let candidates = match names_for(env, request.noun, &namespace).await {
            Ok(names) => names,
            Err(err) => {
                debug!(noun = request.noun, error = %err, "completion lookup failed");
                return Ok(());
            }
        };
        for name in candidates
            .iter()
            .filter(|n| n.starts_with(request.to_complete))
        {
            writeln!(out, "{}", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_request_for_name_verbs() {
        let w = words(&["service", "describe", "he"]);
        assert_eq!(
            completion_request(&w),
            Some(CompletionRequest {
                noun: "service",
                to_complete: "he"
            })
        );

        let w = words(&["source", "ping", "delete", "--no-wait", ""]);
        assert_eq!(completion_request(&w).unwrap().noun, "ping");
    }

    #[test]
    fn test_no_request_when_name_given_or_verb_unnamed() {
        assert!(completion_request(&words(&["service", "describe", "hello", "x"])).is_none());
        assert!(completion_request(&words(&["service", "list", ""])).is_none());
        assert!(completion_request(&words(&["service"])).is_none());
        assert!(completion_request(&[]).is_none());
    }
}
