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

//! `kn route`

use super::display::human;
use super::display::{DescribeWriter, PrintContext, Printable};
use super::env::CommandEnv;
use super::flags::{DescribeFlags, ListFlags};
use super::resource::{self, Describable};
use crate::infrastructure::kubernetes::resources::{Route, TrafficTarget};
use crate::shared::error::Result;
use clap::{Args, Parser, Subcommand};
use kube::ResourceExt;
use std::io::Write;

#[derive(Args, Debug)]
pub struct RouteCommand {
    #[command(subcommand)]
    pub action: RouteAction,
}

#[derive(Subcommand, Debug)]
pub enum RouteAction {
    /// List routes
    #[command(visible_alias = "ls")]
    List(RouteList),
    /// Show details of a route
    Describe(RouteDescribe),
}

#[derive(Parser, Debug)]
pub struct RouteList {
    #[command(flatten)]
    pub flags: ListFlags,
}

#[derive(Parser, Debug)]
pub struct RouteDescribe {
    pub name: String,

    #[command(flatten)]
    pub flags: DescribeFlags,
}

/// Revision (or configuration) name with an optional `#tag`.
pub fn target_label(target: &TrafficTarget) -> String {
    let name = target
        .revision_name
        .as_deref()
        .or(target.configuration_name.as_deref())
        .unwrap_or_default();
    match &target.tag {
        Some(tag) => format!("{} #{}", name, tag),
        None => name.to_string(),
    }
}

/// `100% -> rev-00001` style traffic summary.
pub fn traffic_text(target: &TrafficTarget) -> String {
    format!("{}% -> {}", target.percent.unwrap_or(0), target_label(target))
}

fn route_traffic(route: &Route) -> &[TrafficTarget] {
    route
        .status
        .as_ref()
        .map(|s| s.traffic.as_slice())
        .filter(|t| !t.is_empty())
        .unwrap_or(route.spec.traffic.as_slice())
}

impl Printable for Route {
    const HEADERS: &'static [&'static str] = &["NAME", "URL", "READY"];

    fn row(&self, _ctx: &PrintContext) -> Vec<String> {
        vec![
            self.name_any(),
            self.url().unwrap_or_default(),
            human::ready(self),
        ]
    }
}

impl Describable for Route {
    fn describe(&self, w: &mut DescribeWriter, _ctx: &PrintContext) {
        w.metadata(&self.metadata);
        w.optional(0, "URL", self.url());
        let traffic = route_traffic(self);
        if !traffic.is_empty() {
            w.header(0, "Traffic Targets");
            for target in traffic {
                w.line(1, &format!("{}%", target.percent.unwrap_or(0)), target_label(target));
            }
        }
    }

    fn url(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.url.clone())
    }

    fn has_url() -> bool {
        true
    }
}

impl RouteCommand {
    pub async fn execute(&self, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
        match &self.action {
            RouteAction::List(cmd) => {
                resource::list::<Route>(env, &cmd.flags, "routes", out).await
            }
            RouteAction::Describe(cmd) => {
                resource::describe::<Route>(env, &cmd.flags, &cmd.name, out).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traffic_text() {
        let target = TrafficTarget {
            revision_name: Some("hello-00001".to_string()),
            percent: Some(100),
            tag: Some("current".to_string()),
            ..Default::default()
        };
        assert_eq!(traffic_text(&target), "100% -> hello-00001 #current");
    }
}
