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

pub mod broker;
pub mod channel;
pub mod commands;
pub mod completion;
pub mod discovery;
pub mod display;
pub mod domain;
pub mod env;
pub mod eventtype;
pub mod flags;
pub mod resource;
pub mod revision;
pub mod route;
pub mod service;
pub mod source;
pub mod subscription;
pub mod trigger;
pub mod version;

pub use commands::{CliArgs, Commands, GlobalArgs};
pub use env::CommandEnv;

use crate::shared::error::Result;
use std::io::Write;

/// Dispatch one parsed command line. Output goes to `out`; errors are
/// returned for the caller to report.
pub async fn run(args: CliArgs, env: &CommandEnv, out: &mut dyn Write) -> Result<()> {
    match args.command {
        Commands::Service(cmd) => cmd.execute(env, out).await,
        Commands::Revision(cmd) => cmd.execute(env, out).await,
        Commands::Route(cmd) => cmd.execute(env, out).await,
        Commands::Domain(cmd) => cmd.execute(env, out).await,
        Commands::Broker(cmd) => cmd.execute(env, out).await,
        Commands::Trigger(cmd) => cmd.execute(env, out).await,
        Commands::Channel(cmd) => cmd.execute(env, out).await,
        Commands::Subscription(cmd) => cmd.execute(env, out).await,
        Commands::Source(cmd) => cmd.execute(env, out).await,
        Commands::Eventtype(cmd) => cmd.execute(env, out).await,
        Commands::Version(cmd) => cmd.execute(out),
        Commands::Complete(cmd) => cmd.execute(env, out).await,
    }
}
