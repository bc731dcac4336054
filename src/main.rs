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

use clap::Parser;
use kn_kube::cli::{self, CliArgs, CommandEnv};
use kn_kube::infrastructure::constants::LOG_ENV;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_http: bool) {
    let filter = if log_http {
        EnvFilter::new("kn_kube=debug,kube_client=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `kn <noun> <verb>` of the failing invocation, for the usage hint.
fn command_path() -> String {
    let words: Vec<String> = std::env::args()
        .skip(1)
        .take_while(|arg| !arg.starts_with('-'))
        .take(2)
        .collect();
    std::iter::once("kn".to_string()).chain(words).collect::<Vec<_>>().join(" ")
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_tracing(args.global.log_http);

    let env = match CommandEnv::from_args(&args.global) {
        Ok(env) => env.with_color(std::io::stdout().is_terminal()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let mut stdout = std::io::stdout();
    if let Err(e) = cli::run(args, &env, &mut stdout).await {
        eprintln!("Error: {}", e);
        if e.is_usage() {
            eprintln!("Run '{} --help' for usage", command_path());
        }
        std::process::exit(e.exit_code());
    }
}
