// CLI command definitions

use super::broker::BrokerCommand;
use super::channel::ChannelCommand;
use super::completion::CompleteCommand;
use super::domain::DomainCommand;
use super::eventtype::EventTypeCommand;
use super::revision::RevisionCommand;
use super::route::RouteCommand;
use super::service::ServiceCommand;
use super::source::SourceCommand;
use super::subscription::SubscriptionCommand;
use super::trigger::TriggerCommand;
use super::version::VersionCommand;
use clap::{Args, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "kn",
    version,
    about = "Manage Knative Serving and Eventing resources",
    long_about = "A command-line client for creating, updating, listing and describing Knative resources on a Kubernetes cluster"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to a single kubeconfig file
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Name of the kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Name of the kubeconfig cluster to use
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Username to impersonate for the operation
    #[arg(long = "as", global = true, value_name = "USER")]
    pub as_user: Option<String>,

    /// UID to impersonate for the operation
    #[arg(long = "as-uid", global = true, value_name = "UID")]
    pub as_uid: Option<String>,

    /// Group to impersonate for the operation, repeatable
    #[arg(long = "as-group", global = true, value_name = "GROUP")]
    pub as_groups: Vec<String>,

    /// Path to the kn configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Log every API request to stderr
    #[arg(long, global = true)]
    pub log_http: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Manage Knative services
    #[command(visible_alias = "ksvc")]
    Service(ServiceCommand),

    /// List, describe and delete revisions
    Revision(RevisionCommand),

    /// List and describe routes
    Route(RouteCommand),

    /// Manage domain mappings
    Domain(DomainCommand),

    /// Manage message brokers
    Broker(BrokerCommand),

    /// Manage event triggers
    Trigger(TriggerCommand),

    /// Manage event channels
    Channel(ChannelCommand),

    /// Manage event subscriptions
    #[command(visible_alias = "sub")]
    Subscription(SubscriptionCommand),

    /// Manage event sources
    Source(SourceCommand),

    /// Manage event types
    Eventtype(EventTypeCommand),

    /// Show the version of this client
    Version(VersionCommand),

    /// Complete resource names for shell completion
    #[command(name = "__complete", hide = true)]
    Complete(CompleteCommand),
}
