//! otelop CLI library
//!
//! Each subcommand loads a collector configuration file, runs it through the
//! component registry and writes the result to stdout as YAML. Logs go to
//! stderr so the output can be piped straight into `kubectl apply`.

pub mod commands;

use std::io::Write;

use clap::{Parser, Subcommand};

use otelop_common::telemetry::LogFormat;

/// otelop - Kubernetes values for OpenTelemetry Collector configurations
#[derive(Parser, Debug)]
#[command(name = "otelop", version, about, long_about = None)]
pub struct Cli {
    /// Log format on stderr (pretty or json)
    #[arg(long, global = true, env = "OTELOP_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Service ports of the enabled receivers and exporters
    Ports(commands::ConfigArgs),

    /// Cluster rules plus the namespaced Roles and RoleBindings
    Rbac(commands::rbac::RbacArgs),

    /// Liveness, readiness and startup probes
    Probes(commands::ConfigArgs),

    /// Env vars the collector container needs
    Env(commands::ConfigArgs),

    /// The configuration with every component's defaults filled in
    Defaults(commands::ConfigArgs),

    /// The prometheus receiver rewritten to use a Target Allocator
    TargetAllocator(commands::target_allocator::TargetAllocatorArgs),
}

impl Cli {
    /// Run the selected command, writing its output to `out`
    pub fn run(self, out: &mut impl Write) -> anyhow::Result<()> {
        match self.command {
            Commands::Ports(args) => commands::derive::ports(&args.load()?, out),
            Commands::Rbac(args) => commands::rbac::run(args, out),
            Commands::Probes(args) => commands::derive::probes(&args.load()?, out),
            Commands::Env(args) => commands::derive::env(&args.load()?, out),
            Commands::Defaults(args) => commands::defaults::run(args.load()?, out),
            Commands::TargetAllocator(args) => commands::target_allocator::run(args, out),
        }
    }
}
