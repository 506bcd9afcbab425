//! otelop - derive Kubernetes values from an OpenTelemetry Collector config

use clap::Parser;

use otelop_cli::Cli;
use otelop_common::telemetry::{init_logging, LoggingConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        format: cli.log_format,
        ..Default::default()
    })?;

    let mut stdout = std::io::stdout().lock();
    cli.run(&mut stdout)
}
