//! Fill in every component's defaults and print the resulting config

use std::io::Write;

use tracing::info;

use otelop_components::ComponentRegistry;
use otelop_config::CollectorConfig;

use super::write_yaml;

pub fn run(mut config: CollectorConfig, out: &mut impl Write) -> anyhow::Result<()> {
    for event in config.apply_defaults(&ComponentRegistry::builtin())? {
        info!("{event}");
    }
    for path in config.null_objects() {
        info!(path, "null value left in config");
    }
    write_yaml(out, &config)
}
