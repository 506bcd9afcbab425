//! CLI commands

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use otelop_common::yaml::to_yaml;
use otelop_config::CollectorConfig;

pub mod defaults;
pub mod derive;
pub mod rbac;
pub mod target_allocator;

/// Arguments shared by every command that reads a collector config
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the collector configuration YAML
    #[arg(short = 'f', long = "config")]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> anyhow::Result<CollectorConfig> {
        let content = read_config(&self.config)?;
        CollectorConfig::from_yaml(&content)
            .with_context(|| format!("failed to parse collector config {:?}", self.config))
    }
}

pub(crate) fn read_config(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read config file {path:?}"))
}

pub(crate) fn write_yaml<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    out.write_all(to_yaml(value)?.as_bytes())?;
    Ok(())
}
