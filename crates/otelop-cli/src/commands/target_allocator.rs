//! Rewrite the prometheus receiver for a Target Allocator

use std::io::Write;

use anyhow::bail;
use clap::Args;
use tracing::{debug, info};

use otelop_common::naming;
use otelop_targetallocator::{
    add_http_sd_config_to_prom_config, add_ta_config_to_prom_config, config_to_prom_config,
    unescape_dollar_signs_in_prom_config, validate_prom_config, validate_target_allocator_config,
    PromConfig, TaOption,
};

use super::{read_config, write_yaml, ConfigArgs};

#[derive(Args, Debug)]
pub struct TargetAllocatorArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Target Allocator Service name (defaults to `<collector>-targetallocator`)
    #[arg(long)]
    pub service: Option<String>,

    /// Collector name, used to derive the Service name
    #[arg(long, env = "OTELOP_COLLECTOR_NAME", required_unless_present = "service")]
    pub name: Option<String>,

    /// CA bundle for mTLS to the allocator
    #[arg(long, requires_all = ["cert_file", "key_file"])]
    pub ca_file: Option<String>,

    /// Client certificate for mTLS to the allocator
    #[arg(long, requires = "ca_file")]
    pub cert_file: Option<String>,

    /// Client key for mTLS to the allocator
    #[arg(long, requires = "ca_file")]
    pub key_file: Option<String>,

    /// Keep scrape jobs and point each at the allocator's HTTP SD endpoint
    #[arg(long)]
    pub http_sd: bool,

    /// Prometheus CR discovery is enabled on the allocator
    #[arg(long)]
    pub prometheus_cr: bool,
}

impl TargetAllocatorArgs {
    fn service_name(&self) -> anyhow::Result<String> {
        match (&self.service, &self.name) {
            (Some(service), _) => Ok(service.clone()),
            (None, Some(name)) => Ok(naming::target_allocator_service(name)),
            (None, None) => bail!("either --service or --name is required to address the target allocator"),
        }
    }

    fn options(&self) -> Vec<TaOption> {
        match (&self.ca_file, &self.cert_file, &self.key_file) {
            (Some(ca), Some(cert), Some(key)) => vec![TaOption::Tls {
                ca_file: ca.clone(),
                cert_file: cert.clone(),
                key_file: key.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

pub fn run(args: TargetAllocatorArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let content = read_config(&args.config.config)?;
    let prometheus = rewrite(&content, &args)?;
    write_yaml(out, &prometheus)
}

fn rewrite(content: &str, args: &TargetAllocatorArgs) -> anyhow::Result<PromConfig> {
    let service = args.service_name()?;

    // Jobs may all come from Prometheus CRs, leaving nothing to unescape
    let prometheus = match unescape_dollar_signs_in_prom_config(content) {
        Ok(prometheus) => prometheus,
        Err(e) if args.prometheus_cr => {
            debug!(error = %e, "no scrape configs to unescape");
            config_to_prom_config(content)?
        }
        Err(e) => return Err(e.into()),
    };
    validate_prom_config(&prometheus, true, !args.http_sd)?;
    validate_target_allocator_config(args.prometheus_cr, &prometheus)?;

    info!(service = %service, http_sd = args.http_sd, "rewriting prometheus receiver");
    if args.http_sd {
        Ok(add_http_sd_config_to_prom_config(prometheus, &service)?)
    } else {
        Ok(add_ta_config_to_prom_config(prometheus, &service, &args.options())?)
    }
}
