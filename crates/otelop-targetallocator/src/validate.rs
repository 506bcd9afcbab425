//! Checks run before a collector with a Target Allocator is accepted

use otelop_common::{Error, Result};

use crate::errors::no_component;
use crate::prom_config::{scrape_configs, PromConfig};

/// Check the receiver block against the collector's allocator settings.
///
/// With the allocator enabled and rewriting on, the stanza is generated
/// later so anything goes. Without rewriting, the user must supply either a
/// scrape config or a `target_allocator` stanza. Without an allocator, a
/// scrape config is required.
pub fn validate_prom_config(prometheus: &PromConfig, ta_enabled: bool, ta_rewrite_enabled: bool) -> Result<()> {
    let has_config = prometheus.contains_key("config");
    if ta_enabled {
        if ta_rewrite_enabled || has_config || prometheus.contains_key("target_allocator") {
            return Ok(());
        }
        return Err(Error::config(
            "either target allocator or prometheus config needs to be present",
        ));
    }
    if !has_config {
        return Err(no_component("prometheusConfig"));
    }
    Ok(())
}

/// An allocator with nothing to allocate is a misconfiguration.
///
/// Prometheus CR discovery supplies jobs on its own; otherwise at least one
/// scrape config must be present.
pub fn validate_target_allocator_config(prometheus_cr_enabled: bool, prometheus: &PromConfig) -> Result<()> {
    if prometheus_cr_enabled {
        return Ok(());
    }
    if scrape_configs(prometheus)?.is_empty() {
        return Err(Error::config(
            "either at least one scrape config needs to be defined or PrometheusCR needs to be enabled",
        ));
    }
    Ok(())
}
