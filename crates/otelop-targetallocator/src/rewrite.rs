//! Pointing the prometheus receiver at the Target Allocator

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use otelop_common::Result;

use crate::errors::{not_a_map, not_a_map_at, not_a_string_at};
use crate::prom_config::{prometheus_config_mut, scrape_configs_mut, PromConfig};

/// Every static or service discovery section of a scrape config
static SD_CONFIG_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*(sd|static)_configs$").expect("SD key pattern is valid"));

/// How often the receiver polls the allocator for its targets
const TA_INTERVAL: &str = "30s";

/// Collector id the allocator assigns targets to, expanded from the pod env
const TA_COLLECTOR_ID: &str = "${POD_NAME}";

/// Adjustment to the generated `target_allocator` stanza
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaOption {
    /// Talk to the allocator over HTTPS with mutual TLS
    Tls {
        ca_file: String,
        cert_file: String,
        key_file: String,
    },
}

impl TaOption {
    fn apply(&self, ta_service: &str, stanza: &mut Map<String, Value>) {
        match self {
            Self::Tls {
                ca_file,
                cert_file,
                key_file,
            } => {
                stanza.insert("endpoint".into(), json!(format!("https://{ta_service}:443")));
                stanza.insert(
                    "tls".into(),
                    json!({
                        "ca_file": ca_file,
                        "cert_file": cert_file,
                        "key_file": key_file,
                    }),
                );
            }
        }
    }
}

/// Go-style query escaping: spaces become `+`
fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Replace every scrape job's own discovery with the allocator's HTTP SD endpoint.
///
/// Static and service discovery sections are dropped; each job gets a single
/// `http_sd_configs` entry asking the allocator for the targets assigned to
/// this collector pod.
pub fn add_http_sd_config_to_prom_config(mut prometheus: PromConfig, ta_service: &str) -> Result<PromConfig> {
    for (i, scrape) in scrape_configs_mut(&mut prometheus)?.iter_mut().enumerate() {
        let scrape = scrape.as_object_mut().ok_or_else(|| not_a_map_at("scrape_config", i))?;
        scrape.retain(|key, _| !SD_CONFIG_KEY.is_match(key));

        let job = scrape
            .get("job_name")
            .ok_or_else(|| not_a_string_at("job_name", i))?
            .as_str()
            .ok_or_else(|| not_a_string_at("job_name is not a string", i))?;
        let url = format!(
            "http://{ta_service}:80/jobs/{}/targets?collector_id=$POD_NAME",
            query_escape(job)
        );
        debug!(job, %url, "delegating scrape job discovery to target allocator");
        scrape.insert("http_sd_configs".into(), json!([{ "url": url }]));
    }
    Ok(prometheus)
}

/// Hand scraping over to the allocator wholesale.
///
/// Writes the `target_allocator` stanza, keeping any keys already in it, and
/// removes `config.scrape_configs`. Applying it twice gives the same result.
pub fn add_ta_config_to_prom_config(
    mut prometheus: PromConfig,
    ta_service: &str,
    options: &[TaOption],
) -> Result<PromConfig> {
    prometheus_config_mut(&mut prometheus)?.remove("scrape_configs");

    let stanza = prometheus
        .entry("target_allocator")
        .or_insert_with(|| Value::Object(Map::new()));
    if stanza.is_null() {
        *stanza = Value::Object(Map::new());
    }
    let stanza = stanza.as_object_mut().ok_or_else(|| not_a_map("target_allocator"))?;

    stanza.insert("endpoint".into(), json!(format!("http://{ta_service}:80")));
    stanza.insert("interval".into(), json!(TA_INTERVAL));
    stanza.insert("collector_id".into(), json!(TA_COLLECTOR_ID));
    for option in options {
        option.apply(ta_service, stanza);
    }
    Ok(prometheus)
}
