//! Target Allocator adapter for the prometheus receiver
//!
//! When a Target Allocator shards scrape targets across collectors, each
//! collector's prometheus receiver stops discovering targets itself. This
//! crate rewrites the receiver block of a collector config accordingly:
//! either every scrape job is pointed at the allocator's HTTP service
//! discovery endpoint, or the whole block is replaced by a
//! `target_allocator` stanza.
//!
//! The receiver block is handled as a raw JSON map so every key the user
//! wrote survives the rewrite.

mod errors;
pub mod prom_config;
pub mod rewrite;
pub mod validate;

pub use prom_config::{config_to_prom_config, unescape_dollar_signs_in_prom_config, PromConfig};
pub use rewrite::{add_http_sd_config_to_prom_config, add_ta_config_to_prom_config, TaOption};
pub use validate::{validate_prom_config, validate_target_allocator_config};

pub use otelop_common::{Error, Result};
