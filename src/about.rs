use crate::config::Config;
use serde::Serialize;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Debug)]
pub struct About {
    pub cargo_pkg_version: &'static str,
    pub endpoint: String,
    pub lang: String,
    pub search_limit: usize,
    pub relation_limit: usize,
    pub timeout_secs: u64,
    pub num_examples: usize,
}

impl About {
    pub fn new(config: &Config) -> About {
        About {
            cargo_pkg_version: VERSION,
            endpoint: config.endpoint.clone(),
            lang: config.lang.clone(),
            search_limit: config.search_limit,
            relation_limit: config.relation_limit,
            timeout_secs: config.timeout_secs,
            num_examples: config.examples.len(),
        }
    }
}
