//! Layered configuration: embedded defaults, then data/config.toml, then SPARQLVIEW_* environment variables.
use config::{ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

static DEFAULT: &str = std::include_str!("../data/default.toml");
pub static CONFIG_FILE: &str = "data/config.toml";

/// A canned query offered by the SPARQL console.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ExampleQuery {
    pub label: String,
    pub query: String,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    /// URL of the SPARQL endpoint, for example "http://localhost:7200/repositories/fifa"
    pub endpoint: String,
    pub title: String,
    /// language tag for labels and comments, "*" for any language
    pub lang: String,
    pub search_limit: usize,
    pub relation_limit: usize,
    pub timeout_secs: u64,
    pub port: u16,
    pub log_level: String,
    #[serde(default)]
    pub examples: Vec<ExampleQuery>,
}

impl Config {
    fn load(env: Environment) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(DEFAULT, FileFormat::Toml))
            .add_source(File::new(CONFIG_FILE, FileFormat::Toml).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix("SPARQLVIEW").try_parsing(true))
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
