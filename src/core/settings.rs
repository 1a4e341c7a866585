//! Effective settings
//!
//! Priority order for every setting:
//! 1. CLI argument
//! 2. Config file (~/.config/bezy/objects.json)
//! 3. Built-in default

use tracing::warn;

use crate::core::cli::CliArgs;
use crate::core::config_file::ConfigFile;
use crate::external::ResourceId;
use crate::objects::FontOptions;

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub strict_registration: bool,
    pub log_filter: String,
    pub log_to_file: bool,
    pub preload: Vec<ResourceId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strict_registration: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_to_file: false,
            preload: Vec::new(),
        }
    }
}

impl Settings {
    /// `RUST_LOG` sits between the config file and the default for the log
    /// filter.
    pub fn resolve(cli: &CliArgs, config: Option<&ConfigFile>) -> Self {
        let env_filter = std::env::var("RUST_LOG").ok();
        Self::resolve_with_env(cli, config, env_filter)
    }

    fn resolve_with_env(cli: &CliArgs, config: Option<&ConfigFile>, env_filter: Option<String>) -> Self {
        let defaults = Self::default();
        let config = config.cloned().unwrap_or_default();

        let preload = config
            .preload
            .unwrap_or_default()
            .iter()
            .filter_map(|name| match name.parse::<ResourceId>() {
                Ok(resource) => Some(resource),
                Err(error) => {
                    warn!("Ignoring preload entry: {error}");
                    None
                }
            })
            .collect();

        Self {
            strict_registration: cli.strict
                || config
                    .strict_observer_registration
                    .unwrap_or(defaults.strict_registration),
            log_filter: cli
                .log_filter
                .clone()
                .or(config.log_filter)
                .or(env_filter)
                .unwrap_or(defaults.log_filter),
            log_to_file: config.log_to_file.unwrap_or(defaults.log_to_file),
            preload,
        }
    }

    pub fn font_options(&self) -> FontOptions {
        FontOptions {
            strict_registration: self.strict_registration,
            preload: self.preload.clone(),
            registry: None,
        }
    }
}
