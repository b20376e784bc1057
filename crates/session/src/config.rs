use std::path::{Path, PathBuf};

use bon::Builder;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Builder)]
pub struct SessionCfg {
    #[serde(default = "default_base_url")]
    #[builder(into, default = default_base_url())]
    pub base_url: String,
    #[builder(into)]
    pub token_file: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    #[builder(default = default_timeout_secs())]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh_path")]
    #[builder(into, default = default_refresh_path())]
    pub refresh_path: String,
}

impl SessionCfg {
    /// Reads an optional file, then `WETASK_SESSION_*` variables on top.
    pub fn load(path: Option<&Path>) -> anyhow::Result<SessionCfg> {
        let mut config_builder = Config::builder();
        if let Some(path) = path {
            config_builder = config_builder.add_source(File::from(path.to_path_buf()));
        }

        config_builder
            .add_source(Environment::with_prefix("wetask_session"))
            .build()?
            .try_deserialize()
            .map(Ok)?
    }
}

pub fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

pub fn default_timeout_secs() -> u64 {
    30
}

pub fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}
