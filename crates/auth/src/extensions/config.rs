use std::net::{IpAddr, Ipv4Addr};

use miwa::derive::ExtensionConfig;
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Deserialize, Clone, ExtensionConfig)]
#[config(prefix = "auth")]
pub struct AuthCfg {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    pub keys: AuthKeys,
    #[serde(default = "default_access_token_duration")]
    pub access_token_duration: u64,
    #[serde(default = "default_refresh_token_duration")]
    pub refresh_token_duration: u64,
    #[serde(default = "default_token_leeway")]
    pub token_leeway: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// Seconds between sweeps of expired refresh tokens.
    #[serde(default = "default_purge_interval")]
    pub purge_interval: u64,
}

#[derive(Deserialize, Clone)]
pub struct AuthKeys {
    pub private_key: SecretString,
    pub public_key: Option<String>,
    pub kid: Option<String>,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_key_format")]
    pub format: KeyFormat,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Copy)]
pub enum KeyFormat {
    Pem,
    Secret,
}

pub fn default_port() -> u16 {
    3000
}

pub fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

pub fn default_issuer() -> String {
    "wetask-auth".to_string()
}

pub fn default_audience() -> String {
    "wetask".to_string()
}

pub fn default_access_token_duration() -> u64 {
    60 * 15
}

pub fn default_refresh_token_duration() -> u64 {
    60 * 60 * 24 * 7
}

pub fn default_token_leeway() -> u64 {
    60
}

pub fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

pub fn default_purge_interval() -> u64 {
    60 * 60
}

pub fn default_algorithm() -> String {
    "HS256".to_string()
}

pub fn default_key_format() -> KeyFormat {
    KeyFormat::Secret
}
