mod config;
pub mod repo;
pub mod web;

pub use config::{
    default_access_token_duration, default_algorithm, default_audience, default_bcrypt_cost,
    default_bind, default_issuer, default_key_format, default_port, default_purge_interval,
    default_refresh_token_duration, default_token_leeway, AuthCfg, AuthKeys, KeyFormat,
};
pub use repo::sqlite::auth_sql_repo_extension;
pub use web::auth_api_extension;
