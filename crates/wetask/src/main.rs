use miwa::core::Miwa;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wetask_auth::extensions::{auth_api_extension, auth_sql_repo_extension};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_file = std::env::var("WETASK_CONFIG_FILE").ok();
    let mut handle = Miwa::prepare()
        .with_env("WETASK")
        .with_file(config_file)
        .build()?
        .add_extension(auth_sql_repo_extension)
        .add_extension(auth_api_extension)
        .start()
        .await?;

    info!("wetask auth started");
    handle.wait().await?;

    Ok(())
}

fn env_filter() -> EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}=debug,wetask_auth=debug,wetask_session=debug",
            env!("CARGO_CRATE_NAME")
        )
        .into()
    })
}
