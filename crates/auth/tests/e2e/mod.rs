use std::{net::TcpListener, time::Duration};

use miwa::core::{Miwa, MiwaHandle};
use serde_json::{json, Value};
use wetask_auth::extensions::{auth_api_extension, auth_sql_repo_extension};
use wetask_session::{SessionCfg, SessionClient};

mod session;

pub struct Issuer {
    pub handle: MiwaHandle,
    pub base_url: String,
}

impl Issuer {
    pub fn client(&self) -> SessionClient {
        SessionClient::from_config(&SessionCfg::builder().base_url(self.base_url.clone()).build())
            .unwrap()
    }

    pub async fn refresh_raw(&self, refresh_token: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .unwrap()
    }
}

pub async fn launch_issuer() -> Issuer {
    launch_issuer_with_token_duration(Duration::from_secs(60 * 15)).await
}

pub async fn launch_issuer_with_token_duration(access_token_duration: Duration) -> Issuer {
    let port = free_port();
    let handle = Miwa::prepare()
        .with_json(runtime_config(port, access_token_duration.as_secs()))
        .build()
        .unwrap()
        .add_extension(auth_sql_repo_extension)
        .add_extension(auth_api_extension)
        .start()
        .await
        .unwrap();

    Issuer {
        handle,
        base_url: format!("http://127.0.0.1:{}", port),
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn runtime_config(port: u16, access_token_duration: u64) -> Value {
    json!({
        "auth": {
            "bind": "127.0.0.1",
            "port": port,
            "issuer": "wetask-auth",
            "access_token_duration": access_token_duration,
            "token_leeway": 0,
            "bcrypt_cost": 4,
            "keys": {
                "algorithm": "HS256",
                "format": "Secret",
                "private_key": "e2e-secret",
            }
        },
        "db": {
            "auth": {
                "sqlite": {
                    "path": ":memory:"
                }
            }
        }
    })
}
