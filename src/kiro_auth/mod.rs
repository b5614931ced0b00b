//! Network and filesystem edge for the Kiro IDE: token renewal endpoints,
//! usage lookup, the IDE auth-token file and machine identity state.

pub mod endpoints;
pub mod machine_id;
pub mod token_file;

use crate::config::CONFIG;
use std::time::Duration;

/// Preconfigured HTTP client shared by all provider calls.
pub fn build_http_client() -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent("kiro-keeper/0.1")
        .connect_timeout(Duration::from_secs(5))
        .timeout(CONFIG.http_timeout());
    if let Some(proxy_url) = CONFIG.proxy.clone() {
        let proxy =
            reqwest::Proxy::all(proxy_url.as_str()).expect("invalid KEEPER_PROXY url for reqwest client");
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .expect("FATAL: initialize kiro auth HTTP client failed")
}
