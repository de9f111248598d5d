//! HTTP Client Factory
//!
//! Builds reqwest clients for HTTP-based notification channels.

use execution_notify_core::{NotifyError, NotifyResult, ProxyConfig};

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> NotifyResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    match proxy {
        Some(cfg) => {
            let url = cfg.url();
            let mut p = reqwest::Proxy::all(&url)
                .map_err(|e| NotifyError::config(format!("invalid proxy URL {}: {}", url, e)))?;
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder
        .build()
        .map_err(|e| NotifyError::config(format!("failed to build HTTP client: {}", e)))
}
