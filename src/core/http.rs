use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("pom-harvest/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client. `timeout` is applied per request when set;
/// otherwise reqwest's defaults apply.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let mut builder = Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}
