use reqwest::blocking::Client;
use std::time::Duration;

// Keep the loop from stalling on a hung server
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30; // connection + transfer

/// Create the blocking HTTP client shared by the status API and the messenger.
///
/// `Client` is reference counted internally, so callers clone it freely.
pub fn create_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
        .build()
}
