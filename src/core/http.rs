//! Shared blocking HTTP client construction for the Dropbox, SendGrid and
//! Twilio APIs.

use std::time::Duration;

use reqwest::blocking::Client;

/// Total per-request timeout. `None` disables reqwest's 30 second default so a
/// slow listing page is waited for instead of cutting the scan short.
pub const REQUEST_TIMEOUT: Option<Duration> = None;

/// Build a blocking client with [`REQUEST_TIMEOUT`] applied.
pub fn blocking_client() -> reqwest::Result<Client> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}
