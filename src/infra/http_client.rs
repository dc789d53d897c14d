use std::time::Duration;

use crate::error::Result;

/// Shared reqwest client with a descriptive user agent.
/// Redirects are followed so map-search lookups end on the coordinate URL.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .build()?;
    Ok(client)
}
