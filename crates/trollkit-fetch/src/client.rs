//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::Client;

use crate::error::{FetchError, FetchResult};

/// Build the client used for every request of a run.
///
/// The `User-Agent` is replaced because some hosts reject default client
/// signatures. Only the connect phase is bounded; large downloads may take as
/// long as they need.
///
/// # Errors
///
/// Returns [`FetchError::Client`] if the TLS backend cannot be initialised.
pub fn build_client(user_agent: &str, connect_timeout: Duration) -> FetchResult<Client> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|source| FetchError::Client { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn client_sends_configured_user_agent() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/probe")
                .header("user-agent", "trollkit-test/1.0");
            then.status(204);
        });

        let client = build_client("trollkit-test/1.0", Duration::from_secs(5))?;
        let response = client.get(server.url("/probe")).send().await?;
        assert_eq!(response.status().as_u16(), 204);
        mock.assert();
        Ok(())
    }
}
