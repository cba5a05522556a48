use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};

use crate::error::{StoreError, StoreResult};

/// A simple wrapper on an HTTP client for talking to the drive API. Sets
/// sensible defaults such as timeouts, user-agent & ensuring HTTPS. There is
/// no retry layer: a failed backend attempt is final for that call.
pub(crate) struct Request {
    client: reqwest::Client,
    timeout: Duration,
}

impl Request {
    /// Initializes a new `Request` instance.
    pub(crate) fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Creates a request builder with defaults applied.
    pub(crate) fn req(&self, method: Method, url: &str) -> RequestBuilder {
        #[cfg(not(test))]
        assert!(url.starts_with("https"));

        self.client.request(method, url).timeout(self.timeout).header(
            "User-Agent",
            format!("credkit-core/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Creates a GET request builder with defaults applied.
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.req(Method::GET, url)
    }

    /// Creates a POST request builder with defaults applied.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Sends a prepared request, mapping transport failures and non-success
    /// statuses to [`StoreError::Network`].
    pub(crate) async fn handle(&self, request_builder: RequestBuilder) -> StoreResult<Response> {
        let response = request_builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let error = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(StoreError::Network {
                url,
                status: Some(status.as_u16()),
                error,
            });
        }
        Ok(response)
    }
}
