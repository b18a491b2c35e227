//! Guide page retrieval.
//!
//! [`PageSource`] is the seam between the catalog cache and the network;
//! [`WikiFetcher`] is the production implementation. There are no retries
//! here: the cache decides when to try again.

use std::time::Duration;

use tracing::debug;

use crate::error::FetchError;

/// Something that can produce the raw guide page markup.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Downloads the page once.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` or `FetchError::Timeout` when the
    /// server cannot be reached in time, and `FetchError::HttpStatus` for
    /// non-success responses.
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// HTTP GET of a fixed wiki URL.
#[derive(Debug, Clone)]
pub struct WikiFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    max_body: usize,
}

impl WikiFetcher {
    /// Creates a fetcher for `url`.
    ///
    /// `timeout` bounds the whole request including the body download.
    /// Bodies above `max_body` bytes are rejected.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration, max_body: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
            max_body,
        })
    }

    /// The URL this fetcher downloads.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(declared) = response.content_length() {
            let declared = usize::try_from(declared).unwrap_or(usize::MAX);
            if declared > self.max_body {
                return Err(FetchError::BodyTooLarge {
                    size: declared,
                    limit: self.max_body,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if bytes.len() > self.max_body {
            return Err(FetchError::BodyTooLarge {
                size: bytes.len(),
                limit: self.max_body,
            });
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait::async_trait]
impl PageSource for WikiFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        debug!(url = %self.url, "fetching guide page");
        let body = tokio::time::timeout(self.timeout, self.download())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;
        debug!(url = %self.url, bytes = body.len(), "guide page fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    const LIMIT: usize = 1024 * 1024;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = serve(Router::new().route(
            "/wiki/Guide_Class_setups",
            get(|| async { "<div class=\"mw-parser-output\"></div>" }),
        ))
        .await;
        let fetcher = WikiFetcher::new(
            format!("{base}/wiki/Guide_Class_setups"),
            Duration::from_secs(5),
            LIMIT,
        )
        .unwrap();
        let body = fetcher.fetch().await.unwrap();
        assert!(body.contains("mw-parser-output"));
    }

    #[tokio::test]
    async fn test_fetch_http_status() {
        let base = serve(Router::new().route(
            "/page",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        ))
        .await;
        let fetcher = WikiFetcher::new(format!("{base}/page"), Duration::from_secs(5), LIMIT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(503)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let base = serve(Router::new()).await;
        let fetcher = WikiFetcher::new(format!("{base}/missing"), Duration::from_secs(5), LIMIT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(404)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = WikiFetcher::new(format!("http://{addr}/"), Duration::from_secs(5), LIMIT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "late"
            }),
        ))
        .await;
        let fetcher = WikiFetcher::new(format!("{base}/slow"), Duration::from_millis(200), LIMIT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_body_too_large() {
        let base = serve(Router::new().route("/big", get(|| async { "x".repeat(4096) }))).await;
        let fetcher = WikiFetcher::new(format!("{base}/big"), Duration::from_secs(5), 1024).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(
            matches!(err, FetchError::BodyTooLarge { size: 4096, limit: 1024 }),
            "got {err:?}"
        );
    }
}
