// Fetch layer shared by every provider wrapper.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// GET `url` and return the body of a 2xx response.
    async fn get_text(&self, url: &str) -> Result<String, ApiError>;
}

pub async fn get_json<T: DeserializeOwned>(fetcher: &dyn Fetch, url: &str) -> Result<T, ApiError> {
    let body = fetcher.get_text(url).await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{url}: {e}")))
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("viagem-brasil/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Other(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Fetch for ReqwestFetcher {
    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status_code: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }
}

// Canned-response fetcher used to exercise the wrappers without a network.
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    enum Reply {
        Body(String),
        Fail(ApiError),
    }

    /// Replies are matched by URL prefix, longest prefix wins. Unmatched URLs
    /// fail with a 404.
    #[derive(Debug, Default)]
    pub struct MockFetcher {
        replies: Mutex<Vec<(String, Reply)>>,
        calls: Mutex<HashMap<String, usize>>,
        total_calls: AtomicUsize,
        delay_ms: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url_prefix: &str, body: impl Into<String>) {
            self.set_reply(url_prefix, Reply::Body(body.into()));
        }

        pub fn respond_json(&self, url_prefix: &str, body: &serde_json::Value) {
            self.respond(url_prefix, body.to_string());
        }

        pub fn fail(&self, url_prefix: &str, error: ApiError) {
            self.set_reply(url_prefix, Reply::Fail(error));
        }

        pub fn set_delay(&self, delay_ms: usize) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        fn set_reply(&self, url_prefix: &str, reply: Reply) {
            let mut replies = self.replies.lock();
            replies.retain(|(prefix, _)| prefix != url_prefix);
            replies.push((url_prefix.to_string(), reply));
        }

        /// Number of requests whose URL started with `url_prefix`.
        pub fn calls_to(&self, url_prefix: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|(url, _)| url.starts_with(url_prefix))
                .map(|(_, count)| *count)
                .sum()
        }

        pub fn total_calls(&self) -> usize {
            self.total_calls.load(Ordering::SeqCst)
        }

        fn lookup(&self, url: &str) -> Option<Reply> {
            self.replies
                .lock()
                .iter()
                .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, reply)| reply.clone())
        }
    }

    #[async_trait]
    impl Fetch for MockFetcher {
        async fn get_text(&self, url: &str) -> Result<String, ApiError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;

            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            match self.lookup(url) {
                Some(Reply::Body(body)) => Ok(body),
                Some(Reply::Fail(err)) => Err(err),
                None => Err(ApiError::Status {
                    status_code: 404,
                    message: format!("no mock reply for {url}"),
                }),
            }
        }
    }
}
