//! Mock transport for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::indexer::{IndexerRequest, Transport, TransportError, TransportResponse};

/// Selects the requests a scripted reply applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMatch {
    /// Every request.
    Any,
    /// Requests addressed to this indexer.
    Indexer(String),
    /// Requests carrying `key=value`.
    Param(String, String),
    /// Requests whose unencoded URL contains the text.
    UrlContains(String),
}

impl RequestMatch {
    pub fn indexer(name: &str) -> Self {
        RequestMatch::Indexer(name.to_string())
    }

    pub fn param(key: &str, value: &str) -> Self {
        RequestMatch::Param(key.to_string(), value.to_string())
    }

    pub fn url(text: &str) -> Self {
        RequestMatch::UrlContains(text.to_string())
    }

    pub fn matches(&self, request: &IndexerRequest) -> bool {
        match self {
            RequestMatch::Any => true,
            RequestMatch::Indexer(name) => request.indexer == *name,
            RequestMatch::Param(key, value) => request.param(key) == Some(value.as_str()),
            RequestMatch::UrlContains(text) => request.url.contains(text.as_str()),
        }
    }
}

/// What a matched request gets back.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(TransportResponse),
    Error(TransportError),
}

struct Route {
    matcher: RequestMatch,
    reply: MockReply,
    delay: Option<Duration>,
}

/// A request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: IndexerRequest,
    /// When the request arrived.
    pub started_at: Instant,
}

/// Mock implementation of the Transport trait.
///
/// Replies are scripted per request match; the first matching route wins and
/// requests matching nothing get the default reply. Delays use tokio time, so
/// tests running with paused time advance instantly.
///
/// # Example
///
/// ```rust,ignore
/// use quarry_core::testing::{fixtures, MockTransport, RequestMatch};
///
/// let transport = MockTransport::new();
/// transport
///     .respond(RequestMatch::param("t", "tvsearch"), fixtures::newznab_feed(&[]))
///     .await;
/// transport
///     .fail(RequestMatch::indexer("broken"), TransportError::Timeout)
///     .await;
/// ```
pub struct MockTransport {
    routes: Arc<RwLock<Vec<Route>>>,
    default_reply: Arc<RwLock<MockReply>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    completed: AtomicUsize,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("routes", &"<routes>")
            .field("default_reply", &"<reply>")
            .field("requests", &"<requests>")
            .field("completed", &self.completed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock that fails every request until routes are added.
    pub fn new() -> Self {
        Self {
            routes: Arc::new(RwLock::new(Vec::new())),
            default_reply: Arc::new(RwLock::new(MockReply::Error(TransportError::Other(
                "no mock route".to_string(),
            )))),
            requests: Arc::new(RwLock::new(Vec::new())),
            completed: AtomicUsize::new(0),
        }
    }

    /// Add a route.
    pub async fn when(&self, matcher: RequestMatch, reply: MockReply, delay: Option<Duration>) {
        self.routes.write().await.push(Route {
            matcher,
            reply,
            delay,
        });
    }

    /// Answer matching requests with a 200 and `body`.
    pub async fn respond(&self, matcher: RequestMatch, body: impl Into<String>) {
        self.when(
            matcher,
            MockReply::Response(TransportResponse::ok(body)),
            None,
        )
        .await;
    }

    /// Answer matching requests with `body` after `delay`.
    pub async fn respond_after(
        &self,
        matcher: RequestMatch,
        delay: Duration,
        body: impl Into<String>,
    ) {
        self.when(
            matcher,
            MockReply::Response(TransportResponse::ok(body)),
            Some(delay),
        )
        .await;
    }

    /// Answer matching requests with an arbitrary status.
    pub async fn respond_status(&self, matcher: RequestMatch, status: u16, body: impl Into<String>) {
        self.when(
            matcher,
            MockReply::Response(TransportResponse {
                status,
                body: body.into(),
            }),
            None,
        )
        .await;
    }

    /// Fail matching requests.
    pub async fn fail(&self, matcher: RequestMatch, error: TransportError) {
        self.when(matcher, MockReply::Error(error), None).await;
    }

    /// Reply for requests matching no route.
    pub async fn set_default(&self, reply: MockReply) {
        *self.default_reply.write().await = reply;
    }

    /// Get recorded requests in arrival order.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of requests received.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Number of received requests the matcher selects.
    pub async fn count_matching(&self, matcher: &RequestMatch) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| matcher.matches(&r.request))
            .count()
    }

    /// Requests that ran to completion, including failures.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Clear recorded requests.
    pub async fn clear_recorded(&self) {
        self.requests.write().await.clear();
        self.completed.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &IndexerRequest) -> Result<TransportResponse, TransportError> {
        self.requests.write().await.push(RecordedRequest {
            request: request.clone(),
            started_at: Instant::now(),
        });

        let (reply, delay) = {
            let routes = self.routes.read().await;
            match routes.iter().find(|route| route.matcher.matches(request)) {
                Some(route) => (route.reply.clone(), route.delay),
                None => (self.default_reply.read().await.clone(), None),
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        match reply {
            MockReply::Response(response) => Ok(response),
            MockReply::Error(error) => Err(error),
        }
    }
}
