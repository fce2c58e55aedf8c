//! The counting proxy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::schema::{CountingPolicy, HitCounterConfig};
use crate::downstream::{DownstreamClient, HandlerRef, TargetError};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::observability::metrics;
use crate::proxy::error::ProxyError;
use crate::resilience::timeouts::with_deadline;
use crate::store::{CounterStore, StoreError};

/// Counts a hit for each request's path, then forwards it downstream.
pub struct CountingProxy {
    store: Arc<dyn CounterStore>,
    downstream: Arc<dyn DownstreamClient>,
    target: HandlerRef,
    policy: CountingPolicy,
    store_timeout: Duration,
}

impl CountingProxy {
    /// Strict policy and a one second store timeout until configured otherwise.
    pub fn new(
        store: Arc<dyn CounterStore>,
        downstream: Arc<dyn DownstreamClient>,
        target: HandlerRef,
    ) -> Self {
        Self {
            store,
            downstream,
            target,
            policy: CountingPolicy::Strict,
            store_timeout: Duration::from_secs(1),
        }
    }

    /// Build from configuration. The config is expected to be validated.
    pub fn from_config(
        config: &HitCounterConfig,
        store: Arc<dyn CounterStore>,
        downstream: Arc<dyn DownstreamClient>,
    ) -> Result<Self, TargetError> {
        let target = config.downstream.target.parse()?;
        Ok(Self::new(store, downstream, target)
            .with_policy(config.counting.policy)
            .with_store_timeout(config.store.timeout()))
    }

    pub fn with_policy(mut self, policy: CountingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn target(&self) -> &HandlerRef {
        &self.target
    }

    pub fn policy(&self) -> CountingPolicy {
        self.policy
    }

    /// Count the request's path and return the downstream response unchanged.
    pub async fn handle(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, ProxyError> {
        let start = Instant::now();
        let result = self.dispatch(&request).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_request(outcome, start);
        result
    }

    async fn dispatch(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, ProxyError> {
        let request_id = request.request_id().unwrap_or("-");

        let path = match request.path() {
            Some(p) if !p.is_empty() => p,
            _ => {
                tracing::warn!(request_id = %request_id, "Rejected request without path");
                return Err(ProxyError::MalformedRequest("missing required field 'path'".into()));
            }
        };

        tracing::info!(request_id = %request_id, path = %path, "Request received");
        tracing::debug!(request_id = %request_id, request = %request.raw().get(), "Request payload");

        self.count(request_id, path).await?;

        let response = match self.downstream.invoke(&self.target, request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    handler = %self.target,
                    error = %e,
                    "Downstream invocation failed"
                );
                return Err(e.into());
            }
        };

        tracing::info!(
            request_id = %request_id,
            path = %path,
            status = response.status_code(),
            "Downstream response"
        );
        tracing::debug!(request_id = %request_id, body = %response.body(), "Downstream response body");

        Ok(response)
    }

    async fn count(&self, request_id: &str, path: &str) -> Result<(), ProxyError> {
        let cause = match with_deadline(self.store_timeout, self.store.increment(path)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(StoreError::Unavailable(reason))) => reason,
            Ok(Err(e)) => e.to_string(),
            Err(elapsed) => elapsed.to_string(),
        };

        metrics::record_store_error("increment");
        match self.policy {
            CountingPolicy::Strict => {
                tracing::error!(request_id = %request_id, path = %path, error = %cause, "Counter increment failed");
                Err(ProxyError::CounterUnavailable(cause))
            }
            CountingPolicy::BestEffort => {
                tracing::warn!(
                    request_id = %request_id,
                    path = %path,
                    error = %cause,
                    "Counter increment failed, forwarding uncounted"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::{InvokeError, LocalDownstream};
    use crate::handlers::GreetingHandler;
    use crate::store::{CounterRecord, MemoryCounterStore, StoreResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Memory store that records calls and can be told to fail.
    struct RecordingStore {
        inner: MemoryCounterStore,
        calls: AtomicUsize,
        failing: AtomicBool,
        stall: Option<Duration>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                inner: MemoryCounterStore::new("hits", 5),
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                stall: None,
            }
        }

        fn failing() -> Self {
            let store = Self::new();
            store.failing.store(true, Ordering::SeqCst);
            store
        }

        fn stalling(stall: Duration) -> Self {
            Self { stall: Some(stall), ..Self::new() }
        }
    }

    #[async_trait]
    impl CounterStore for RecordingStore {
        async fn increment(&self, key: &str) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("throttled".into()));
            }
            self.inner.increment(key).await
        }

        async fn get(&self, key: &str) -> StoreResult<u64> {
            self.inner.get(key).await
        }

        async fn list_all(&self) -> StoreResult<Vec<CounterRecord>> {
            self.inner.list_all().await
        }
    }

    /// Downstream that replays a scripted outcome and remembers what it saw.
    struct ScriptedDownstream {
        outcome: fn() -> Result<ResponseEnvelope, InvokeError>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedDownstream {
        fn new(outcome: fn() -> Result<ResponseEnvelope, InvokeError>) -> Self {
            Self { outcome, seen: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DownstreamClient for ScriptedDownstream {
        async fn invoke(
            &self,
            _target: &HandlerRef,
            request: &RequestEnvelope,
        ) -> Result<ResponseEnvelope, InvokeError> {
            self.seen.lock().unwrap().push(request.raw().get().to_string());
            (self.outcome)()
        }
    }

    fn target() -> HandlerRef {
        HandlerRef::Local("downstream".into())
    }

    fn hello(user: &str) -> RequestEnvelope {
        RequestEnvelope::from_value(json!({
            "path": "/hello",
            "httpMethod": "GET",
            "requestContext": { "identity": { "user": user } }
        }))
        .unwrap()
    }

    fn ok_response() -> Result<ResponseEnvelope, InvokeError> {
        Ok(ResponseEnvelope::new(200).with_body("ok"))
    }

    #[tokio::test]
    async fn test_greeting_scenario() {
        let store = Arc::new(RecordingStore::new());
        let downstream = Arc::new(
            LocalDownstream::new(Duration::from_secs(1)).register("greeting", Arc::new(GreetingHandler)),
        );
        let proxy = CountingProxy::new(store.clone(), downstream, HandlerRef::Local("greeting".into()));

        let resp = proxy.handle(hello("Amy")).await.unwrap();

        assert_eq!(store.get("/hello").await.unwrap(), 1);
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.header("Content-Type"), Some("text/plain"));
        assert_eq!(resp.body(), "Hello, Amy! You have hit /hello\n");
        assert_eq!(resp.headers().len(), 1);
    }

    #[tokio::test]
    async fn test_request_forwarded_unmodified() {
        let store = Arc::new(RecordingStore::new());
        let downstream = Arc::new(ScriptedDownstream::new(ok_response));
        let proxy = CountingProxy::new(store, downstream.clone(), target());

        let text = r#"{"path":"/a","extra":{"z":[3,2,1]},"requestContext":{"identity":{"user":"Amy"}},"body":null}"#;
        proxy.handle(RequestEnvelope::from_slice(text.as_bytes()).unwrap()).await.unwrap();

        assert_eq!(downstream.seen.lock().unwrap().as_slice(), [text.to_string()]);
    }

    #[tokio::test]
    async fn test_response_returned_unchanged_for_every_status_class() {
        fn created() -> Result<ResponseEnvelope, InvokeError> {
            Ok(ResponseEnvelope::new(201).with_header("Location", "/x").with_body("made"))
        }
        fn not_found() -> Result<ResponseEnvelope, InvokeError> {
            Ok(ResponseEnvelope::new(404).with_body("{\"message\":\"missing\"}"))
        }
        fn broken() -> Result<ResponseEnvelope, InvokeError> {
            Ok(ResponseEnvelope::new(503)
                .with_header("Retry-After", "5")
                .with_field("cookies", json!(["a=1"])))
        }

        for outcome in [created as fn() -> _, not_found, broken] {
            let store = Arc::new(RecordingStore::new());
            let proxy = CountingProxy::new(store.clone(), Arc::new(ScriptedDownstream::new(outcome)), target());

            let expected = outcome().unwrap();
            let resp = proxy.handle(hello("Amy")).await.unwrap();
            assert_eq!(resp, expected);
            assert_eq!(
                serde_json::to_vec(&resp).unwrap(),
                serde_json::to_vec(&expected).unwrap()
            );
            assert_eq!(store.get("/hello").await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_missing_path_contacts_nobody() {
        let store = Arc::new(RecordingStore::new());
        let downstream = Arc::new(ScriptedDownstream::new(ok_response));
        let proxy = CountingProxy::new(store.clone(), downstream.clone(), target());

        for payload in [json!({ "httpMethod": "GET" }), json!({ "path": "" }), json!({ "path": null })] {
            let err = proxy.handle(RequestEnvelope::from_value(payload).unwrap()).await.unwrap_err();
            assert!(matches!(err, ProxyError::MalformedRequest(_)));
        }

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(downstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_counting_is_not_idempotent() {
        let store = Arc::new(RecordingStore::new());
        let proxy = CountingProxy::new(store.clone(), Arc::new(ScriptedDownstream::new(ok_response)), target());

        proxy.handle(hello("Amy")).await.unwrap();
        proxy.handle(hello("Amy")).await.unwrap();

        assert_eq!(store.get("/hello").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_downstream_failures_still_counted() {
        fn timeout() -> Result<ResponseEnvelope, InvokeError> {
            Err(InvokeError::Timeout(Duration::from_millis(250)))
        }
        fn failed() -> Result<ResponseEnvelope, InvokeError> {
            Err(InvokeError::Failed("connection refused".into()))
        }
        fn garbage() -> Result<ResponseEnvelope, InvokeError> {
            Err(InvokeError::Malformed("missing field `statusCode`".into()))
        }

        let store = Arc::new(RecordingStore::new());

        let proxy = CountingProxy::new(store.clone(), Arc::new(ScriptedDownstream::new(timeout)), target());
        let err = proxy.handle(hello("Amy")).await.unwrap_err();
        assert!(matches!(err, ProxyError::InvocationTimeout(d) if d == Duration::from_millis(250)));

        let proxy = CountingProxy::new(store.clone(), Arc::new(ScriptedDownstream::new(failed)), target());
        let err = proxy.handle(hello("Amy")).await.unwrap_err();
        assert!(matches!(err, ProxyError::InvocationError(ref m) if m == "connection refused"));

        let proxy = CountingProxy::new(store.clone(), Arc::new(ScriptedDownstream::new(garbage)), target());
        let err = proxy.handle(hello("Amy")).await.unwrap_err();
        assert!(matches!(err, ProxyError::DownstreamResponseMalformed(_)));

        assert_eq!(store.get("/hello").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_strict_policy_aborts_on_store_failure() {
        let store = Arc::new(RecordingStore::failing());
        let downstream = Arc::new(ScriptedDownstream::new(ok_response));
        let proxy = CountingProxy::new(store.clone(), downstream.clone(), target())
            .with_policy(CountingPolicy::Strict);

        let err = proxy.handle(hello("Amy")).await.unwrap_err();
        assert!(matches!(err, ProxyError::CounterUnavailable(ref m) if m.contains("throttled")));
        assert_eq!(err.to_string(), "counter store unavailable: throttled");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(downstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_best_effort_policy_forwards_on_store_failure() {
        let store = Arc::new(RecordingStore::failing());
        let downstream = Arc::new(ScriptedDownstream::new(ok_response));
        let proxy = CountingProxy::new(store.clone(), downstream.clone(), target())
            .with_policy(CountingPolicy::BestEffort);

        let resp = proxy.handle(hello("Amy")).await.unwrap();
        assert_eq!(resp.body(), "ok");
        assert_eq!(downstream.calls(), 1);
        assert_eq!(store.get("/hello").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_timeout_follows_policy() {
        let stall = Duration::from_millis(200);
        let limit = Duration::from_millis(20);

        let store = Arc::new(RecordingStore::stalling(stall));
        let downstream = Arc::new(ScriptedDownstream::new(ok_response));
        let strict = CountingProxy::new(store.clone(), downstream.clone(), target()).with_store_timeout(limit);
        let err = strict.handle(hello("Amy")).await.unwrap_err();
        assert!(matches!(err, ProxyError::CounterUnavailable(ref m) if m.contains("timed out")));
        assert_eq!(downstream.calls(), 0);

        let lenient = CountingProxy::new(store, downstream.clone(), target())
            .with_store_timeout(limit)
            .with_policy(CountingPolicy::BestEffort);
        lenient.handle(hello("Amy")).await.unwrap();
        assert_eq!(downstream.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_count_exactly() {
        let store = Arc::new(RecordingStore::new());
        let proxy = Arc::new(CountingProxy::new(
            store.clone(),
            Arc::new(ScriptedDownstream::new(ok_response)),
            target(),
        ));

        let calls = (0..100).map(|_| {
            let proxy = proxy.clone();
            tokio::spawn(async move { proxy.handle(hello("Amy")).await })
        });
        for result in futures_util::future::join_all(calls).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.get("/hello").await.unwrap(), 100);
    }

    #[test]
    fn test_from_config() {
        let mut config = HitCounterConfig::default();
        config.counting.policy = CountingPolicy::BestEffort;
        config.store.timeout_ms = 250;

        let proxy = CountingProxy::from_config(
            &config,
            Arc::new(RecordingStore::new()),
            Arc::new(ScriptedDownstream::new(ok_response)),
        )
        .unwrap();

        assert_eq!(proxy.target(), &HandlerRef::Local("greeting".into()));
        assert_eq!(proxy.policy(), CountingPolicy::BestEffort);
        assert_eq!(proxy.store_timeout, Duration::from_millis(250));
    }
}
