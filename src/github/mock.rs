use super::error::ApiError;
use super::transport::GithubTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory transport for tests.
///
/// Queue responses (or errors) in order; every `execute` call pops the next
/// one and records the variables it was called with, so tests can assert on
/// request count, page size, and cursor progression.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<Value>>,
    name: String,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            name: "MockTransport".to_string(),
        }
    }

    pub fn push_ok(&self, payload: Value) {
        self.responses.lock().unwrap().push_back(Ok(payload));
    }

    pub fn push_err(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Number of `execute` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Variables of the `index`-th call.
    pub fn call_variables(&self, index: usize) -> Option<Value> {
        self.calls.lock().unwrap().get(index).cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GithubTransport for MockTransport {
    async fn execute(&self, _query: &str, variables: Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(variables);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::InvalidResponse {
                    message: "MockTransport: no more queued responses".to_string(),
                })
            })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint_info(&self) -> Option<String> {
        Some("mock".to_string())
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("remaining_responses", &self.remaining_responses())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_pops_in_order() {
        let transport = MockTransport::new();
        transport.push_ok(json!({ "page": 1 }));
        transport.push_ok(json!({ "page": 2 }));

        let first = transport.execute("query", json!({})).await.unwrap();
        let second = transport.execute("query", json!({})).await.unwrap();

        assert_eq!(first["page"], 1);
        assert_eq!(second["page"], 2);
        assert_eq!(transport.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_mock_records_variables() {
        let transport = MockTransport::new();
        transport.push_ok(json!({}));

        transport
            .execute("query", json!({ "cursor": "abc", "limit": 2 }))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 1);
        let vars = transport.call_variables(0).unwrap();
        assert_eq!(vars["cursor"], "abc");
        assert_eq!(vars["limit"], 2);
    }

    #[tokio::test]
    async fn test_mock_returns_queued_error() {
        let transport = MockTransport::new();
        transport.push_err(ApiError::RateLimited { retry_after: Some(7) });

        let result = transport.execute("query", json!({})).await;
        assert!(matches!(result, Err(ApiError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_mock_exhausted_queue_is_an_error() {
        let transport = MockTransport::new();
        let result = transport.execute("query", json!({})).await;
        assert!(matches!(result, Err(ApiError::InvalidResponse { .. })));
    }
}
