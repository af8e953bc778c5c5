use async_trait::async_trait;
use skyscout_core::wire::{CreateResponse, PollResponse};
use skyscout_core::{CallFailure, SearchProvider, SearchQuery};
use skyscout_shared::SessionToken;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Provider double that answers from scripted queues. Once a queue runs dry
/// create returns token `abc123` and poll reports an incomplete search.
#[derive(Default)]
pub struct ScriptedProvider {
    creates: Mutex<VecDeque<Result<CreateResponse, CallFailure>>>,
    polls: Mutex<VecDeque<Result<serde_json::Value, CallFailure>>>,
    create_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, outcome: Result<&str, CallFailure>) -> Self {
        let outcome = outcome.map(|token| CreateResponse {
            session_token: token.to_string(),
        });
        self.creates.lock().unwrap().push_back(outcome);
        self
    }

    pub fn on_poll(self, outcome: Result<serde_json::Value, CallFailure>) -> Self {
        self.polls.lock().unwrap().push_back(outcome);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn create(&self, _query: &SearchQuery) -> Result<CreateResponse, CallFailure> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.creates.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(CreateResponse {
                session_token: "abc123".to_string(),
            })
        })
    }

    async fn poll(&self, _token: &SessionToken) -> Result<PollResponse, CallFailure> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        let payload = next
            .unwrap_or_else(|| Ok(serde_json::json!({ "status": "RESULT_STATUS_INCOMPLETE" })))?;
        PollResponse::from_payload(payload)
    }
}
