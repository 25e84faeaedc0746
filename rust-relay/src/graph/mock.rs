//! Scripted [`GraphApi`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::client::{GraphApi, Params, UpstreamResult};

/// One call received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Responder = dyn Fn(&RecordedCall) -> UpstreamResult + Send + Sync;

/// Records every call and answers through a routing closure.
pub struct MockGraphApi {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGraphApi {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RecordedCall) -> UpstreamResult + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphApi for MockGraphApi {
    async fn get(&self, base_url: &str, params: &Params<'_>) -> UpstreamResult {
        let call = RecordedCall {
            url: base_url.to_string(),
            params: params
                .iter()
                .filter_map(|(k, v)| v.map(|v| (k.to_string(), v.to_string())))
                .collect(),
        };
        let result = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        result
    }
}

pub fn ok(data: Value) -> UpstreamResult {
    UpstreamResult::Success { status: 200, data }
}

pub fn err(status: u16, data: Value) -> UpstreamResult {
    UpstreamResult::classify(status, data)
}
