use crate::error::{CloudError, Result};
use crate::http::MetadataClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
    Hang,
}

/// In-memory metadata service. Unknown URLs behave like a refused
/// connection.
#[derive(Default)]
pub struct FakeClient {
    routes: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, reply: Reply) -> Self {
        self.routes.insert(url.to_string(), reply);
        self
    }

    pub fn body(self, url: &str, body: &str) -> Self {
        self.with(url, Reply::Body(body.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn headers_for(&self, url: &str) -> Option<Vec<(String, String)>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, h)| h.clone())
    }
}

#[async_trait]
impl MetadataClient for FakeClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)], _timeout: Duration) -> Result<String> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));

        match self.routes.get(url).cloned() {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(CloudError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(CloudError::Unreachable {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}
