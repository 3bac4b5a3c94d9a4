//! In-crate fakes for provider tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::dns::HostResolver;
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{Result, TrailerError};

enum Reply {
    Response(HttpResponse),
    NetworkError(String),
}

/// Transport that replays scripted replies in order and records every request
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.push_bytes(status, body.to_string().into_bytes())
    }

    pub fn push_bytes(&self, status: u16, body: Vec<u8>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Response(HttpResponse { status, body }));
        self
    }

    pub fn push_network_error(&self, message: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::NetworkError(message.to_string()));
        self
    }

    /// Chat-completion reply whose first choice carries `content`
    pub fn push_chat(&self, content: &str) -> &Self {
        self.push_json(
            200,
            serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            }),
        )
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// User-message content of every chat request sent, in order
    pub fn sent_prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.body.as_ref())
            .filter_map(|body| body["messages"].as_array().cloned())
            .filter_map(|messages| {
                messages
                    .iter()
                    .find(|m| m["role"] == "user")
                    .and_then(|m| m["content"].as_str().map(str::to_string))
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, provider: &str, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::NetworkError(message)) => Err(TrailerError::network(provider, message)),
            None => Err(TrailerError::network(provider, "no scripted reply")),
        }
    }
}

/// Resolver that always succeeds or always fails, counting lookups
pub struct FakeResolver {
    succeed: bool,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn ok() -> Self {
        Self {
            succeed: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for FakeResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(1)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("failed to lookup address information: {}", host),
            ))
        }
    }
}
