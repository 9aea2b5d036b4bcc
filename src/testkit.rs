// Test doubles shared by unit and integration tests.
//
// Compiled under `#[cfg(test)]` or with the `testkit` feature.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<HttpResponse, TransportError>>,
    sent: Vec<HttpRequest>,
}

/// Replays queued replies in order and records every request it sees.
///
/// Clones share the same script, so a test can keep a handle after moving
/// the transport into a session. Running out of replies is a transport error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_json(&self, status: u16, body: Value) -> &Self {
        let body = serde_json::to_vec(&body).unwrap_or_default();
        self.reply_raw(status, body)
    }

    pub fn reply_raw(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.script.borrow_mut().replies.push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.script
            .borrow_mut()
            .replies
            .push_back(Err(TransportError::new(message)));
        self
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.borrow().sent.clone()
    }

    /// URLs of every request sent so far.
    pub fn urls(&self) -> Vec<String> {
        self.script.borrow().sent.iter().map(|r| r.url.clone()).collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().replies.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.borrow_mut();
        script.sent.push(request.clone());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted reply left")))
    }
}
