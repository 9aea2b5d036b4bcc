// Bearer-token session: agent login, token caching and the one-shot
// re-login when the server rejects a token.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Credentials, Settings};
use crate::error::{ClientError, Result};
use crate::store::TokenStore;
use crate::transport::{Body, HttpRequest, HttpResponse, Transport};

const LOGIN_PATH: &str = "auth/agent-login";

/// Method, path, query and body of one gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present.
    pub fn query_opt(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn json(mut self, body: impl Serialize) -> Self {
        self.body = Some(serde_json::to_value(body).unwrap_or(Value::Null));
        self
    }
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    api_key: &'a str,
    api_secret: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

pub struct Session {
    base_url: String,
    credentials: Credentials,
    login_timeout: Duration,
    request_timeout: Duration,
    transport: Box<dyn Transport>,
    store: Box<dyn TokenStore>,
    token: Option<String>,
}

impl Session {
    /// Build a session, picking up whatever token the store already holds.
    pub fn new(
        settings: &Settings,
        transport: Box<dyn Transport>,
        store: Box<dyn TokenStore>,
    ) -> Self {
        let token = store.load().filter(|t| !t.is_empty());
        debug!(cached = token.is_some(), "session created");
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credentials: settings.credentials.clone(),
            login_timeout: settings.login_timeout,
            request_timeout: settings.request_timeout,
            transport,
            store,
            token,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Exchange the API key pair for a fresh token and persist it.
    pub fn login(&mut self) -> Result<String> {
        let creds = &self.credentials;
        let (api_key, api_secret) = match (&creds.api_key, &creds.api_secret) {
            (Some(key), Some(secret)) => (key, secret),
            _ => {
                return Err(ClientError::Configuration(
                    "SEESAW_API_KEY and SEESAW_API_SECRET must be set".into(),
                ))
            }
        };

        let mut req = HttpRequest::new(Method::POST, self.url(LOGIN_PATH), self.login_timeout);
        req.body = Body::Json(
            serde_json::to_value(LoginPayload {
                api_key,
                api_secret,
            })
            .unwrap_or(Value::Null),
        );

        debug!(url = %req.url, "logging in");
        let res = self
            .transport
            .send(&req)
            .map_err(|e| ClientError::Authentication(e.to_string()))?;
        if !res.status.is_success() {
            return Err(ClientError::Authentication(format!(
                "{} - {}",
                res.status,
                body_snippet(&res.body)
            )));
        }

        let parsed: LoginResponse = serde_json::from_slice(&res.body).map_err(|e| {
            ClientError::Authentication(format!("unreadable login response: {}", e))
        })?;
        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Authentication("login response has no token".into()))?;

        if let Err(err) = self.store.save(&token) {
            warn!(error = %err, "could not persist session token");
        }
        info!("logged in");
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Send `request` with the bearer token, logging in first if needed and
    /// once more if the server answers 401. The retry's outcome is final.
    pub fn authorized_request(&mut self, request: &ApiRequest) -> Result<Value> {
        let token = match self.token.clone() {
            Some(token) => token,
            None => self.login()?,
        };

        let mut res = self.send_with_token(request, &token)?;
        if res.status == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path, "token rejected, logging in again");
            let token = self.login()?;
            res = self.send_with_token(request, &token)?;
        }

        decode(&request.path, res)
    }

    fn send_with_token(&self, request: &ApiRequest, token: &str) -> Result<HttpResponse> {
        let mut req = HttpRequest::new(
            request.method.clone(),
            self.url(&request.path),
            self.request_timeout,
        );
        req.query = request
            .query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        req.headers
            .push(("Authorization".to_string(), format!("Bearer {}", token)));
        if let Some(body) = &request.body {
            req.body = Body::Json(body.clone());
        }

        debug!(method = %req.method, path = %request.path, "sending request");
        self.transport
            .send(&req)
            .map_err(|e| ClientError::request(&request.path, None, e.to_string()))
    }
}

fn decode(path: &str, res: HttpResponse) -> Result<Value> {
    if !res.status.is_success() {
        return Err(ClientError::request(
            path,
            Some(res.status),
            format!("{} - {}", res.status, body_snippet(&res.body)),
        ));
    }
    if res.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&res.body).map_err(|e| {
        ClientError::request(path, Some(res.status), format!("invalid JSON response: {}", e))
    })
}

fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(200) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
