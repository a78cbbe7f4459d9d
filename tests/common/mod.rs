#![allow(dead_code)]
use album_expander::{CatalogClientImpl, ClientConfig, RetryConfig};
use async_trait::async_trait;
use http_client::HttpClient;
use http_types::{Error, Method, Request, Response, StatusCode};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const TOKEN_PATH: &str = "/api/token";
pub const BASE_URL: &str = "http://catalog.test";

/// A canned upstream answer.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl Canned {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A request as seen by the scripted transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path plus query, e.g. `/v1/albums/abc?market=US`
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<String, VecDeque<Canned>>,
    requests: Vec<Recorded>,
    issued_tokens: u32,
}

/// An `HttpClient` answering from a script keyed by path and query.
///
/// Each target holds a queue of answers; the last answer is repeated once the
/// queue is down to one. The token endpoint hands out `token-1`, `token-2`, ...
/// unless a script for it is registered. Unscripted targets answer 404.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, target: &str, canned: Canned) -> &Self {
        self.script
            .lock()
            .unwrap()
            .routes
            .entry(target.to_string())
            .or_default()
            .push_back(canned);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path_prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.target.starts_with(path_prefix))
            .collect()
    }

    fn answer(&self, target: &str) -> Canned {
        let mut script = self.script.lock().unwrap();
        let path = target.split('?').next().unwrap_or(target);

        if let Some(queue) = script.routes.get_mut(target) {
            if queue.len() > 1 {
                return queue.pop_front().unwrap();
            }
            if let Some(canned) = queue.front() {
                return canned.clone();
            }
        }

        if path == TOKEN_PATH {
            script.issued_tokens += 1;
            return Canned::json(
                200,
                serde_json::json!({
                    "access_token": format!("token-{}", script.issued_tokens),
                    "token_type": "Bearer",
                    "expires_in": 3600
                }),
            );
        }

        Canned::json(
            404,
            serde_json::json!({"error": {"status": 404, "message": "Non existing id"}}),
        )
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn send(&self, mut req: Request) -> Result<Response, Error> {
        let url = req.url();
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let authorization = req
            .header("Authorization")
            .map(|values| values.last().as_str().to_string());
        let method = req.method();
        let body = req.body_string().await?;

        self.script.lock().unwrap().requests.push(Recorded {
            method,
            target: target.clone(),
            authorization,
            body,
        });

        let canned = self.answer(&target);
        let mut response = Response::new(StatusCode::try_from(canned.status)?);
        response.set_body(canned.body);
        for (name, value) in &canned.headers {
            response.insert_header(name.as_str(), value.as_str());
        }
        Ok(response)
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("test-client", "test-secret")
        .with_base_url(BASE_URL)
        .with_retry_config(RetryConfig {
            max_retries: 2,
            base_delay: 0,
            max_delay: 0,
        })
}

pub fn test_client(scripted: &ScriptedClient) -> CatalogClientImpl {
    CatalogClientImpl::new(Box::new(scripted.clone()), test_config())
}
