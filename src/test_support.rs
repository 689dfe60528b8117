//! In-memory transport for unit tests

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpRequest, HttpResponse, Transport, PATH_GET_TOKEN};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&HttpRequest, usize) -> Result<HttpResponse> + Send + Sync;

/// Transport that answers from a closure and records every request.
///
/// The closure receives the request and how many business (non-token)
/// requests were sent before it.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest, usize) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Token endpoint issues `T1`, `T2`, ... ; business calls answer from `business`
    pub fn with_tokens<F>(business: F) -> Self
    where
        F: Fn(&HttpRequest, usize) -> Value + Send + Sync + 'static,
    {
        let issued = Mutex::new(0usize);
        Self::new(move |request, n| {
            if request.url.path() == PATH_GET_TOKEN {
                let mut issued = issued.lock().unwrap();
                *issued += 1;
                return Ok(json_response(&serde_json::json!({
                    "errcode": 0,
                    "errmsg": "ok",
                    "access_token": format!("T{}", *issued),
                    "expires_in": 7200
                })));
            }
            Ok(json_response(&business(request, n)))
        })
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn token_calls(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.path() == PATH_GET_TOKEN)
            .count()
    }

    pub fn business_calls(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.path() != PATH_GET_TOKEN)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let business_before = {
            let mut requests = self.requests.lock().unwrap();
            let n = requests
                .iter()
                .filter(|r| r.url.path() != PATH_GET_TOKEN)
                .count();
            requests.push(request.clone());
            n
        };
        (self.responder)(&request, business_before)
    }
}

pub fn json_response(value: &Value) -> HttpResponse {
    HttpResponse::new(200, serde_json::to_vec(value).unwrap())
}

pub fn test_config() -> ClientConfig {
    ClientConfig::builder("ww-test", "test-secret")
        .base_url("http://wecom.test")
        .build()
}

pub fn client_with(transport: &Arc<ScriptedTransport>) -> HttpClient {
    client_with_config(test_config(), transport)
}

pub fn client_with_config(config: ClientConfig, transport: &Arc<ScriptedTransport>) -> HttpClient {
    let transport: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
    HttpClient::with_transport(config, transport).unwrap()
}
