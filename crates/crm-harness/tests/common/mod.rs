// crates/crm-harness/tests/common/mod.rs
// ============================================================================
// Module: Scripted HTTP Server
// Description: One-shot HTTP responder for client-level tests.
// Purpose: Replay canned responses and capture the requests that hit them.
// Dependencies: tiny_http
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared test helpers; not every test uses every helper."
)]

use std::thread::JoinHandle;
use std::time::Duration;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Request captured by the scripted server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Returns the first header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Server that answers requests in order with the scripted responses.
pub struct ScriptedServer {
    origin: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl ScriptedServer {
    /// Starts a server that serves `responses` then stops.
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("http server");
        let origin = format!("http://{}", server.server_addr());
        let responses: Vec<(u16, String)> =
            responses.into_iter().map(|(status, body)| (status, body.to_string())).collect();
        let handle = std::thread::spawn(move || {
            let mut recorded = Vec::new();
            for (status, body) in responses {
                let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                    break;
                };
                let mut received = String::new();
                let _ = request.as_reader().read_to_string(&mut received);
                recorded.push(RecordedRequest {
                    method: request.method().as_str().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|header| {
                            (header.field.as_str().as_str().to_string(), header.value.as_str().to_string())
                        })
                        .collect(),
                    body: received,
                });
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
                request.respond(response).expect("respond");
            }
            recorded
        });
        Self {
            origin,
            handle,
        }
    }

    /// Returns `http://host:port`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the API base URL (`{origin}/api`).
    pub fn base_url(&self) -> String {
        format!("{}/api", self.origin)
    }

    /// Waits for the script to finish and returns the captured requests.
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().expect("server thread")
    }
}
