//! Shared test doubles for the integration suites

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use coach_gateway::io::{RawResponse, Transport, TransportError, TransportRequest};

pub const SYMPTOMS: &str = r#"[{"name": "Headache", "code": "R51"}, {"name": "Fever"}]"#;

type Responder =
    Box<dyn Fn(&TransportRequest) -> Result<RawResponse, TransportError> + Send + Sync>;

/// In-process transport that records every request and answers from a closure.
///
/// `fail_from_now_on` flips it into refusing every connection, which is how
/// the "backend went away" scenarios are driven.
pub struct FakeTransport {
    respond: Responder,
    refusing: AtomicBool,
    calls: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            refusing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers 200 with `body`
    pub fn ok(body: &'static str) -> Self {
        Self::new(move |_| Ok(RawResponse::new(200, body)))
    }

    /// Refuses every connection until `recover`, then serves the symptom catalog
    pub fn refusing() -> Self {
        let transport = Self::ok(SYMPTOMS);
        transport.fail_from_now_on();
        transport
    }

    pub fn fail_from_now_on(&self) {
        self.refusing.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.refusing.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeTransport")
            .field("refusing", &self.refusing.load(Ordering::SeqCst))
            .field("calls", &self.calls())
            .finish()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.refusing.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }
        (self.respond)(&request)
    }
}

/// Serve `router` on an ephemeral localhost port and return its base URL
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A localhost URL nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A localhost listener that never accepts and whose backlog is already full,
/// so new connection attempts hang until the client gives up.
///
/// Keep the returned listener and filler stream alive for the whole test.
pub async fn saturated_backend() -> (tokio::net::TcpListener, tokio::net::TcpStream, String) {
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();
    let filler = tokio::net::TcpStream::connect(addr).await.unwrap();
    (listener, filler, format!("http://{}", addr))
}
