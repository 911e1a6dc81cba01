//! Local HTTP stand-in for the version source.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

/// One request as the stand-in saw it, query already decoded.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Received {
    /// Every value of query parameter `key`, in order.
    pub fn param(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Clone)]
enum Reply {
    Fixed { status: StatusCode, body: String },
    Hang,
}

#[derive(Clone)]
struct Shared {
    reply: Reply,
    requests: Arc<Mutex<Sender<Received>>>,
}

/// Serves a fixed response to every request on a loopback port.
///
/// The server runs on its own runtime thread, detached until the test
/// process exits.
pub struct Responder {
    pub url: String,
    requests: Receiver<Received>,
}

impl Responder {
    /// Answer every request with `status` and `body`.
    pub fn serve(status: u16, body: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status).expect("invalid status code");
        Self::spawn(Reply::Fixed {
            status,
            body: body.into(),
        })
    }

    /// Accept requests and never answer.
    pub fn hang() -> Self {
        Self::spawn(Reply::Hang)
    }

    fn spawn(reply: Reply) -> Self {
        let (tx, requests) = mpsc::channel();
        let (ready_tx, ready) = mpsc::channel();
        let shared = Shared {
            reply,
            requests: Arc::new(Mutex::new(tx)),
        };

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("failed to build responder runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("failed to bind responder");
                let addr = listener.local_addr().expect("responder has no address");
                ready_tx.send(addr).expect("test dropped before responder started");

                let app = Router::new().fallback(respond).with_state(shared);
                axum::serve(listener, app).await.expect("responder stopped");
            });
        });

        let addr = ready
            .recv_timeout(Duration::from_secs(5))
            .expect("responder did not start");

        Self {
            url: format!("http://{}", addr),
            requests,
        }
    }

    /// The next request received, waiting up to five seconds.
    pub fn next_request(&self) -> Option<Received> {
        self.requests.recv_timeout(Duration::from_secs(5)).ok()
    }
}

async fn respond(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let received = Received {
        method,
        path: uri.path().to_string(),
        query,
    };
    if let Ok(tx) = shared.requests.lock() {
        let _ = tx.send(received);
    }

    match shared.reply {
        Reply::Fixed { status, body } => {
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(600)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    }
}
