#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::Path;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use reqlog::{context, RequestId, RequestIdSettings};
use reqlog_tracing::{JsonSink, ProcessorChain};
use serde_json::{json, Value};
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// In-memory log output.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn records(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    pub fn records_with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == message)
            .collect()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Buffer {
    type Writer = Buffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A JSON sink writing into a fresh buffer, with the request id processor
/// installed.
pub fn sink(settings: &RequestIdSettings) -> (JsonSink<Buffer>, Buffer) {
    let buffer = Buffer::default();
    let chain = ProcessorChain::new();
    reqlog::install(&chain, settings);
    (JsonSink::new("test", chain).with_writer(buffer.clone()), buffer)
}

pub fn dispatch(settings: &RequestIdSettings) -> (Dispatch, Buffer) {
    let (sink, buffer) = sink(settings);
    (Dispatch::new(tracing_subscriber::registry().with(sink)), buffer)
}

/// Test application:
/// - `GET /` logs twice and echoes every place the id is visible
/// - `GET /work/{tag}` logs across several await points, tagging each line
/// - `GET /background` logs from spawned tasks, with and without `carry`
pub fn app(settings: RequestIdSettings) -> Router {
    let header = settings.header_name().clone();

    let echo = move |Extension(id): Extension<RequestId>, headers: HeaderMap| {
        let header = header.clone();
        async move {
            tracing::info!("handling request");
            nested_call();
            Json(json!({
                "extension": id.as_str(),
                "bound": context::lookup().map(|id| id.to_string()),
                "inbound": headers
                    .get(&header)
                    .and_then(|v| std::str::from_utf8(v.as_bytes()).ok()),
            }))
        }
    };

    let router = Router::new()
        .route("/", get(echo))
        .route("/work/{tag}", get(work))
        .route("/background", get(background));
    reqlog::with_request_id(router, settings)
}

fn nested_call() {
    tracing::warn!("nested call");
}

async fn work(Path(tag): Path<String>) -> &'static str {
    for step in 0..3u64 {
        tracing::info!(tag = %tag, step, "working");
        tokio::task::yield_now().await;
    }
    "done"
}

async fn background() -> &'static str {
    let carried = tokio::spawn(
        context::carry(async {
            tracing::info!(kind = "carried", "background work");
        })
        .with_current_subscriber(),
    );
    let detached = tokio::spawn(
        async {
            tracing::info!(kind = "detached", "background work");
        }
        .with_current_subscriber(),
    );
    let _ = carried.await;
    let _ = detached.await;
    "ok"
}

pub fn get_request(uri: &str, header: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some((name, value)) = header {
        let value = HeaderValue::from_bytes(value.as_bytes()).unwrap();
        builder = builder.header(name, value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
