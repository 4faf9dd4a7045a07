//! Streaming relay for `text/event-stream` responses.
//!
//! # Data Flow
//! ```text
//! Backend ──bytes──▶ pump task ──mpsc(1)──▶ Body::from_stream ──▶ Client
//!                       ▲                         │
//!                       └──── sender closed ◀─────┘ (client went away)
//! ```
//!
//! # Design Decisions
//! - Chunks are opaque: no SSE parsing, no re-chunking, FIFO
//! - The channel holds one chunk, so a slow client suspends the backend read
//! - A dropped client body closes the channel, which stops the pump and
//!   drops the backend response (closing its connection)
//! - A backend read error is sent down the channel so the client connection
//!   ends with an error instead of hanging

use std::io;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::response::Response;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::observability::metrics;
use crate::security::headers::event_stream_headers;

/// How a relayed stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Backend signalled end of stream.
    Completed,
    /// Client stopped reading.
    ClientGone,
    /// Backend body failed mid-stream.
    Errored,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::ClientGone => "client_gone",
            StreamOutcome::Errored => "errored",
        }
    }
}

/// Totals for one relayed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub outcome: StreamOutcome,
    pub chunks: u64,
    pub bytes: u64,
}

type Chunk = Result<Bytes, io::Error>;

/// Build the client response for an event-stream backend response and start
/// relaying its body.
pub fn relay(upstream: reqwest::Response, request_id: &str) -> Response {
    let status = upstream.status();
    let (tx, rx) = mpsc::channel::<Chunk>(1);
    let request_id = request_id.to_owned();

    tokio::spawn(async move {
        let started = Instant::now();
        tracing::debug!(request_id = %request_id, "Relaying event stream");
        let stats = pump(upstream.bytes_stream(), tx).await;
        tracing::info!(
            request_id = %request_id,
            outcome = stats.outcome.as_str(),
            chunks = stats.chunks,
            bytes = stats.bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Event stream finished"
        );
        metrics::record_stream(&stats);
    });

    let mut response = Response::new(Body::from_stream(ReceiverStream::new(rx)));
    *response.status_mut() = status;
    *response.headers_mut() = event_stream_headers();
    response
}

/// Copy chunks from `source` into `sink` until either side ends.
pub async fn pump<S, E>(source: S, sink: mpsc::Sender<Chunk>) -> StreamStats
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut source = std::pin::pin!(source);
    let mut stats = StreamStats {
        outcome: StreamOutcome::Completed,
        chunks: 0,
        bytes: 0,
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = sink.closed() => {
                stats.outcome = StreamOutcome::ClientGone;
                return stats;
            }
            next = source.next() => next,
        };

        match next {
            None => return stats,
            Some(Ok(chunk)) => {
                let len = chunk.len() as u64;
                if sink.send(Ok(chunk)).await.is_err() {
                    stats.outcome = StreamOutcome::ClientGone;
                    return stats;
                }
                stats.chunks += 1;
                stats.bytes += len;
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Backend stream failed");
                let _ = sink.send(Err(io::Error::other(e))).await;
                stats.outcome = StreamOutcome::Errored;
                return stats;
            }
        }
    }
}
