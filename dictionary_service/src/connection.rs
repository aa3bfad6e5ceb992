//! Per-connection HTTP/1 serving with read and idle bounds.
//!
//! `axum::serve` exposes no connection timeouts, so each accepted socket is
//! driven by hyper directly. Hyper bounds the time to receive request
//! headers; a small watchdog closes keep-alive connections that stay idle.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, Router};
use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::debug;

use crate::settings::ServerConfig;

/// Timing limits applied by [`crate::server::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeOptions {
    /// Time allowed to receive the request line and headers.
    pub read_timeout: Duration,
    /// Time a keep-alive connection may sit without a request.
    pub idle_timeout: Duration,
    /// Time an idle-closed connection gets to finish writing.
    pub write_timeout: Duration,
    /// Time in-flight requests get after shutdown starts.
    pub drain_timeout: Duration,
}

impl From<&ServerConfig> for ServeOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            idle_timeout: config.idle_timeout(),
            write_timeout: config.request_timeout(),
            drain_timeout: config.shutdown_timeout(),
        }
    }
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

pub(crate) fn http1_builder(options: &ServeOptions) -> http1::Builder {
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(options.read_timeout)
        .keep_alive(true);
    builder
}

/// Requests in progress and the time the last one started or finished.
struct Activity {
    in_flight: AtomicUsize,
    last: Mutex<Instant>,
}

impl Activity {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            last: Mutex::new(Instant::now()),
        })
    }

    fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Instant::now();
        ActivityGuard(Arc::clone(self))
    }

    /// When the connection becomes idle-expired, assuming nothing else happens.
    fn deadline(&self, idle: Duration) -> Instant {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            Instant::now() + idle
        } else {
            *self.last.lock() + idle
        }
    }

    fn is_expired(&self, idle: Duration) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0 && *self.last.lock() + idle <= Instant::now()
    }
}

struct ActivityGuard(Arc<Activity>);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        *self.0.last.lock() = Instant::now();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Drive one accepted connection until the peer leaves, it idles out, or
/// `shutdown` fires and its in-flight request completes.
pub(crate) async fn serve_connection(
    builder: http1::Builder,
    stream: TcpStream,
    app: Router,
    options: ServeOptions,
    shutdown: CancellationToken,
) {
    let activity = Activity::new();
    let service = {
        let activity = Arc::clone(&activity);
        service_fn(move |request: Request<Incoming>| {
            let guard = activity.begin();
            let call = app.clone().call(request);
            async move {
                let response: Result<Response<Body>, Infallible> = call.await;
                drop(guard);
                response
            }
        })
    };

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut closing = false;
    let mut hard_stop: Option<Instant> = None;

    loop {
        let idle_at = activity.deadline(options.idle_timeout);
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!("connection closed with error: {}", e);
                }
                return;
            }
            _ = shutdown.cancelled(), if !closing => {
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
            _ = tokio::time::sleep_until(idle_at), if !closing => {
                if activity.is_expired(options.idle_timeout) {
                    debug!("closing idle connection");
                    conn.as_mut().graceful_shutdown();
                    closing = true;
                    hard_stop = Some(Instant::now() + options.write_timeout);
                }
            }
            _ = async {
                match hard_stop {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                debug!("dropping connection that did not finish after idle close");
                return;
            }
        }
    }
}
