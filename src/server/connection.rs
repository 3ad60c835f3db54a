// Connection handling module
// Accepts a single TCP connection and serves it over HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Notify;

use super::idle::{ActivityTracker, TrackedStream};
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the configured connection limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: &Arc<Notify>,
) {
    // Increment first, then check, so concurrent accepts cannot overshoot
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        Arc::clone(shutdown),
    );
}

/// Serve one connection in a spawned task.
///
/// Keep-alive follows `keep_alive_timeout`. The connection is closed once no
/// byte has moved in either direction for the largest configured timeout, so
/// a slow but steady download is never cut off. On shutdown the connection
/// finishes its in-flight request and closes.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) {
    tokio::spawn(async move {
        let activity = Arc::new(ActivityTracker::new());
        let io = TokioIo::new(TrackedStream::new(stream, Arc::clone(&activity)));
        let perf = &state.config.performance;
        let idle_limit = Duration::from_secs(
            perf.keep_alive_timeout
                .max(perf.read_timeout)
                .max(perf.write_timeout)
                .max(1),
        );

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(perf.keep_alive_timeout > 0)
            .title_case_headers(true)
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(perf.read_timeout.max(1)));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );
        tokio::pin!(conn);

        let stop = shutdown.notified();
        tokio::pin!(stop);
        stop.as_mut().enable();

        let mut draining = false;
        let outcome = loop {
            let remaining = idle_limit.saturating_sub(activity.idle_for());
            tokio::select! {
                res = conn.as_mut() => break Some(res),
                () = &mut stop, if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
                () = tokio::time::sleep(remaining) => {
                    if activity.idle_for() >= idle_limit {
                        break None;
                    }
                }
            }
        };

        match outcome {
            Some(Ok(())) => {}
            Some(Err(err)) => logger::log_connection_error(&err),
            None => logger::log_debug(&format!(
                "Connection from {peer_addr} closed after {}s idle",
                idle_limit.as_secs()
            )),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
