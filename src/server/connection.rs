// Connection handling module
// Accepts a TCP connection and serves HTTP/1.1 on it

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::cell::Cell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::signal::Shutdown;
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection unless the connection limit is reached.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `shutdown` - Closes the connection once requested
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: &Arc<Shutdown>,
) {
    // Increment first, then check, so concurrent accepts cannot both pass
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

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        Arc::clone(shutdown),
    );
}

/// Tracks requests in flight on one connection and when it was last busy
struct IdleClock {
    in_flight: Cell<usize>,
    last_active: Cell<Instant>,
}

/// Marks a request as in flight until dropped
struct InFlight(Rc<IdleClock>);

impl IdleClock {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            in_flight: Cell::new(0),
            last_active: Cell::new(Instant::now()),
        })
    }

    fn start(self: &Rc<Self>) -> InFlight {
        self.in_flight.set(self.in_flight.get() + 1);
        self.last_active.set(Instant::now());
        InFlight(Rc::clone(self))
    }

    fn finish(&self) {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        self.last_active.set(Instant::now());
    }

    /// Earliest instant the connection can have been idle for `limit`
    fn deadline(&self, limit: Duration) -> Instant {
        if self.in_flight.get() > 0 {
            Instant::now() + limit
        } else {
            self.last_active.get() + limit
        }
    }

    fn is_idle_for(&self, limit: Duration) -> bool {
        self.in_flight.get() == 0 && self.last_active.get().elapsed() >= limit
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Serve one connection on a local task, decrementing the counter when done.
///
/// Header reads are bounded by `read_timeout`. The connection is closed
/// gracefully once it has been idle for `keep_alive_timeout` or shutdown is
/// requested; a request already in progress still gets its response.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    shutdown: Arc<Shutdown>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let keep_alive = performance.keep_alive_timeout > 0;
        let idle_limit = Duration::from_secs(performance.keep_alive_timeout);

        let mut builder = http1::Builder::new();
        builder.timer(TokioTimer::new()).keep_alive(keep_alive);
        if performance.read_timeout > 0 {
            builder.header_read_timeout(Duration::from_secs(performance.read_timeout));
        }

        let clock = IdleClock::new();
        let service_clock = Rc::clone(&clock);
        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let in_flight = service_clock.start();
                let state = Arc::clone(&service_state);
                async move {
                    let _in_flight = in_flight;
                    handler::handle_request(req, state, peer_addr).await
                }
            }),
        );
        tokio::pin!(conn);

        let mut closing = false;
        let result = loop {
            tokio::select! {
                res = conn.as_mut() => break res,

                () = shutdown.wait(), if !closing => {
                    closing = true;
                    conn.as_mut().graceful_shutdown();
                }

                () = tokio::time::sleep_until(clock.deadline(idle_limit)), if keep_alive && !closing => {
                    if clock.is_idle_for(idle_limit) {
                        closing = true;
                        conn.as_mut().graceful_shutdown();
                    }
                }
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lookup::{self, Company, DniLookup, DniNumber, Person, RucLookup, RucNumber};
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::LocalSet;

    const DNI_REQUEST: &[u8] = b"GET /dni/12345678 HTTP/1.1\r\nHost: localhost\r\n\r\n";

    struct SlowDni(Duration);

    #[async_trait]
    impl DniLookup for SlowDni {
        async fn get(&self, dni: &DniNumber) -> lookup::Result<Option<Person>> {
            tokio::time::sleep(self.0).await;
            Ok(Some(Person {
                dni: dni.to_string(),
                nombres: "ANA".to_string(),
                apellido_paterno: "QUISPE".to_string(),
                apellido_materno: "MAMANI".to_string(),
                cod_verifica: None,
            }))
        }
    }

    struct NoRuc;

    #[async_trait]
    impl RucLookup for NoRuc {
        async fn get(&self, _ruc: &RucNumber) -> lookup::Result<Option<Company>> {
            Ok(None)
        }
    }

    fn state(dni_delay: Duration, read: u64, write: u64, keep_alive: u64) -> Arc<AppState> {
        let mut config = Config::default();
        config.logging.access_log = false;
        config.http.pretty_json = false;
        config.performance.read_timeout = read;
        config.performance.write_timeout = write;
        config.performance.keep_alive_timeout = keep_alive;
        Arc::new(AppState::new(
            config,
            Arc::new(SlowDni(dni_delay)),
            Arc::new(NoRuc),
        ))
    }

    /// Bind a listener and serve exactly one accepted connection
    async fn serve_one(state: Arc<AppState>, shutdown: Arc<Shutdown>) -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let conn_counter = Arc::clone(&counter);
        tokio::task::spawn_local(async move {
            let (stream, peer_addr) = listener.accept().await.unwrap();
            accept_connection(stream, peer_addr, &state, &conn_counter, &shutdown);
        });
        (addr, counter)
    }

    /// Read one response with a content-length body, or up to EOF
    async fn read_response(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if body.len() >= length {
                    return text;
                }
            }
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::from_utf8_lossy(&buf).to_string();
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    #[tokio::test]
    async fn test_keep_alive_requests_outlive_read_timeout() {
        LocalSet::new()
            .run_until(async {
                let state = state(Duration::from_millis(700), 1, 5, 75);
                let (addr, _) = serve_one(state, Arc::new(Shutdown::new())).await;

                let mut client = TcpStream::connect(addr).await.unwrap();
                for round in 0..2 {
                    client.write_all(DNI_REQUEST).await.unwrap();
                    let response = read_response(&mut client).await;
                    assert!(response.starts_with("HTTP/1.1 200 OK"), "request {round}: {response:?}");
                    assert!(response.contains(r#""dni":"12345678""#), "request {round}");
                }
            })
            .await;
    }

    #[tokio::test]
    async fn test_idle_keep_alive_connection_is_closed() {
        LocalSet::new()
            .run_until(async {
                let state = state(Duration::ZERO, 30, 30, 1);
                let (addr, counter) = serve_one(state, Arc::new(Shutdown::new())).await;

                let mut client = TcpStream::connect(addr).await.unwrap();
                client.write_all(DNI_REQUEST).await.unwrap();
                assert!(read_response(&mut client).await.starts_with("HTTP/1.1 200 OK"));

                let mut rest = Vec::new();
                let read = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(read, 0);

                tokio::time::sleep(Duration::from_millis(50)).await;
                assert_eq!(counter.load(Ordering::SeqCst), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_connection() {
        LocalSet::new()
            .run_until(async {
                let shutdown = Arc::new(Shutdown::new());
                let state = state(Duration::ZERO, 30, 30, 75);
                let (addr, _) = serve_one(state, Arc::clone(&shutdown)).await;

                let mut client = TcpStream::connect(addr).await.unwrap();
                client.write_all(DNI_REQUEST).await.unwrap();
                assert!(read_response(&mut client).await.starts_with("HTTP/1.1 200 OK"));

                shutdown.trigger();
                let mut rest = Vec::new();
                let read = tokio::time::timeout(Duration::from_secs(1), client.read_to_end(&mut rest))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(read, 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_lets_request_in_progress_finish() {
        LocalSet::new()
            .run_until(async {
                let shutdown = Arc::new(Shutdown::new());
                let state = state(Duration::from_millis(300), 30, 30, 75);
                let (addr, _) = serve_one(state, Arc::clone(&shutdown)).await;

                let mut client = TcpStream::connect(addr).await.unwrap();
                client.write_all(DNI_REQUEST).await.unwrap();
                tokio::time::sleep(Duration::from_millis(100)).await;
                shutdown.trigger();

                let response = read_response(&mut client).await;
                assert!(response.starts_with("HTTP/1.1 200 OK"), "{response:?}");
                assert!(response.contains(r#""success":true"#));
            })
            .await;
    }

    #[test]
    fn test_idle_clock() {
        let clock = IdleClock::new();
        let limit = Duration::from_secs(60);
        assert!(!clock.is_idle_for(limit));
        assert!(clock.is_idle_for(Duration::ZERO));

        let in_flight = clock.start();
        assert!(!clock.is_idle_for(Duration::ZERO));
        assert!(clock.deadline(limit) > Instant::now());
        drop(in_flight);
        assert_eq!(clock.in_flight.get(), 0);
        assert!(clock.is_idle_for(Duration::ZERO));
    }
}
