//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight handling, path
//! normalization, dispatch to health / DNI / RUC, and response decoration.

use crate::config::{AppState, HttpConfig};
use crate::handler::error::ApiError;
use crate::handler::path;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::lookup::{self, DniLookup, DniNumber, LookupError, RucLookup, RucNumber};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Routes requests to the lookup services it was constructed with
pub struct Router {
    base_path: String,
    pretty_json: bool,
    lookup_timeout: Option<Duration>,
    dni: Arc<dyn DniLookup>,
    ruc: Arc<dyn RucLookup>,
}

impl Router {
    pub fn new(http: &HttpConfig, dni: Arc<dyn DniLookup>, ruc: Arc<dyn RucLookup>) -> Self {
        Self {
            base_path: http.base_path.clone(),
            pretty_json: http.pretty_json,
            lookup_timeout: None,
            dni,
            ruc,
        }
    }

    /// Fail lookups that take longer than `timeout` with an internal error
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Produce the decorated response for one request
    ///
    /// `path` may carry a query string; it is ignored.
    pub async fn handle(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        if *method == Method::OPTIONS {
            return http::decorate(http::build_preflight_response());
        }

        let response = match self.dispatch(path).await {
            Ok(response) => response,
            Err(err) => {
                if let ApiError::Internal(ref cause) = err {
                    logger::log_error(&format!("Lookup failed for {path}: {cause}"));
                }
                http::build_error_response(err.status(), &err.to_string(), self.pretty_json)
            }
        };
        http::decorate(response)
    }

    async fn dispatch(&self, path: &str) -> Result<Response<Full<Bytes>>, ApiError> {
        let normalized = path::normalize(path, &self.base_path);
        if normalized.is_empty() || normalized == "health" {
            return Ok(http::build_health_response(self.pretty_json));
        }

        match path::segments(normalized).as_slice() {
            ["dni", candidate, ..] => self.lookup_dni(candidate).await,
            ["ruc", candidate, ..] => self.lookup_ruc(candidate).await,
            _ => Err(ApiError::RouteNotFound),
        }
    }

    async fn lookup_dni(&self, candidate: &str) -> Result<Response<Full<Bytes>>, ApiError> {
        let dni = DniNumber::parse(candidate).ok_or(ApiError::InvalidDni)?;
        let service = Arc::clone(&self.dni);
        let person = run_lookup(async move { service.get(&dni).await }, self.lookup_timeout)
            .await?
            .ok_or(ApiError::DniNotFound)?;
        Ok(http::build_success_response(&person, self.pretty_json))
    }

    async fn lookup_ruc(&self, candidate: &str) -> Result<Response<Full<Bytes>>, ApiError> {
        let ruc = RucNumber::parse(candidate).ok_or(ApiError::InvalidRuc)?;
        let service = Arc::clone(&self.ruc);
        let company = run_lookup(async move { service.get(&ruc).await }, self.lookup_timeout)
            .await?
            .ok_or(ApiError::RucNotFound)?;
        Ok(http::build_success_response(&company, self.pretty_json))
    }
}

/// Run a lookup on its own task so a panicking collaborator becomes an error
///
/// The task is aborted once `limit` elapses.
async fn run_lookup<T, F>(task: F, limit: Option<Duration>) -> lookup::Result<T>
where
    T: Send + 'static,
    F: Future<Output = lookup::Result<T>> + Send + 'static,
{
    let mut handle = tokio::spawn(task);
    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(LookupError::TimedOut(limit));
            }
        },
        None => handle.await,
    };
    joined.map_err(|e| LookupError::Aborted(e.to_string()))?
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let logging = &state.config.logging;

    if logging.show_headers {
        logger::log_headers_count(req.headers().len());
    }

    let response = state.router.handle(req.method(), req.uri().path()).await;

    if logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &logging.access_log_format);
    }

    Ok(response)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
