//! HTTP response building module
//!
//! Builds the JSON envelopes returned by every endpoint:
//! - success: `{ "success": true, "data": ... }`
//! - error: `{ "success": false, "message": ... }`
//! - health: `{ "success": true, "message", "version", "endpoints" }`

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::logger;

pub const API_VERSION: &str = "1.0.0";

const SERVICE_MESSAGE: &str = "Peru Consult API is running";

const ENDPOINTS: [(&str, &str); 3] = [
    ("GET /dni/{number}", "Consulta DNI"),
    ("GET /ruc/{number}", "Consulta RUC"),
    ("GET /health", "Health check"),
];

#[derive(Serialize)]
struct SuccessEnvelope<'a, T: Serialize> {
    success: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    message: &'a str,
}

#[derive(Serialize)]
struct HealthEnvelope {
    success: bool,
    message: &'static str,
    version: &'static str,
    endpoints: BTreeMap<&'static str, &'static str>,
}

/// Build 200 response wrapping `data` in a success envelope
pub fn build_success_response<T: Serialize>(data: &T, pretty: bool) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &SuccessEnvelope {
            success: true,
            data,
        },
        pretty,
    )
}

/// Build error envelope response with the given status
pub fn build_error_response(
    status: StatusCode,
    message: &str,
    pretty: bool,
) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ErrorEnvelope {
            success: false,
            message,
        },
        pretty,
    )
}

/// Build health check response listing the available endpoints
pub fn build_health_response(pretty: bool) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthEnvelope {
            success: true,
            message: SERVICE_MESSAGE,
            version: API_VERSION,
            endpoints: ENDPOINTS.into_iter().collect(),
        },
        pretty,
    )
}

/// Build OPTIONS response (preflight request)
pub fn build_preflight_response() -> Response<Full<Bytes>> {
    Response::new(Full::new(Bytes::new()))
}

/// Serialize `body` and build the response
///
/// Non-ASCII text is written as-is; a serialization failure yields a static
/// 500 error envelope.
fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    pretty: bool,
) -> Response<Full<Bytes>> {
    let json = if pretty {
        serde_json::to_vec_pretty(body)
    } else {
        serde_json::to_vec(body)
    };

    match json {
        Ok(bytes) => Response::builder()
            .status(status)
            .body(Full::new(Bytes::from(bytes)))
            .unwrap_or_else(|e| {
                logger::log_error(&format!("Failed to build {status} response: {e}"));
                Response::new(Full::new(Bytes::new()))
            }),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            let mut response = Response::new(Full::new(Bytes::from_static(
                br#"{"success":false,"message":"Error interno del servidor: serialization failed"}"#,
            )));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
