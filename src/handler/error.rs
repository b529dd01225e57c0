use hyper::StatusCode;
use thiserror::Error;

use crate::lookup::LookupError;

/// Terminal outcome of a request that did not produce data
///
/// The display text is the message sent to the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("DNI debe tener 8 dígitos")]
    InvalidDni,

    #[error("RUC debe tener 11 dígitos")]
    InvalidRuc,

    #[error("No se encontró información para el DNI proporcionado")]
    DniNotFound,

    #[error("No se encontró información para el RUC proporcionado")]
    RucNotFound,

    #[error("Endpoint no encontrado. Consulta /health para ver los endpoints disponibles.")]
    RouteNotFound,

    #[error("Error interno del servidor: {0}")]
    Internal(#[from] LookupError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDni | Self::InvalidRuc => StatusCode::BAD_REQUEST,
            Self::DniNotFound | Self::RucNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
