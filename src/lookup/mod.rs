//! Lookup module
//!
//! Defines the DNI and RUC lookup capabilities consumed by the router and
//! their HTTP-backed implementations:
//! - `DniLookup` / `RucLookup` traits (injected as trait objects)
//! - `ContextClient`, the shared upstream HTTP context
//! - `DniFactory` / `RucFactory` building services over that context

mod client;
mod dni;
mod error;
mod model;
mod number;
mod ruc;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::UpstreamConfig;

pub use client::ContextClient;
pub use dni::DniFactory;
pub use error::{LookupError, Result};
pub use model::{Company, Person};
pub use number::{DniNumber, RucNumber};
pub use ruc::RucFactory;

/// Person lookup by DNI
#[async_trait]
pub trait DniLookup: Send + Sync {
    /// `Ok(None)` when the source has no record for this number
    async fn get(&self, dni: &DniNumber) -> Result<Option<Person>>;
}

/// Company lookup by RUC
#[async_trait]
pub trait RucLookup: Send + Sync {
    /// `Ok(None)` when the source has no record for this number
    async fn get(&self, ruc: &RucNumber) -> Result<Option<Company>>;
}

/// Lookup services sharing one upstream context
pub struct Services {
    pub dni: Arc<dyn DniLookup>,
    pub ruc: Arc<dyn RucLookup>,
}

/// Build both HTTP lookup services from `[upstream]` configuration
pub fn from_config(config: &UpstreamConfig) -> Result<Services> {
    let client = Arc::new(ContextClient::new(config)?);
    let dni = DniFactory::new(Arc::clone(&client), config.dni_url.as_str()).create();
    let ruc = RucFactory::new(client, config.ruc_url.as_str()).create();

    Ok(Services {
        dni: Arc::new(dni),
        ruc: Arc::new(ruc),
    })
}
