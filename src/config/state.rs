// Application state module
// Holds configuration and the router shared by all connections

use crate::handler::Router;
use crate::lookup::{DniLookup, RucLookup};
use std::sync::Arc;
use std::time::Duration;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    pub router: Router,
}

impl AppState {
    /// Build state with the given lookup services injected into the router
    pub fn new(config: Config, dni: Arc<dyn DniLookup>, ruc: Arc<dyn RucLookup>) -> Self {
        let mut router = Router::new(&config.http, dni, ruc);
        if config.performance.write_timeout > 0 {
            router = router.with_lookup_timeout(Duration::from_secs(config.performance.write_timeout));
        }
        Self { config, router }
    }
}
