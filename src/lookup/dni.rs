// DNI lookup over the shared upstream context

use async_trait::async_trait;
use std::sync::Arc;

use super::client::{expand_template, ContextClient};
use super::error::Result;
use super::model::Person;
use super::number::DniNumber;
use super::DniLookup;

/// Builds DNI lookup services bound to one upstream context
pub struct DniFactory {
    client: Arc<ContextClient>,
    url_template: String,
}

impl DniFactory {
    pub fn new(client: Arc<ContextClient>, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    pub fn create(&self) -> HttpDniService {
        HttpDniService {
            client: Arc::clone(&self.client),
            url_template: self.url_template.clone(),
        }
    }
}

pub struct HttpDniService {
    client: Arc<ContextClient>,
    url_template: String,
}

#[async_trait]
impl DniLookup for HttpDniService {
    async fn get(&self, dni: &DniNumber) -> Result<Option<Person>> {
        let url = expand_template(&self.url_template, dni.as_str());
        self.client.get_json(&url).await
    }
}
