// RUC lookup over the shared upstream context

use async_trait::async_trait;
use std::sync::Arc;

use super::client::{expand_template, ContextClient};
use super::error::Result;
use super::model::Company;
use super::number::RucNumber;
use super::RucLookup;

/// Builds RUC lookup services bound to one upstream context
pub struct RucFactory {
    client: Arc<ContextClient>,
    url_template: String,
}

impl RucFactory {
    pub fn new(client: Arc<ContextClient>, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    pub fn create(&self) -> HttpRucService {
        HttpRucService {
            client: Arc::clone(&self.client),
            url_template: self.url_template.clone(),
        }
    }
}

pub struct HttpRucService {
    client: Arc<ContextClient>,
    url_template: String,
}

#[async_trait]
impl RucLookup for HttpRucService {
    async fn get(&self, ruc: &RucNumber) -> Result<Option<Company>> {
        let url = expand_template(&self.url_template, ruc.as_str());
        self.client.get_json(&url).await
    }
}
