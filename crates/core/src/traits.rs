use crate::{CatalogRecord, ChatMessage, GatewayError, StoreError};
use async_trait::async_trait;

/// Text-completion backend. Implementations send the ordered message list and
/// return the raw reply; retry policy belongs to the caller chain.
#[async_trait]
pub trait ChatGateway {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError>;
}

/// Tabular data source holding named collections of records.
#[async_trait]
pub trait ProductCatalog {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    async fn read_collection(&self, name: &str) -> Result<Vec<CatalogRecord>, StoreError>;
}
