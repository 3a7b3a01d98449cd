use crate::classifier::classify;
use crate::fetcher::fetch_all;
use crate::synthesizer::{greeting, off_topic, synthesize};
use crate::traits::{ChatGateway, ProductCatalog};
use crate::{Classification, QueryError};
use tracing::{debug, info};

/// Runs one query to completion: classify, branch, and for product questions
/// fetch the catalog and synthesize a grounded answer. Every call produces
/// exactly one outcome; backend causes stay in [`QueryError`] and are logged
/// here, never shown to the client.
pub struct QueryPipeline<G, C>
where
    G: ChatGateway,
    C: ProductCatalog,
{
    gateway: G,
    catalog: C,
}

impl<G, C> QueryPipeline<G, C>
where
    G: ChatGateway + Send + Sync,
    C: ProductCatalog + Send + Sync,
{
    pub fn new(gateway: G, catalog: C) -> Self {
        Self { gateway, catalog }
    }

    pub async fn answer(&self, customer_message: &str) -> Result<String, QueryError> {
        info!(message = %customer_message, "incoming query");

        let classification = classify(&self.gateway, customer_message)
            .await
            .map_err(QueryError::Classification)?;
        info!(?classification, "message classified");

        match classification {
            Classification::Greeting => Ok(greeting().to_string()),
            Classification::Other => Ok(off_topic().to_string()),
            Classification::Product => {
                let retrieval = fetch_all(&self.catalog).await?;
                debug!(?retrieval, "catalog rows retrieved");
                info!(records = retrieval.record_count(), "catalog sweep finished");

                let answer = synthesize(&self.gateway, &retrieval, customer_message)
                    .await
                    .map_err(QueryError::Synthesis)?;
                info!(answer = %answer, "final answer");
                Ok(answer)
            }
        }
    }
}
