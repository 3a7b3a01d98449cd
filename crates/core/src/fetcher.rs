use crate::{ProductCatalog, Retrieval, StoreError};
use tracing::warn;

/// Sweeps every collection in the catalog and flattens the rows into one
/// ordered sequence. A collection that fails to read is logged and skipped so
/// one broken table cannot abort the whole fetch; only a failure to enumerate
/// the collections themselves propagates.
pub async fn fetch_all<C>(catalog: &C) -> Result<Retrieval, StoreError>
where
    C: ProductCatalog + Sync,
{
    let collections = catalog.list_collections().await?;
    let mut records = Vec::new();

    for collection in &collections {
        match catalog.read_collection(collection).await {
            Ok(rows) => records.extend(rows),
            Err(error) => {
                warn!(collection = %collection, error = %error, "skipping unreadable collection");
            }
        }
    }

    if records.is_empty() {
        Ok(Retrieval::Empty)
    } else {
        Ok(Retrieval::Records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::fetch_all;
    use crate::{CatalogRecord, FieldValue, ProductCatalog, Retrieval, StoreError};
    use async_trait::async_trait;

    struct FlakyCatalog {
        broken: Vec<&'static str>,
    }

    #[async_trait]
    impl ProductCatalog for FlakyCatalog {
        async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
            Ok(vec![
                "keyboards".to_string(),
                "legacy".to_string(),
                "mice".to_string(),
            ])
        }

        async fn read_collection(&self, name: &str) -> Result<Vec<CatalogRecord>, StoreError> {
            if self.broken.contains(&name) {
                return Err(StoreError::CollectionRead {
                    collection: name.to_string(),
                    details: "malformed table".to_string(),
                });
            }

            Ok(vec![CatalogRecord::new(vec![(
                "collection".to_string(),
                FieldValue::Text(name.to_string()),
            )])])
        }
    }

    struct UnreachableCatalog;

    #[async_trait]
    impl ProductCatalog for UnreachableCatalog {
        async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        async fn read_collection(&self, _name: &str) -> Result<Vec<CatalogRecord>, StoreError> {
            unreachable!("enumeration already failed")
        }
    }

    #[tokio::test]
    async fn one_broken_collection_does_not_abort_the_sweep(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let catalog = FlakyCatalog {
            broken: vec!["legacy"],
        };

        let retrieval = fetch_all(&catalog).await?;

        let Retrieval::Records(records) = retrieval else {
            panic!("expected surviving records");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].fields[0].1,
            FieldValue::Text("keyboards".to_string())
        );
        assert_eq!(records[1].fields[0].1, FieldValue::Text("mice".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn all_reads_failing_yields_the_empty_marker() -> Result<(), Box<dyn std::error::Error>>
    {
        let catalog = FlakyCatalog {
            broken: vec!["keyboards", "legacy", "mice"],
        };

        assert_eq!(fetch_all(&catalog).await?, Retrieval::Empty);
        Ok(())
    }

    #[tokio::test]
    async fn enumeration_failure_propagates() {
        let error = fetch_all(&UnreachableCatalog)
            .await
            .expect_err("enumeration should fail");

        assert!(matches!(error, StoreError::Connection(_)));
    }
}
