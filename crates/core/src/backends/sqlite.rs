use crate::{CatalogRecord, FieldValue, ProductCatalog, StoreError};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Read-only catalog over a SQLite database. Every call opens its own
/// connection and drops it on exit, so no handle outlives a request.
pub struct SqliteCatalog {
    path: PathBuf,
}

impl SqliteCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(path: &Path) -> Result<Connection, StoreError> {
        Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|error| StoreError::Connection(error.to_string()))
    }
}

#[async_trait]
impl ProductCatalog for SqliteCatalog {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || list_collections_blocking(&path))
            .await
            .map_err(|error| StoreError::Worker(error.to_string()))?
    }

    async fn read_collection(&self, name: &str) -> Result<Vec<CatalogRecord>, StoreError> {
        let path = self.path.clone();
        let collection = name.to_string();

        tokio::task::spawn_blocking(move || read_collection_blocking(&path, &collection))
            .await
            .map_err(|error| StoreError::Worker(error.to_string()))?
    }
}

fn list_collections_blocking(path: &Path) -> Result<Vec<String>, StoreError> {
    let connection = SqliteCatalog::open(path)?;

    let mut statement = connection
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .map_err(|error| StoreError::Connection(error.to_string()))?;

    let names = statement
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|error| StoreError::Connection(error.to_string()))?;

    Ok(names)
}

fn read_collection_blocking(path: &Path, collection: &str) -> Result<Vec<CatalogRecord>, StoreError> {
    let connection = SqliteCatalog::open(path)?;

    // Collection names come from sqlite_master, so quoting is the only
    // escaping a full read needs.
    let query = format!("SELECT * FROM \"{}\"", collection.replace('"', "\"\""));
    let mut statement = connection
        .prepare(&query)
        .map_err(|error| read_failure(collection, error))?;

    let columns: Vec<String> = statement
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = statement
        .query([])
        .map_err(|error| read_failure(collection, error))?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(|error| read_failure(collection, error))? {
        let mut fields = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = row
                .get_ref(index)
                .map_err(|error| read_failure(collection, error))?;
            fields.push((column.clone(), field_value(value)));
        }
        records.push(CatalogRecord::new(fields));
    }

    Ok(records)
}

fn read_failure(collection: &str, error: rusqlite::Error) -> StoreError {
    StoreError::CollectionRead {
        collection: collection.to_string(),
        details: error.to_string(),
    }
}

fn field_value(raw: ValueRef<'_>) -> FieldValue {
    match raw {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(value) => FieldValue::Integer(value),
        ValueRef::Real(value) => FieldValue::Real(value),
        ValueRef::Text(value) => FieldValue::Text(String::from_utf8_lossy(value).to_string()),
        ValueRef::Blob(value) => FieldValue::Text(format!("<{} byte blob>", value.len())),
    }
}
