pub mod completions;
pub mod sqlite;

pub use completions::{CompletionClient, CompletionConfig};
pub use sqlite::SqliteCatalog;
