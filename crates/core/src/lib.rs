pub mod backends;
pub mod classifier;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod synthesizer;
pub mod traits;

pub use backends::{CompletionClient, CompletionConfig, SqliteCatalog};
pub use classifier::{classify, normalize_label};
pub use client::{
    ChatSession, ProgressStyle, SubmissionOutcome, TransportFailure, EMPTY_QUERY_NOTICE,
};
pub use error::{ClientError, GatewayError, QueryError, StoreError};
pub use fetcher::fetch_all;
pub use models::{
    CatalogRecord, ChatMessage, Classification, FieldValue, QuerySubmission, Retrieval, Role,
};
pub use orchestrator::QueryPipeline;
pub use server::{router, serve, INTERNAL_ERROR_ANSWER};
pub use synthesizer::{greeting, off_topic, synthesize, NO_MATCH_ANSWER};
pub use traits::{ChatGateway, ProductCatalog};
