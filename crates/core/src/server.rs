use crate::orchestrator::QueryPipeline;
use crate::traits::{ChatGateway, ProductCatalog};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::error;

pub const INTERNAL_ERROR_ANSWER: &str = "An internal error occurred. Please try again later.";

const MALFORMED_BODY_ERROR: &str = "Content-Type must be application/json";
const MISSING_FIELD_ERROR: &str = "Missing 'customer_message' field";

pub fn router<G, C>(pipeline: Arc<QueryPipeline<G, C>>) -> Router
where
    G: ChatGateway + Send + Sync + 'static,
    C: ProductCatalog + Send + Sync + 'static,
{
    Router::new()
        .route("/query", post(handle_query::<G, C>))
        .with_state(pipeline)
}

pub async fn serve<G, C>(
    listener: TcpListener,
    pipeline: Arc<QueryPipeline<G, C>>,
) -> std::io::Result<()>
where
    G: ChatGateway + Send + Sync + 'static,
    C: ProductCatalog + Send + Sync + 'static,
{
    axum::serve(listener, router(pipeline)).await
}

/// Accepts `{"customer_message": text}` and answers `{"answer": text}`. The
/// malformed-request cases are the only ones with a distinct client-visible
/// message; every internal failure collapses to one apology body.
async fn handle_query<G, C>(
    State(pipeline): State<Arc<QueryPipeline<G, C>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    G: ChatGateway + Send + Sync + 'static,
    C: ProductCatalog + Send + Sync + 'static,
{
    let body = match payload {
        Ok(Json(body)) => body,
        Err(_) => return client_error(MALFORMED_BODY_ERROR),
    };

    let Some(customer_message) = body.get("customer_message").and_then(Value::as_str) else {
        return client_error(MISSING_FIELD_ERROR);
    };

    match pipeline.answer(customer_message).await {
        Ok(answer) => (StatusCode::OK, Json(json!({ "answer": answer }))).into_response(),
        Err(query_error) => {
            error!(error = %query_error, "query pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "answer": INTERNAL_ERROR_ANSWER })),
            )
                .into_response()
        }
    }
}

fn client_error(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::{router, INTERNAL_ERROR_ANSWER};
    use crate::orchestrator::QueryPipeline;
    use crate::synthesizer::{greeting, off_topic};
    use crate::{
        CatalogRecord, ChatGateway, ChatMessage, FieldValue, GatewayError, ProductCatalog,
        StoreError,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedGateway {
        replies: Mutex<VecDeque<&'static str>>,
        calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| {
                    GatewayError::BackendProtocolError("no scripted reply left".to_string())
                })
        }
    }

    struct SingleTableCatalog;

    #[async_trait]
    impl ProductCatalog for SingleTableCatalog {
        async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
            Ok(vec!["keyboards".to_string()])
        }

        async fn read_collection(&self, _name: &str) -> Result<Vec<CatalogRecord>, StoreError> {
            Ok(vec![CatalogRecord::new(vec![(
                "name".to_string(),
                FieldValue::Text("AK33".to_string()),
            )])])
        }
    }

    async fn spawn_server(
        gateway: Arc<ScriptedGateway>,
    ) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        struct SharedGateway(Arc<ScriptedGateway>);

        #[async_trait]
        impl ChatGateway for SharedGateway {
            async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
                self.0.complete(messages).await
            }
        }

        let pipeline = Arc::new(QueryPipeline::new(SharedGateway(gateway), SingleTableCatalog));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, router(pipeline))
                .await
                .expect("test server should run");
        });
        Ok(address)
    }

    #[tokio::test]
    async fn missing_field_is_rejected_before_classification(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let gateway = Arc::new(ScriptedGateway::new(&[]));
        let address = spawn_server(gateway.clone()).await?;

        let response = reqwest::Client::new()
            .post(format!("http://{address}/query"))
            .json(&json!({ "message": "hello" }))
            .send()
            .await?;

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "Missing 'customer_message' field");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_body_is_rejected_before_classification(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let gateway = Arc::new(ScriptedGateway::new(&[]));
        let address = spawn_server(gateway.clone()).await?;

        let response = reqwest::Client::new()
            .post(format!("http://{address}/query"))
            .header("content-type", "application/json")
            .body("not json at all")
            .send()
            .await?;

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "Content-Type must be application/json");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn greeting_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let gateway = Arc::new(ScriptedGateway::new(&["GREETING"]));
        let address = spawn_server(gateway).await?;

        let response = reqwest::Client::new()
            .post(format!("http://{address}/query"))
            .json(&json!({ "customer_message": "hello" }))
            .send()
            .await?;

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await?;
        assert_eq!(body["answer"], greeting());
        Ok(())
    }

    #[tokio::test]
    async fn off_topic_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let gateway = Arc::new(ScriptedGateway::new(&["OTHER"]));
        let address = spawn_server(gateway).await?;

        let response = reqwest::Client::new()
            .post(format!("http://{address}/query"))
            .json(&json!({ "customer_message": "What's the weather?" }))
            .send()
            .await?;

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await?;
        assert_eq!(body["answer"], off_topic());
        Ok(())
    }

    #[tokio::test]
    async fn internal_failures_collapse_to_one_apology() -> Result<(), Box<dyn std::error::Error>>
    {
        let gateway = Arc::new(ScriptedGateway::new(&[]));
        let address = spawn_server(gateway).await?;

        let response = reqwest::Client::new()
            .post(format!("http://{address}/query"))
            .json(&json!({ "customer_message": "hello" }))
            .send()
            .await?;

        assert_eq!(response.status().as_u16(), 500);
        let body: Value = response.json().await?;
        assert_eq!(body["answer"], INTERNAL_ERROR_ANSWER);
        Ok(())
    }
}
