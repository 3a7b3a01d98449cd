use crate::{CatalogRecord, ChatGateway, ChatMessage, GatewayError, Retrieval};

pub const NO_MATCH_ANSWER: &str = "Sorry, no matching product was found in the database.";

const GREETING_ANSWER: &str = "Hello! I'm your Ajazz assistant. You can ask me about Ajazz products like keyboards, mice, and other accessories.";

const OFF_TOPIC_ANSWER: &str = "I am only designed to answer Ajazz's product-related queries only.";

pub fn greeting() -> &'static str {
    GREETING_ANSWER
}

pub fn off_topic() -> &'static str {
    OFF_TOPIC_ANSWER
}

pub fn serialize_records(records: &[CatalogRecord]) -> String {
    records
        .iter()
        .map(CatalogRecord::as_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn grounding_instruction(user_text: &str) -> String {
    format!(
        "You are a helpful product assistant.\n\
         Use ONLY the provided database results to respond to the user's question.\n\
         Do not invent or assume details not present.\n\
         User question: {user_text}"
    )
}

/// Produces the final answer for a PRODUCT query. An empty retrieval short
/// circuits to the fixed no-match text without touching the gateway.
pub async fn synthesize<G>(
    gateway: &G,
    retrieval: &Retrieval,
    user_text: &str,
) -> Result<String, GatewayError>
where
    G: ChatGateway + Sync,
{
    let records = match retrieval {
        Retrieval::Empty => return Ok(NO_MATCH_ANSWER.to_string()),
        Retrieval::Records(records) => records,
    };

    let messages = [
        ChatMessage::system(grounding_instruction(user_text)),
        ChatMessage::user(serialize_records(records)),
    ];

    gateway.complete(&messages).await
}
