use crate::{ChatGateway, ChatMessage, Classification, GatewayError};
use tracing::debug;

const CLASSIFY_INSTRUCTION: &str = "Classify the user message strictly into one of the following:\n\
- 'PRODUCT' if it's about Ajazz hardware products (keyboards, mice, headphones, peripherals, accessories)\n\
- 'GREETING' if it's a friendly greeting\n\
- 'OTHER' for everything else";

/// Labels an incoming message with one gateway call. The backend reply is
/// free text, so the result goes through [`normalize_label`] before use.
pub async fn classify<G>(gateway: &G, user_text: &str) -> Result<Classification, GatewayError>
where
    G: ChatGateway + Sync,
{
    let messages = [
        ChatMessage::system(CLASSIFY_INSTRUCTION),
        ChatMessage::user(user_text),
    ];

    let reply = gateway.complete(&messages).await?;
    let classification = normalize_label(&reply);
    debug!(raw = %reply, ?classification, "classifier reply");

    Ok(classification)
}

/// Total mapping from a raw backend reply onto the closed label set. Anything
/// that is not exactly PRODUCT or GREETING after trimming and uppercasing
/// falls back to OTHER.
pub fn normalize_label(raw: &str) -> Classification {
    match raw.trim().to_uppercase().as_str() {
        "PRODUCT" => Classification::Product,
        "GREETING" => Classification::Greeting,
        _ => Classification::Other,
    }
}
