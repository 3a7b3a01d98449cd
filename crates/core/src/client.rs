use crate::error::ClientError;
use crate::models::QuerySubmission;
use reqwest::Client;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1800);

pub const EMPTY_QUERY_NOTICE: &str = "Please enter a non-empty query.";

const MISSING_ANSWER_FALLBACK: &str = "The assistant could not process your request.";

const PROGRESS_PREFIX: &str = "AI is processing your request";
const PATIENCE_NOTICE: &str = "This may take a little longer, please be patient...";

const CLEAR_LINE: &str = "\r\x1b[2K";
const CURSOR_UP: &str = "\x1b[1A";
const CURSOR_DOWN: &str = "\x1b[1B";

/// Failure classes distinguished at the transport boundary. Each maps to its
/// own user-facing message, independent of the server-side taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Unreachable,
    TimedOut,
    ServerError,
    Unexpected,
}

impl TransportFailure {
    pub fn message(self) -> &'static str {
        match self {
            TransportFailure::Unreachable => {
                "Unable to connect to the assistant. Please check your internet connection or try again later."
            }
            TransportFailure::TimedOut => "Request timed out. Please try again shortly.",
            TransportFailure::ServerError => {
                "Something went wrong on the server. Please try again later."
            }
            TransportFailure::Unexpected => {
                "An unexpected error occurred. Please try again later."
            }
        }
    }

    fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportFailure::TimedOut
        } else if error.is_connect() {
            TransportFailure::Unreachable
        } else if error.status().is_some() {
            TransportFailure::ServerError
        } else {
            TransportFailure::Unexpected
        }
    }
}

/// Terminal result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Answer(String),
    Failure(TransportFailure),
}

impl SubmissionOutcome {
    pub fn message(&self) -> &str {
        match self {
            SubmissionOutcome::Answer(text) => text,
            SubmissionOutcome::Failure(failure) => failure.message(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SubmissionOutcome::Failure(_))
    }
}

/// Cadence of the progress animation and the one-time patience notice.
#[derive(Debug, Clone, Copy)]
pub struct ProgressStyle {
    pub interval: Duration,
    pub patience_after: Duration,
}

impl Default for ProgressStyle {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            patience_after: Duration::from_secs(15),
        }
    }
}

/// One conversation against the assistant server. Owns the last submitted
/// text for retry; only a failed outcome arms the retry action.
pub struct ChatSession {
    transport: Client,
    endpoint: Url,
    style: ProgressStyle,
    last_query: Option<String>,
    retry_armed: bool,
}

impl ChatSession {
    pub fn connect(endpoint: &str) -> Result<Self, ClientError> {
        Self::with_timeouts(endpoint, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    /// The model round trip can be very slow, so the defaults are generous;
    /// tests shrink them.
    pub fn with_timeouts(
        endpoint: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint)?;
        let transport = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            transport,
            endpoint,
            style: ProgressStyle::default(),
            last_query: None,
            retry_armed: false,
        })
    }

    pub fn with_progress_style(mut self, style: ProgressStyle) -> Self {
        self.style = style;
        self
    }

    pub fn can_retry(&self) -> bool {
        self.retry_armed
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Submits one query. Empty input is rejected locally (returns `None`)
    /// before any network activity. While the call is outstanding a progress
    /// animation runs as a second task; resolution cancels it, the in-flight
    /// request itself is never aborted.
    pub async fn submit(&mut self, text: &str) -> Option<SubmissionOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let submission = QuerySubmission::new(trimmed);
        self.last_query = Some(submission.text.clone());
        self.retry_armed = false;

        let token = CancellationToken::new();
        let animation = tokio::spawn(animate_progress(token.clone(), self.style));

        let outcome = self.deliver(&submission).await;

        token.cancel();
        let _ = animation.await;

        self.retry_armed = outcome.is_failure();
        Some(outcome)
    }

    /// Resubmits the last text as a fresh submission. Returns `None` when no
    /// failed outcome has armed the retry action.
    pub async fn retry(&mut self) -> Option<SubmissionOutcome> {
        if !self.retry_armed {
            return None;
        }

        let text = self.last_query.clone()?;
        self.submit(&text).await
    }

    async fn deliver(&self, submission: &QuerySubmission) -> SubmissionOutcome {
        debug!(id = %submission.id, text = %submission.text, "delivering query");

        let result = self
            .transport
            .post(self.endpoint.clone())
            .json(&json!({ "customer_message": submission.text }))
            .send()
            .await
            .and_then(|response| response.error_for_status());

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                let failure = TransportFailure::from_transport(&error);
                debug!(id = %submission.id, error = %error, ?failure, "delivery failed");
                return SubmissionOutcome::Failure(failure);
            }
        };

        match response.json::<Value>().await {
            Ok(body) => match body.get("answer").and_then(Value::as_str) {
                Some(answer) => SubmissionOutcome::Answer(answer.to_string()),
                None => SubmissionOutcome::Answer(MISSING_ANSWER_FALLBACK.to_string()),
            },
            Err(error) if error.is_timeout() => {
                SubmissionOutcome::Failure(TransportFailure::TimedOut)
            }
            Err(_) => SubmissionOutcome::Failure(TransportFailure::Unexpected),
        }
    }
}

/// Animates the processing line until cancelled, showing the patience notice
/// once past the threshold and erasing both before handing the lines back.
async fn animate_progress(token: CancellationToken, style: ProgressStyle) {
    let started = Instant::now();
    let mut tick = 0usize;
    let mut patience_shown = false;
    let mut output = io::stdout();

    loop {
        let _ = write!(output, "{}", progress_frame(tick));
        let _ = output.flush();

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(style.interval) => {}
        }

        tick += 1;
        if !patience_shown && started.elapsed() >= style.patience_after {
            let _ = write!(output, "{}", patience_frame());
            patience_shown = true;
        }
    }

    let _ = write!(output, "{}", teardown_frame(patience_shown));
    let _ = output.flush();
}

fn progress_frame(tick: usize) -> String {
    format!("{CLEAR_LINE}{PROGRESS_PREFIX}{}", ".".repeat(tick % 4))
}

// Prints the notice on its own line, then parks the cursor back on the
// progress line so the next frame overwrites the right text.
fn patience_frame() -> String {
    format!("\n{PATIENCE_NOTICE}{CURSOR_UP}\r")
}

fn teardown_frame(patience_shown: bool) -> String {
    if patience_shown {
        format!("{CLEAR_LINE}{CURSOR_DOWN}{CLEAR_LINE}{CURSOR_UP}")
    } else {
        CLEAR_LINE.to_string()
    }
}
