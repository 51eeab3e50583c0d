//! Error types for the Deckhand domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Every message is assembled from fields we own (status codes, operation
//! names, truncated response bodies). Foreign error objects are reduced to a
//! short reason string at the boundary where they are caught.

use thiserror::Error;

/// The top-level error type for all Deckhand operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Remote document APIs ---
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    // --- Dispatcher preconditions ---
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    // --- Conversation driver ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Longest remote error body we keep in a message.
pub const MAX_DETAIL_LEN: usize = 512;

/// Cut an untrusted remote payload down to a bounded, single-line detail.
pub fn truncate_detail(raw: &str) -> String {
    let flat: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();
    if flat.chars().count() <= MAX_DETAIL_LEN {
        return flat.to_string();
    }
    let mut cut: String = flat.chars().take(MAX_DETAIL_LEN).collect();
    cut.push('…');
    cut
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Which remote document API a gateway call was talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteService {
    Slides,
    Drive,
}

impl std::fmt::Display for RemoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteService::Slides => write!(f, "Google Slides"),
            RemoteService::Drive => write!(f, "Google Drive"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("{service} API returned status {status}: {detail}")]
    Api {
        service: RemoteService,
        status: u16,
        detail: String,
    },

    #[error("{service} rejected the credentials (status {status})")]
    Unauthorized { service: RemoteService, status: u16 },

    #[error("{service} request failed: {reason}")]
    Network {
        service: RemoteService,
        reason: String,
    },

    #[error("Failed to parse {service} response: {reason}")]
    Decode {
        service: RemoteService,
        reason: String,
    },

    #[error("Slide {position} out of range. Presentation has {slide_count} slides.")]
    SlideNotFound { position: usize, slide_count: usize },

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

/// Failures the dispatcher reports back to the model as `{success: false}`.
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    #[error("Presentation already initialized. Current presentation: {title}")]
    AlreadyInitialized { title: String },

    #[error("No presentation created yet. Call initialize_document first.")]
    NotYetCreated,

    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("Invalid value for {argument}: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("Slide position {position} out of range. Presentation has {slide_count} slides.")]
    PositionOutOfRange { position: i64, slide_count: usize },

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Failed to {action}: {source}")]
    Gateway {
        action: &'static str,
        #[source]
        source: GatewayError,
    },
}

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Model call failed on iteration {iteration}: {source}")]
    Provider {
        iteration: u32,
        #[source]
        source: ProviderError,
    },

    #[error("Malformed model output on iteration {iteration}: {reason}")]
    MalformedOutput { iteration: u32, reason: String },

    #[error(
        "Agent did not complete the task within {max_iterations} iterations. \
         Presentation may be incomplete. State: {state}"
    )]
    IterationBudgetExhausted { max_iterations: u32, state: String },
}
