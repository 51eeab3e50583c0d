//! # Deckhand Core
//!
//! Domain types, traits, and error definitions for the Deckhand presentation
//! agent. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (the language model, the presentation API,
//! the sharing API) is a trait here. Implementations live in their own
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/in-memory implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod gateway;
pub mod message;
pub mod operation;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, GatewayError, OperationError, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use gateway::{
    DocumentStructure, InsertedSlide, PresentationGateway, SharingGateway, SlideLayout,
    SlideSummary,
};
pub use message::{Message, MessageToolCall, Role, Transcript, TranscriptId};
pub use operation::{FinalizedDocument, Operation, OperationOutput, OperationRequest, OperationResult};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseBlock, ToolDefinition, Usage};
pub use session::{SessionState, SlideRecord};
