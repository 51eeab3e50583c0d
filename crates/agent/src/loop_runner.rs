//! The conversation driver.

use chrono::Utc;
use deckhand_core::error::AgentError;
use deckhand_core::event::{DomainEvent, EventBus};
use deckhand_core::gateway::{PresentationGateway, SharingGateway};
use deckhand_core::message::{Message, Transcript};
use deckhand_core::operation::{FinalizedDocument, Operation, OperationRequest};
use deckhand_core::provider::{Provider, ProviderRequest, ResponseBlock};
use deckhand_tools::{OperationDispatcher, catalog};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::prompt::{AUTO_FINALIZE_WARNING, FINALIZE_NUDGE, SYSTEM_PROMPT, user_turn};

const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// What a successful generation hands back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutput {
    pub document_id: String,
    pub share_link: String,
    pub title: String,
    pub slide_count: usize,
    /// Model calls made, including the one that finalized
    pub iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl GenerationOutput {
    fn from_finalized(doc: &FinalizedDocument, iterations: u32, warning: Option<String>) -> Self {
        Self {
            document_id: doc.document_id.clone(),
            share_link: doc.share_link.clone(),
            title: doc.title.clone(),
            slide_count: doc.slide_count,
            iterations,
            warning,
        }
    }

    /// True when the deck was shared by the driver after the model ran out
    /// of iterations rather than by the model itself.
    pub fn budget_exhausted(&self) -> bool {
        self.warning.is_some()
    }
}

/// Drives the model through the operation workflow until the deck is shared.
///
/// The provider and gateways are long-lived and shared; each call to
/// [`run`](Self::run) gets its own transcript and session state.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    slides: Arc<dyn PresentationGateway>,
    sharing: Arc<dyn SharingGateway>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per model reply
    max_tokens: Option<u32>,

    /// Maximum model calls per run
    max_iterations: u32,

    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        slides: Arc<dyn PresentationGateway>,
        sharing: Arc<dyn SharingGateway>,
        model: impl Into<String>,
        temperature: f32,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            slides,
            sharing,
            model: model.into(),
            temperature,
            max_tokens: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_bus,
        }
    }

    /// Set the maximum number of model calls.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the max tokens per model reply.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Generate and share a deck for `prompt`.
    pub async fn run(&self, prompt: &str) -> Result<GenerationOutput, AgentError> {
        let mut transcript = Transcript::new();
        transcript.push(Message::system(SYSTEM_PROMPT));
        transcript.push(Message::user(user_turn(prompt)));

        info!(
            transcript_id = %transcript.id,
            model = %self.model,
            max_iterations = self.max_iterations,
            "Starting generation"
        );

        let outcome = self.drive(&mut transcript).await;

        match &outcome {
            Ok(output) => {
                info!(
                    transcript_id = %transcript.id,
                    document_id = %output.document_id,
                    slides = output.slide_count,
                    iterations = output.iterations,
                    "Generation complete"
                );
                self.event_bus.publish(DomainEvent::GenerationCompleted {
                    transcript_id: transcript.id.to_string(),
                    document_id: output.document_id.clone(),
                    slide_count: output.slide_count,
                    iterations: output.iterations,
                    auto_finalized: output.budget_exhausted(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(transcript_id = %transcript.id, error = %e, "Generation failed");
                self.event_bus.publish(DomainEvent::GenerationFailed {
                    transcript_id: transcript.id.to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }

        outcome
    }

    async fn drive(&self, transcript: &mut Transcript) -> Result<GenerationOutput, AgentError> {
        let mut dispatcher = OperationDispatcher::new(self.slides.clone(), self.sharing.clone());
        let tool_definitions = catalog::definitions();

        for iteration in 1..=self.max_iterations {
            debug!(transcript_id = %transcript.id, iteration, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: transcript.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|source| AgentError::Provider { iteration, source })?;

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    transcript_id: transcript.id.to_string(),
                    model: response.model.clone(),
                    tokens_used: usage.total_tokens,
                    timestamp: Utc::now(),
                });
            }

            let block_count = response.blocks.len();
            let mut requested_operation = false;

            for (index, block) in response.blocks.into_iter().enumerate() {
                let call = match block {
                    ResponseBlock::Text { text } => {
                        // The Messages API rejects blank text content blocks.
                        if text.trim().is_empty() {
                            debug!(iteration, block = index, "Skipping blank text block");
                        } else {
                            transcript.push(Message::assistant(text));
                        }
                        continue;
                    }
                    ResponseBlock::ToolUse { call } => call,
                };
                requested_operation = true;

                let request = OperationRequest::from_tool_call(&call)
                    .map_err(|reason| AgentError::MalformedOutput { iteration, reason })?;
                let call_id = call.id.clone();
                transcript.push(Message::operation_request(call));

                let start = Instant::now();
                let result = dispatcher.execute(&request).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                debug!(
                    operation = %request.name,
                    success = result.success,
                    duration_ms,
                    "Operation executed"
                );
                self.event_bus.publish(DomainEvent::OperationExecuted {
                    transcript_id: transcript.id.to_string(),
                    operation: request.name.clone(),
                    success: result.success,
                    duration_ms,
                    timestamp: Utc::now(),
                });

                transcript.push(Message::tool_result(call_id, result.to_observation()));

                if let Some(doc) = result.finalized() {
                    let skipped = block_count - index - 1;
                    if skipped > 0 {
                        warn!(skipped, "Ignoring content after successful finalization");
                    }
                    return Ok(GenerationOutput::from_finalized(doc, iteration, None));
                }
            }

            let state = dispatcher.state();
            if !requested_operation && state.is_initialized() && state.slide_count() > 0 {
                debug!(slides = state.slide_count(), "No operation requested, nudging to finalize");
                transcript.push(Message::user(FINALIZE_NUDGE));
            }
        }

        warn!(
            transcript_id = %transcript.id,
            max_iterations = self.max_iterations,
            "Iteration budget exhausted"
        );

        if dispatcher.state().is_initialized() {
            let finalize = OperationRequest {
                name: Operation::FinalizeDocument.name().to_string(),
                arguments: serde_json::Map::new(),
            };
            let result = dispatcher.execute(&finalize).await;
            if let Some(doc) = result.finalized() {
                return Ok(GenerationOutput::from_finalized(
                    doc,
                    self.max_iterations,
                    Some(AUTO_FINALIZE_WARNING.to_string()),
                ));
            }
        }

        Err(AgentError::IterationBudgetExhausted {
            max_iterations: self.max_iterations,
            state: dispatcher.state().snapshot(),
        })
    }
}
