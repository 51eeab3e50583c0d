//! Operation dispatcher: maps a named request onto the two gateways.
//!
//! The dispatcher owns the request's [`SessionState`]. `execute` never
//! fails: precondition violations, bad arguments, unknown names and gateway
//! errors all come back as `{success: false, error}` so the model can see
//! them and recover.

use deckhand_core::error::OperationError;
use deckhand_core::gateway::{PresentationGateway, SharingGateway, SlideLayout};
use deckhand_core::operation::{
    DocumentInitialized, DocumentInspection, FinalizedDocument, Operation, OperationOutput,
    OperationRequest, OperationResult, SlideInserted, SlideRefined,
};
use deckhand_core::session::SessionState;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

type Arguments = Map<String, Value>;

pub struct OperationDispatcher {
    slides: Arc<dyn PresentationGateway>,
    sharing: Arc<dyn SharingGateway>,
    state: SessionState,
}

impl OperationDispatcher {
    pub fn new(slides: Arc<dyn PresentationGateway>, sharing: Arc<dyn SharingGateway>) -> Self {
        Self {
            slides,
            sharing,
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run one request against the session.
    pub async fn execute(&mut self, request: &OperationRequest) -> OperationResult {
        let outcome = match Operation::from_name(&request.name) {
            Some(op) => self.dispatch(op, &request.arguments).await,
            None => Err(OperationError::UnknownOperation(request.name.clone())),
        };

        match outcome {
            Ok(output) => OperationResult::success(output),
            Err(e) => {
                warn!(operation = %request.name, error = %e, "Operation failed");
                OperationResult::failure(&e)
            }
        }
    }

    async fn dispatch(
        &mut self,
        op: Operation,
        args: &Arguments,
    ) -> Result<OperationOutput, OperationError> {
        debug!(operation = %op, "Dispatching operation");
        match op {
            Operation::InitializeDocument => self.initialize_document(args).await,
            Operation::InsertSlide => self.insert_slide(args).await,
            Operation::InspectDocument => self.inspect_document().await,
            Operation::RefineSlide => self.refine_slide(args).await,
            Operation::FinalizeDocument => self.finalize_document().await,
        }
    }

    fn document_id(&self) -> Result<String, OperationError> {
        self.state
            .document_id()
            .map(str::to_string)
            .ok_or(OperationError::NotYetCreated)
    }

    async fn initialize_document(&mut self, args: &Arguments) -> Result<OperationOutput, OperationError> {
        if let Some(title) = self.state.document_title() {
            return Err(OperationError::AlreadyInitialized {
                title: title.to_string(),
            });
        }
        let title = required_str(args, "title")?;

        let document_id = self
            .slides
            .reset_or_create(title)
            .await
            .map_err(|source| OperationError::Gateway {
                action: "create presentation",
                source,
            })?;

        self.state.initialize(document_id.clone(), title.to_string());
        info!(document_id = %document_id, title, "Presentation initialized");

        Ok(OperationOutput::Initialized(DocumentInitialized {
            message: format!("Presentation \"{title}\" created successfully"),
            document_id,
            title: title.to_string(),
        }))
    }

    async fn insert_slide(&mut self, args: &Arguments) -> Result<OperationOutput, OperationError> {
        let document_id = self.document_id()?;
        let layout: SlideLayout = required_str(args, "layout")?
            .parse()
            .map_err(|reason| OperationError::InvalidArgument {
                argument: "layout",
                reason,
            })?;
        let title = required_str(args, "title")?;
        let body = required_str_allow_empty(args, "body")?;

        let inserted = self
            .slides
            .insert_slide(&document_id, layout, title, body)
            .await
            .map_err(|source| OperationError::Gateway {
                action: "add slide",
                source,
            })?;

        let position = self
            .state
            .record_slide(layout, title.to_string(), body.to_string());
        debug!(position, layout = %layout, "Slide recorded");

        Ok(OperationOutput::SlideInserted(SlideInserted {
            slide_id: inserted.slide_id,
            position,
            layout,
            title: title.to_string(),
        }))
    }

    async fn inspect_document(&self) -> Result<OperationOutput, OperationError> {
        let document_id = self.document_id()?;
        let structure = self
            .slides
            .read_structure(&document_id)
            .await
            .map_err(|source| OperationError::Gateway {
                action: "review presentation",
                source,
            })?;

        Ok(OperationOutput::Inspected(Box::new(DocumentInspection {
            presentation_info: structure,
            state: self.state.clone(),
        })))
    }

    async fn refine_slide(&mut self, args: &Arguments) -> Result<OperationOutput, OperationError> {
        let document_id = self.document_id()?;
        let position = match args.get("position") {
            None | Some(Value::Null) => return Err(OperationError::MissingArgument("position")),
            Some(value) => value.as_i64().ok_or_else(|| OperationError::InvalidArgument {
                argument: "position",
                reason: format!("expected an integer, got {value}"),
            })?,
        };

        // Reject before touching the remote document so local history and
        // the deck cannot drift apart.
        let slide_count = self.state.slide_count();
        let index = usize::try_from(position)
            .ok()
            .filter(|&p| p < slide_count)
            .ok_or(OperationError::PositionOutOfRange {
                position,
                slide_count,
            })?;

        let new_body = required_str_allow_empty(args, "new_body")?;
        let new_title = optional_str(args, "new_title")?;

        self.slides
            .replace_content(&document_id, index, new_body, new_title)
            .await
            .map_err(|source| OperationError::Gateway {
                action: "refine slide",
                source,
            })?;

        self.state.refine_slide(index, new_body, new_title);

        Ok(OperationOutput::SlideRefined(SlideRefined {
            message: "Slide updated successfully".into(),
            position: index,
        }))
    }

    async fn finalize_document(&self) -> Result<OperationOutput, OperationError> {
        let document_id = self.document_id()?;
        let share_link = self
            .sharing
            .share_and_get_link(&document_id)
            .await
            .map_err(|source| OperationError::Gateway {
                action: "finalize presentation",
                source,
            })?;

        info!(document_id = %document_id, link = %share_link, "Presentation shared");

        Ok(OperationOutput::Finalized(FinalizedDocument {
            document_id,
            share_link,
            title: self.state.document_title().unwrap_or_default().to_string(),
            slide_count: self.state.slide_count(),
        }))
    }
}

/// A non-blank string argument.
fn required_str<'a>(args: &'a Arguments, key: &'static str) -> Result<&'a str, OperationError> {
    let value = required_str_allow_empty(args, key)?;
    if value.trim().is_empty() {
        return Err(OperationError::MissingArgument(key));
    }
    Ok(value)
}

/// A string argument that must be present but may be empty.
fn required_str_allow_empty<'a>(
    args: &'a Arguments,
    key: &'static str,
) -> Result<&'a str, OperationError> {
    optional_str(args, key)?.ok_or(OperationError::MissingArgument(key))
}

fn optional_str<'a>(args: &'a Arguments, key: &'static str) -> Result<Option<&'a str>, OperationError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(OperationError::InvalidArgument {
            argument: key,
            reason: format!("expected a string, got {other}"),
        }),
    }
}
