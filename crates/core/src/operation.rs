//! Operations: the closed set of actions the model may request.
//!
//! The model names an operation by string; that string is parsed into
//! [`Operation`] once, and everything downstream matches on the enum.
//! Every dispatch produces an [`OperationResult`], which is serialized
//! verbatim into the transcript as the model's observation.

use serde::{Deserialize, Serialize};
use crate::error::OperationError;
use crate::gateway::{DocumentStructure, SlideLayout};
use crate::message::MessageToolCall;
use crate::session::SessionState;

/// The five operations exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    InitializeDocument,
    InsertSlide,
    InspectDocument,
    RefineSlide,
    FinalizeDocument,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::InitializeDocument,
        Operation::InsertSlide,
        Operation::InspectDocument,
        Operation::RefineSlide,
        Operation::FinalizeDocument,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::InitializeDocument => "initialize_document",
            Operation::InsertSlide => "insert_slide",
            Operation::InspectDocument => "inspect_document",
            Operation::RefineSlide => "refine_slide",
            Operation::FinalizeDocument => "finalize_document",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Operation::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A request produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl OperationRequest {
    /// Decode a request from the model's wire form. Arguments must be a JSON
    /// object; an empty string is treated as no arguments.
    pub fn from_tool_call(call: &MessageToolCall) -> Result<Self, String> {
        let raw = call.arguments.trim();
        if raw.is_empty() {
            return Ok(Self {
                name: call.name.clone(),
                arguments: serde_json::Map::new(),
            });
        }
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(arguments)) => Ok(Self {
                name: call.name.clone(),
                arguments,
            }),
            Ok(other) => Err(format!(
                "arguments for '{}' must be a JSON object, got {}",
                call.name,
                json_kind(&other)
            )),
            Err(e) => Err(format!("arguments for '{}' are not valid JSON: {e}", call.name)),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInitialized {
    pub message: String,
    pub document_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideInserted {
    pub slide_id: Option<String>,
    pub position: usize,
    pub layout: SlideLayout,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInspection {
    pub presentation_info: DocumentStructure,
    pub state: SessionState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideRefined {
    pub message: String,
    pub position: usize,
}

/// Everything a caller needs once the deck has been shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedDocument {
    pub document_id: String,
    pub share_link: String,
    pub title: String,
    pub slide_count: usize,
}

/// Operation-specific fields of a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Initialized(DocumentInitialized),
    SlideInserted(SlideInserted),
    Inspected(Box<DocumentInspection>),
    SlideRefined(SlideRefined),
    Finalized(FinalizedDocument),
}

/// The uniform `{success, ...fields, error?}` shape every dispatch returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub success: bool,

    #[serde(flatten)]
    pub output: Option<OperationOutput>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn success(output: OperationOutput) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(err: &OperationError) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(err.to_string()),
        }
    }

    /// The finalized document, if this result is a successful finalization.
    pub fn finalized(&self) -> Option<&FinalizedDocument> {
        match (&self.output, self.success) {
            (Some(OperationOutput::Finalized(doc)), true) => Some(doc),
            _ => None,
        }
    }

    /// Render the result as the JSON text the model observes.
    pub fn to_observation(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"result could not be serialized: {e}"}}"#)
        })
    }
}
