//! Gateway traits: thin boundaries around the remote document APIs.
//!
//! The dispatcher only talks to these traits. The HTTP implementations live
//! in `deckhand-google`; tests use in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::GatewayError;

/// The fixed set of slide layouts the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlideLayout {
    Title,
    TitleAndBody,
    TitleAndTwoColumns,
    Blank,
}

impl SlideLayout {
    pub const ALL: [SlideLayout; 4] = [
        SlideLayout::Title,
        SlideLayout::TitleAndBody,
        SlideLayout::TitleAndTwoColumns,
        SlideLayout::Blank,
    ];

    /// Wire name, identical to the predefined layout name used by the slides API.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideLayout::Title => "TITLE",
            SlideLayout::TitleAndBody => "TITLE_AND_BODY",
            SlideLayout::TitleAndTwoColumns => "TITLE_AND_TWO_COLUMNS",
            SlideLayout::Blank => "BLANK",
        }
    }

    /// Whether the layout has a body placeholder to write text into.
    pub fn has_body(&self) -> bool {
        matches!(self, SlideLayout::TitleAndBody | SlideLayout::TitleAndTwoColumns)
    }
}

impl std::fmt::Display for SlideLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlideLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlideLayout::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| {
                format!("unknown layout '{s}', expected one of TITLE, TITLE_AND_BODY, TITLE_AND_TWO_COLUMNS, BLANK")
            })
    }
}

/// What the presentation API reports back after inserting a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertedSlide {
    /// Remote object id of the new slide, when the API returned one
    pub slide_id: Option<String>,
}

/// One slide as read back from the remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSummary {
    pub position: usize,
    pub slide_id: String,
    pub layout: String,
    pub title: String,
    pub body: String,
}

/// Current remote structure of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub document_id: String,
    pub title: String,
    pub total_slides: usize,
    pub slides: Vec<SlideSummary>,
}

/// Wraps the remote presentation-editing API.
#[async_trait]
pub trait PresentationGateway: Send + Sync {
    /// Obtain an empty document to build into and return its handle.
    async fn reset_or_create(&self, title: &str) -> Result<String, GatewayError>;

    /// Append a slide with the given layout and text.
    async fn insert_slide(
        &self,
        document_id: &str,
        layout: SlideLayout,
        title: &str,
        body: &str,
    ) -> Result<InsertedSlide, GatewayError>;

    /// Read the current document structure.
    async fn read_structure(&self, document_id: &str) -> Result<DocumentStructure, GatewayError>;

    /// Replace the body (and optionally the title) of the slide at `position`.
    async fn replace_content(
        &self,
        document_id: &str,
        position: usize,
        new_body: &str,
        new_title: Option<&str>,
    ) -> Result<(), GatewayError>;
}

/// Wraps the remote document-sharing API.
#[async_trait]
pub trait SharingGateway: Send + Sync {
    /// Give anyone with the link read access.
    async fn grant_public_read(&self, document_id: &str) -> Result<(), GatewayError>;

    /// Fetch the shareable web link for the document.
    async fn get_link(&self, document_id: &str) -> Result<String, GatewayError>;

    /// Share the document and return its link.
    async fn share_and_get_link(&self, document_id: &str) -> Result<String, GatewayError> {
        self.grant_public_read(document_id).await?;
        self.get_link(document_id).await
    }
}
