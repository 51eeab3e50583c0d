//! Google Slides v1 implementation of [`PresentationGateway`].
//!
//! Every mutation goes through `presentations/{id}:batchUpdate`. Slide and
//! placeholder object ids are generated client-side so text can be inserted
//! in the same batch that creates the slide.

use async_trait::async_trait;
use deckhand_config::AppConfig;
use deckhand_core::error::{GatewayError, RemoteService};
use deckhand_core::gateway::{
    DocumentStructure, InsertedSlide, PresentationGateway, SlideLayout, SlideSummary,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::client::ApiClient;

const DEFAULT_BASE_URL: &str = "https://slides.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct GoogleSlidesGateway {
    client: ApiClient,
    template_presentation_id: Option<String>,
}

impl GoogleSlidesGateway {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(
                RemoteService::Slides,
                DEFAULT_BASE_URL,
                access_token,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ),
            template_presentation_id: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let token = config.google.access_token.clone().ok_or_else(|| {
            GatewayError::NotConfigured("GOOGLE_ACCESS_TOKEN environment variable is required".into())
        })?;
        let client = ApiClient::new(
            RemoteService::Slides,
            &config.google.slides_base_url,
            token,
            Duration::from_secs(config.google.timeout_secs),
        );
        Ok(Self {
            client,
            template_presentation_id: config.google.template_presentation_id.clone(),
        })
    }

    /// Point at a different API host (proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Reuse an existing presentation instead of creating one per request.
    pub fn with_template(mut self, presentation_id: impl Into<String>) -> Self {
        self.template_presentation_id = Some(presentation_id.into());
        self
    }

    async fn fetch(&self, presentation_id: &str) -> Result<Presentation, GatewayError> {
        self.client
            .get(&format!("v1/presentations/{presentation_id}"), &[])
            .await
    }

    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: Vec<Value>,
    ) -> Result<BatchUpdateResponse, GatewayError> {
        debug!(presentation_id, requests = requests.len(), "Slides batchUpdate");
        self.client
            .post(
                &format!("v1/presentations/{presentation_id}:batchUpdate"),
                &json!({ "requests": requests }),
            )
            .await
    }

    /// Delete every slide, last first.
    async fn clear_slides(&self, presentation_id: &str, slides: &[Page]) -> Result<(), GatewayError> {
        if slides.is_empty() {
            return Ok(());
        }
        let requests = slides
            .iter()
            .rev()
            .map(|s| json!({ "deleteObject": { "objectId": s.object_id } }))
            .collect();
        self.batch_update(presentation_id, requests).await?;
        info!(presentation_id, cleared = slides.len(), "Cleared existing slides");
        Ok(())
    }
}

#[async_trait]
impl PresentationGateway for GoogleSlidesGateway {
    async fn reset_or_create(&self, title: &str) -> Result<String, GatewayError> {
        let presentation = match &self.template_presentation_id {
            Some(template) => self.fetch(template).await?,
            None => {
                self.client
                    .post::<Presentation>("v1/presentations", &json!({ "title": title }))
                    .await?
            }
        };
        self.clear_slides(&presentation.presentation_id, &presentation.slides)
            .await?;
        Ok(presentation.presentation_id)
    }

    async fn insert_slide(
        &self,
        document_id: &str,
        layout: SlideLayout,
        title: &str,
        body: &str,
    ) -> Result<InsertedSlide, GatewayError> {
        let ids = ObjectIds::generate();
        let mut requests = vec![json!({
            "createSlide": {
                "objectId": ids.slide,
                "slideLayoutReference": { "predefinedLayout": layout.as_str() },
                "placeholderIdMappings": placeholder_mappings(layout, &ids),
            }
        })];

        if layout != SlideLayout::Blank && !title.is_empty() {
            requests.push(insert_text(&ids.title, title));
        }
        let body = unescape_newlines(body);
        if layout.has_body() && !body.is_empty() {
            requests.push(insert_text(&ids.body, &body));
        }

        let response = self.batch_update(document_id, requests).await?;
        let slide_id = response.replies.iter().find_map(|reply| {
            reply["createSlide"]["objectId"]
                .as_str()
                .map(str::to_string)
        });

        Ok(InsertedSlide { slide_id })
    }

    async fn read_structure(&self, document_id: &str) -> Result<DocumentStructure, GatewayError> {
        let presentation = self.fetch(document_id).await?;

        let slides = presentation
            .slides
            .iter()
            .enumerate()
            .map(|(position, page)| {
                let (title, body) = page.text_shapes();
                SlideSummary {
                    position,
                    slide_id: page.object_id.clone(),
                    layout: page.layout_name(),
                    title: title.map(PageElement::plain_text).unwrap_or_default(),
                    body: body.map(PageElement::plain_text).unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();

        Ok(DocumentStructure {
            document_id: presentation.presentation_id,
            title: presentation.title,
            total_slides: slides.len(),
            slides,
        })
    }

    async fn replace_content(
        &self,
        document_id: &str,
        position: usize,
        new_body: &str,
        new_title: Option<&str>,
    ) -> Result<(), GatewayError> {
        let presentation = self.fetch(document_id).await?;
        let slide_count = presentation.slides.len();
        let page = presentation
            .slides
            .get(position)
            .ok_or(GatewayError::SlideNotFound {
                position,
                slide_count,
            })?;

        let (title_shape, body_shape) = page.text_shapes();
        let mut requests = Vec::new();

        if let (Some(shape), Some(text)) = (title_shape, new_title) {
            requests.extend(replace_text(shape, text));
        }
        // An empty body clears the placeholder.
        if let Some(shape) = body_shape {
            requests.extend(replace_text(shape, &unescape_newlines(new_body)));
        }

        if requests.is_empty() {
            debug!(document_id, position, "Nothing to replace on slide");
            return Ok(());
        }
        self.batch_update(document_id, requests).await?;
        Ok(())
    }
}

/// Client-chosen object ids for one slide and its placeholders.
struct ObjectIds {
    slide: String,
    title: String,
    body: String,
}

impl ObjectIds {
    fn generate() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            slide: format!("slide_{suffix}"),
            title: format!("title_{suffix}"),
            body: format!("body_{suffix}"),
        }
    }
}

fn placeholder_mappings(layout: SlideLayout, ids: &ObjectIds) -> Vec<Value> {
    let mapping = |object_id: &str, kind: &str| {
        json!({
            "objectId": object_id,
            "layoutPlaceholder": { "type": kind, "index": 0 }
        })
    };
    match layout {
        SlideLayout::Title => vec![mapping(&ids.title, "CENTERED_TITLE")],
        SlideLayout::TitleAndBody | SlideLayout::TitleAndTwoColumns => vec![
            mapping(&ids.title, "TITLE"),
            mapping(&ids.body, "BODY"),
        ],
        SlideLayout::Blank => Vec::new(),
    }
}

fn insert_text(object_id: &str, text: &str) -> Value {
    json!({ "insertText": { "objectId": object_id, "text": text } })
}

/// Delete whatever the shape holds, then insert `text`. The API rejects an
/// empty `insertText`, so clearing a shape is a delete on its own.
fn replace_text(shape: &PageElement, text: &str) -> Vec<Value> {
    let mut requests = Vec::with_capacity(2);
    if shape.has_text() {
        requests.push(json!({
            "deleteText": {
                "objectId": shape.object_id,
                "textRange": { "type": "ALL" }
            }
        }));
    }
    if !text.is_empty() {
        requests.push(insert_text(&shape.object_id, text));
    }
    requests
}

/// Models often send a literal backslash-n instead of a newline.
fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

// --- Slides API types (only the fields we read) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Presentation {
    presentation_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    slides: Vec<Page>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    object_id: String,
    #[serde(default)]
    slide_properties: Option<SlideProperties>,
    #[serde(default)]
    page_elements: Vec<PageElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlideProperties {
    #[serde(default)]
    layout_object_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageElement {
    object_id: String,
    #[serde(default)]
    shape: Option<Shape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Shape {
    #[serde(default)]
    shape_type: Option<String>,
    #[serde(default)]
    placeholder: Option<Placeholder>,
    #[serde(default)]
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct Placeholder {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextContent {
    #[serde(default)]
    text_elements: Vec<TextElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextElement {
    #[serde(default)]
    text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

impl Page {
    fn layout_name(&self) -> String {
        self.slide_properties
            .as_ref()
            .and_then(|p| p.layout_object_id.clone())
            .unwrap_or_else(|| "unknown".into())
    }

    /// Locate the title and body shapes. Placeholder types win; otherwise
    /// the first text box is the title and the next one the body.
    fn text_shapes(&self) -> (Option<&PageElement>, Option<&PageElement>) {
        let with_placeholder = |kinds: &[&str]| {
            self.page_elements.iter().find(|e| {
                e.placeholder_kind()
                    .is_some_and(|k| kinds.contains(&k))
            })
        };
        let mut text_boxes = self.page_elements.iter().filter(|e| e.is_text_box());

        let title = with_placeholder(&["TITLE", "CENTERED_TITLE"]).or_else(|| text_boxes.next());
        let body = with_placeholder(&["BODY", "SUBTITLE"]).or_else(|| {
            self.page_elements
                .iter()
                .filter(|e| e.is_text_box())
                .find(|e| title.is_none_or(|t| t.object_id != e.object_id))
        });
        (title, body)
    }
}

impl PageElement {
    fn placeholder_kind(&self) -> Option<&str> {
        self.shape
            .as_ref()?
            .placeholder
            .as_ref()?
            .kind
            .as_deref()
    }

    fn is_text_box(&self) -> bool {
        self.shape
            .as_ref()
            .is_some_and(|s| s.shape_type.as_deref() == Some("TEXT_BOX"))
    }

    fn has_text(&self) -> bool {
        !self.plain_text().is_empty()
    }

    fn plain_text(&self) -> String {
        let Some(text) = self.shape.as_ref().and_then(|s| s.text.as_ref()) else {
            return String::new();
        };
        text.text_elements
            .iter()
            .filter_map(|e| e.text_run.as_ref())
            .map(|r| r.content.as_str())
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeGoogle, TOKEN};

    fn gateway(fake: &FakeGoogle) -> GoogleSlidesGateway {
        GoogleSlidesGateway::new(TOKEN).with_base_url(&fake.base_url)
    }

    #[test]
    fn placeholder_mapping_depends_on_layout() {
        let ids = ObjectIds::generate();
        assert_eq!(placeholder_mappings(SlideLayout::Title, &ids).len(), 1);
        assert_eq!(
            placeholder_mappings(SlideLayout::Title, &ids)[0]["layoutPlaceholder"]["type"],
            "CENTERED_TITLE"
        );
        assert_eq!(placeholder_mappings(SlideLayout::TitleAndTwoColumns, &ids).len(), 2);
        assert!(placeholder_mappings(SlideLayout::Blank, &ids).is_empty());
    }

    #[test]
    fn object_ids_are_valid_and_unique() {
        let a = ObjectIds::generate();
        let b = ObjectIds::generate();
        assert_ne!(a.slide, b.slide);
        for id in [&a.slide, &a.title, &a.body] {
            assert!(id.len() >= 5 && id.len() <= 50);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn from_config_requires_token() {
        let config = AppConfig::default();
        assert!(matches!(
            GoogleSlidesGateway::from_config(&config),
            Err(GatewayError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn create_clears_default_slide() {
        let fake = FakeGoogle::spawn().await;
        let slides = gateway(&fake);

        let id = slides.reset_or_create("Owls").await.unwrap();
        let structure = slides.read_structure(&id).await.unwrap();
        assert_eq!(structure.title, "Owls");
        assert_eq!(structure.total_slides, 0);
    }

    #[tokio::test]
    async fn template_is_reused_and_cleared() {
        let fake = FakeGoogle::spawn().await;
        fake.seed_presentation("tmpl", "Template", 3);
        let slides = gateway(&fake).with_template("tmpl");

        let id = slides.reset_or_create("Ignored").await.unwrap();
        assert_eq!(id, "tmpl");
        assert_eq!(slides.read_structure("tmpl").await.unwrap().total_slides, 0);
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let fake = FakeGoogle::spawn().await;
        let slides = gateway(&fake);
        let id = slides.reset_or_create("Sales").await.unwrap();

        let first = slides
            .insert_slide(&id, SlideLayout::Title, "Quarterly Sales", "ignored body")
            .await
            .unwrap();
        assert!(first.slide_id.is_some());
        slides
            .insert_slide(&id, SlideLayout::TitleAndBody, "Highlights", "Up 12%\\nNew region")
            .await
            .unwrap();
        slides
            .insert_slide(&id, SlideLayout::Blank, "Spacer", "")
            .await
            .unwrap();

        let structure = slides.read_structure(&id).await.unwrap();
        assert_eq!(structure.total_slides, 3);
        assert_eq!(structure.slides[0].title, "Quarterly Sales");
        assert_eq!(structure.slides[0].body, "");
        assert_eq!(structure.slides[0].layout, "TITLE");
        assert_eq!(structure.slides[1].body, "Up 12%\nNew region");
        assert_eq!(structure.slides[2].title, "");
        assert_eq!(structure.slides[2].position, 2);
    }

    #[tokio::test]
    async fn replace_content_updates_one_slide() {
        let fake = FakeGoogle::spawn().await;
        let slides = gateway(&fake);
        let id = slides.reset_or_create("Deck").await.unwrap();
        slides
            .insert_slide(&id, SlideLayout::TitleAndBody, "One", "first")
            .await
            .unwrap();
        slides
            .insert_slide(&id, SlideLayout::TitleAndBody, "Two", "second")
            .await
            .unwrap();

        slides
            .replace_content(&id, 1, "rewritten", Some("Two, revised"))
            .await
            .unwrap();

        let structure = slides.read_structure(&id).await.unwrap();
        assert_eq!(structure.slides[0].body, "first");
        assert_eq!(structure.slides[1].title, "Two, revised");
        assert_eq!(structure.slides[1].body, "rewritten");
    }

    #[tokio::test]
    async fn empty_body_clears_the_placeholder() {
        let fake = FakeGoogle::spawn().await;
        let slides = gateway(&fake);
        let id = slides.reset_or_create("Deck").await.unwrap();
        slides
            .insert_slide(&id, SlideLayout::TitleAndBody, "A", "keep")
            .await
            .unwrap();

        slides.replace_content(&id, 0, "", None).await.unwrap();

        let structure = slides.read_structure(&id).await.unwrap();
        assert_eq!(structure.slides[0].title, "A");
        assert_eq!(structure.slides[0].body, "");

        // Clearing an already empty body is a no-op, not an API error.
        slides.replace_content(&id, 0, "", Some("")).await.unwrap();
        let structure = slides.read_structure(&id).await.unwrap();
        assert_eq!(structure.slides[0].title, "");
    }

    #[tokio::test]
    async fn replace_content_out_of_range() {
        let fake = FakeGoogle::spawn().await;
        let slides = gateway(&fake);
        let id = slides.reset_or_create("Deck").await.unwrap();

        let err = slides.replace_content(&id, 4, "x", None).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::SlideNotFound {
                position: 4,
                slide_count: 0
            }
        ));
    }

    #[tokio::test]
    async fn bad_token_is_unauthorized() {
        let fake = FakeGoogle::spawn().await;
        let slides = GoogleSlidesGateway::new("wrong").with_base_url(&fake.base_url);
        let err = slides.reset_or_create("Deck").await.unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized { status: 401, .. }));
    }

    #[tokio::test]
    async fn api_errors_carry_bounded_detail() {
        let fake = FakeGoogle::spawn().await;
        let slides = gateway(&fake);
        let err = slides.read_structure("missing").await.unwrap_err();
        match err {
            GatewayError::Api { status, detail, .. } => {
                assert_eq!(status, 404);
                assert!(detail.contains("not found"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
