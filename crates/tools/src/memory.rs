//! In-memory gateways.
//!
//! Back `deckhand generate --dry-run`, where the model drives a deck that
//! never leaves the process, and every dispatcher/agent test.

use async_trait::async_trait;
use deckhand_core::error::{GatewayError, RemoteService};
use deckhand_core::gateway::{
    DocumentStructure, InsertedSlide, PresentationGateway, SharingGateway, SlideLayout,
    SlideSummary,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

struct StoredDocument {
    title: String,
    slides: Vec<SlideSummary>,
}

/// A presentation store that keeps documents in a map.
#[derive(Default)]
pub struct InMemoryPresentations {
    documents: Mutex<HashMap<String, StoredDocument>>,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

impl InMemoryPresentations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert/replace fail with a 503.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Names of the gateway methods invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn slide_count(&self, document_id: &str) -> usize {
        self.documents
            .lock()
            .ok()
            .and_then(|docs| docs.get(document_id).map(|d| d.slides.len()))
            .unwrap_or(0)
    }

    fn record(&self, call: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_writable(&self) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                service: RemoteService::Slides,
                status: 503,
                detail: "The service is currently unavailable.".into(),
            });
        }
        Ok(())
    }

    fn with_document<T>(
        &self,
        document_id: &str,
        f: impl FnOnce(&mut StoredDocument) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut docs = self.documents.lock().map_err(|_| poisoned())?;
        let doc = docs.get_mut(document_id).ok_or_else(|| GatewayError::Api {
            service: RemoteService::Slides,
            status: 404,
            detail: format!("Requested entity was not found: {document_id}"),
        })?;
        f(doc)
    }
}

fn poisoned() -> GatewayError {
    GatewayError::Network {
        service: RemoteService::Slides,
        reason: "in-memory store lock poisoned".into(),
    }
}

#[async_trait]
impl PresentationGateway for InMemoryPresentations {
    async fn reset_or_create(&self, title: &str) -> Result<String, GatewayError> {
        self.record("reset_or_create");
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("doc-{n}");
        self.documents.lock().map_err(|_| poisoned())?.insert(
            id.clone(),
            StoredDocument {
                title: title.to_string(),
                slides: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn insert_slide(
        &self,
        document_id: &str,
        layout: SlideLayout,
        title: &str,
        body: &str,
    ) -> Result<InsertedSlide, GatewayError> {
        self.record("insert_slide");
        self.check_writable()?;
        self.with_document(document_id, |doc| {
            let position = doc.slides.len();
            let slide_id = format!("{document_id}-slide-{position}");
            doc.slides.push(SlideSummary {
                position,
                slide_id: slide_id.clone(),
                layout: layout.as_str().to_string(),
                title: if layout == SlideLayout::Blank {
                    String::new()
                } else {
                    title.to_string()
                },
                body: if layout.has_body() {
                    body.replace("\\n", "\n")
                } else {
                    String::new()
                },
            });
            Ok(InsertedSlide {
                slide_id: Some(slide_id),
            })
        })
    }

    async fn read_structure(&self, document_id: &str) -> Result<DocumentStructure, GatewayError> {
        self.record("read_structure");
        self.with_document(document_id, |doc| {
            Ok(DocumentStructure {
                document_id: document_id.to_string(),
                title: doc.title.clone(),
                total_slides: doc.slides.len(),
                slides: doc.slides.clone(),
            })
        })
    }

    async fn replace_content(
        &self,
        document_id: &str,
        position: usize,
        new_body: &str,
        new_title: Option<&str>,
    ) -> Result<(), GatewayError> {
        self.record("replace_content");
        self.check_writable()?;
        self.with_document(document_id, |doc| {
            let slide_count = doc.slides.len();
            let slide = doc
                .slides
                .get_mut(position)
                .ok_or(GatewayError::SlideNotFound {
                    position,
                    slide_count,
                })?;
            if let Some(title) = new_title {
                slide.title = title.to_string();
            }
            slide.body = new_body.replace("\\n", "\n");
            Ok(())
        })
    }
}

/// A sharing gateway that hands out `memory://` links.
#[derive(Default)]
pub struct InMemorySharing {
    shared: Mutex<HashSet<String>>,
    fail: AtomicBool,
}

impl InMemorySharing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sharing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn is_shared(&self, document_id: &str) -> bool {
        self.shared
            .lock()
            .map(|s| s.contains(document_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SharingGateway for InMemorySharing {
    async fn grant_public_read(&self, document_id: &str) -> Result<(), GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                service: RemoteService::Drive,
                status: 403,
                detail: "The user does not have sufficient permissions for this file.".into(),
            });
        }
        self.shared
            .lock()
            .map_err(|_| GatewayError::Network {
                service: RemoteService::Drive,
                reason: "in-memory store lock poisoned".into(),
            })?
            .insert(document_id.to_string());
        Ok(())
    }

    async fn get_link(&self, document_id: &str) -> Result<String, GatewayError> {
        Ok(format!("memory://presentations/{document_id}"))
    }
}
