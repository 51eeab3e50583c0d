//! In-process fake of the Slides and Drive endpoints the gateways call.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "test-token";

#[derive(Default)]
pub struct FakeState {
    presentations: HashMap<String, Value>,
    permissions: Vec<(String, Value)>,
    next_id: usize,
    drive_failure: Option<u16>,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeGoogle {
    pub base_url: String,
    state: Shared,
}

impl FakeGoogle {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::default();
        let router = Router::new()
            .route("/v1/presentations", post(create_presentation))
            .route(
                "/v1/presentations/{id}",
                get(get_presentation).post(batch_update),
            )
            .route("/drive/v3/files/{id}/permissions", post(create_permission))
            .route("/drive/v3/files/{id}", get(get_file))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn seed_presentation(&self, id: &str, title: &str, slides: usize) {
        let pages: Vec<Value> = (0..slides)
            .map(|i| {
                json!({
                    "objectId": format!("seed_{i}"),
                    "pageElements": [{
                        "objectId": format!("seed_{i}_title"),
                        "shape": {
                            "shapeType": "TEXT_BOX",
                            "text": {"textElements": [{"textRun": {"content": format!("Old {i}\n")}}]}
                        }
                    }]
                })
            })
            .collect();
        self.state.lock().unwrap().presentations.insert(
            id.into(),
            json!({"presentationId": id, "title": title, "slides": pages}),
        );
    }

    pub fn permissions(&self, id: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .permissions
            .iter()
            .filter(|(file, _)| file == id)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn fail_drive_with(&self, status: u16) {
        self.state.lock().unwrap().drive_failure = Some(status);
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message}})),
    )
        .into_response()
}

async fn create_presentation(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let id = format!("pres-{}", state.next_id);
    let presentation = json!({
        "presentationId": id,
        "title": body["title"].as_str().unwrap_or("Untitled presentation"),
        "slides": [{
            "objectId": "p",
            "slideProperties": {"layoutObjectId": "TITLE"},
            "pageElements": [{
                "objectId": "i0",
                "shape": {"shapeType": "TEXT_BOX", "placeholder": {"type": "CENTERED_TITLE"}}
            }]
        }]
    });
    state.presentations.insert(id, presentation.clone());
    Json(presentation).into_response()
}

async fn get_presentation(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    match state.lock().unwrap().presentations.get(&id) {
        Some(p) => Json(p.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Requested entity was not found."),
    }
}

async fn batch_update(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    let Some(id) = id.strip_suffix(":batchUpdate") else {
        return error(StatusCode::NOT_FOUND, "unknown method");
    };
    let mut state = state.lock().unwrap();
    let Some(presentation) = state.presentations.get_mut(id) else {
        return error(StatusCode::NOT_FOUND, "Requested entity was not found.");
    };

    let mut replies = Vec::new();
    for request in body["requests"].as_array().cloned().unwrap_or_default() {
        match apply(presentation, &request) {
            Ok(reply) => replies.push(reply),
            Err(message) => return error(StatusCode::BAD_REQUEST, &message),
        }
    }
    Json(json!({"presentationId": id, "replies": replies})).into_response()
}

fn apply(presentation: &mut Value, request: &Value) -> Result<Value, String> {
    let slides = presentation["slides"]
        .as_array_mut()
        .ok_or("presentation has no slides array")?;

    if let Some(create) = request.get("createSlide") {
        let object_id = create["objectId"].as_str().unwrap_or_default().to_string();
        let elements: Vec<Value> = create["placeholderIdMappings"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                json!({
                    "objectId": m["objectId"],
                    "shape": {
                        "shapeType": "TEXT_BOX",
                        "placeholder": {"type": m["layoutPlaceholder"]["type"]}
                    }
                })
            })
            .collect();
        slides.push(json!({
            "objectId": object_id,
            "slideProperties": {"layoutObjectId": create["slideLayoutReference"]["predefinedLayout"]},
            "pageElements": elements,
        }));
        return Ok(json!({"createSlide": {"objectId": object_id}}));
    }

    if let Some(delete) = request.get("deleteObject") {
        let target = delete["objectId"].as_str().unwrap_or_default();
        let before = slides.len();
        slides.retain(|s| s["objectId"] != target);
        if slides.len() == before {
            return Err(format!("object {target} not found"));
        }
        return Ok(json!({}));
    }

    let (target, text) = if let Some(insert) = request.get("insertText") {
        (insert["objectId"].as_str(), insert["text"].as_str())
    } else if let Some(delete) = request.get("deleteText") {
        (delete["objectId"].as_str(), None)
    } else {
        return Err(format!("unsupported request {request}"));
    };
    let target = target.unwrap_or_default();

    let shape = slides
        .iter_mut()
        .flat_map(|s| {
            s["pageElements"]
                .as_array_mut()
                .map(|els| els.iter_mut())
                .into_iter()
                .flatten()
        })
        .find(|e| e["objectId"] == target)
        .map(|e| &mut e["shape"])
        .ok_or_else(|| format!("object {target} not found"))?;

    match text {
        Some("") => return Err("insertText requires non-empty text".into()),
        Some(text) => {
            let existing = shape["text"]["textElements"][0]["textRun"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            shape["text"] = json!({"textElements": [{"textRun": {"content": existing + text}}]});
        }
        None => {
            if shape.get("text").is_none() {
                return Err(format!("object {target} has no text to delete"));
            }
            if let Some(obj) = shape.as_object_mut() {
                obj.remove("text");
            }
        }
    }
    Ok(json!({}))
}

async fn create_permission(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    let mut state = state.lock().unwrap();
    if let Some(status) = state.drive_failure {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error(status, "The user does not have sufficient permissions for this file.");
    }
    if !state.presentations.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "File not found.");
    }
    state.permissions.push((id, body.clone()));
    Json(json!({"kind": "drive#permission", "id": "anyoneWithLink", "type": body["type"], "role": body["role"]}))
        .into_response()
}

async fn get_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    if !state.lock().unwrap().presentations.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "File not found.");
    }
    if query.get("fields").map(String::as_str) != Some("webViewLink") {
        return Json(json!({"id": id})).into_response();
    }
    Json(json!({
        "webViewLink": format!("https://docs.google.com/presentation/d/{id}/edit?usp=drivesdk")
    }))
    .into_response()
}
