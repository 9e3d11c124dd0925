use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use artifex_service::{AnnotateRequest, DrawRequest};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::stage_first_file;

const ANNOTATE_REQUIRED: &str = "imageId, text, x and y are required.";
const DRAW_REQUIRED: &str = "imageId and drawingData are required.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: &'static str,
    pub image_url: String,
    pub file_path: String,
    pub deduplicated: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub message: &'static str,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub message: &'static str,
    pub images: Vec<CatalogEntry>,
}

/// Fields are optional so a missing one yields the endpoint's own 400
/// message instead of a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateBody {
    pub image_id: Option<String>,
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawBody {
    pub image_id: Option<String>,
    pub drawing_data: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "artifex-server",
        "version": env!("CARGO_PKG_VERSION"),
        "persistent_index": state.service.index().is_persistent(),
    }))
}

pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::bad_request("No file uploaded"));
    };
    let upload = stage_first_file(&mut multipart, &state.config.staging_dir)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let outcome = state
        .service
        .ingest(upload.file().clone())
        .await
        .map_err(|e| ApiError::from_service(e, "Error uploading image"))?;
    let id = outcome.record.id;
    Ok(Json(UploadResponse {
        message: if outcome.deduplicated {
            "Image already exists"
        } else {
            "Image uploaded successfully"
        },
        image_url: state.config.image_url(&id),
        file_path: id.to_string(),
        deduplicated: outcome.deduplicated,
    }))
}

pub async fn get_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let fetched = state
        .service
        .fetch(&id)
        .await
        .map_err(|e| ApiError::from_service(e, "Error retrieving image"))?;
    Ok((
        [
            (header::CONTENT_TYPE, fetched.content_type),
            // Content under an identifier changes on every mutation.
            (header::CACHE_CONTROL, "no-cache"),
        ],
        fetched.bytes,
    )
        .into_response())
}

pub async fn annotate_handler(
    State(state): State<AppState>,
    body: Result<Json<AnnotateBody>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (Some(image_id), Some(text), Some(x), Some(y)) = (body.image_id, body.text, body.x, body.y)
    else {
        return Err(ApiError::bad_request(ANNOTATE_REQUIRED));
    };
    if image_id.is_empty() || text.is_empty() {
        return Err(ApiError::bad_request(ANNOTATE_REQUIRED));
    }

    let outcome = state
        .service
        .annotate(AnnotateRequest {
            image_id,
            text,
            x: coordinate(x),
            y: coordinate(y),
        })
        .await
        .map_err(|e| ApiError::from_service(e, "Error annotating image"))?;
    Ok(Json(MutationResponse {
        message: "Image annotated successfully",
        image_url: state.config.image_url(&outcome.record.id),
    }))
}

pub async fn draw_handler(
    State(state): State<AppState>,
    body: Result<Json<DrawBody>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (Some(image_id), Some(drawing_data)) = (body.image_id, body.drawing_data) else {
        return Err(ApiError::bad_request(DRAW_REQUIRED));
    };
    if image_id.is_empty() || drawing_data.is_empty() {
        return Err(ApiError::bad_request(DRAW_REQUIRED));
    }
    let offset = match (body.x, body.y) {
        (None, None) => None,
        (x, y) => Some((x.map_or(0, coordinate), y.map_or(0, coordinate))),
    };

    let outcome = state
        .service
        .draw(DrawRequest {
            image_id,
            drawing_data,
            offset,
        })
        .await
        .map_err(|e| ApiError::from_service(e, "Error adding drawing"))?;
    Ok(Json(MutationResponse {
        message: "Drawing added successfully",
        image_url: state.config.image_url(&outcome.record.id),
    }))
}

pub async fn list_images_handler(
    State(state): State<AppState>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let ids = state
        .service
        .list()
        .await
        .map_err(|e| ApiError::from_service(e, "Error retrieving images"))?;
    let images = ids
        .iter()
        .map(|id| CatalogEntry {
            filename: id.to_string(),
            url: state.config.image_url(id),
        })
        .collect();
    Ok(Json(CatalogResponse {
        message: "Images retrieved successfully",
        images,
    }))
}

/// Clients may send fractional pixel positions; round to the nearest pixel.
fn coordinate(v: f64) -> i64 {
    v.round() as i64
}
