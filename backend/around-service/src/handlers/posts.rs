use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::stream::StreamExt;

use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::{CreatePostResponse, Location};
use crate::services::MediaUpload;
use crate::state::AppState;

/// Memory guard for `message`; its length is otherwise not validated.
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;
const MAX_COORDINATE_BYTES: usize = 64;

/// Fields of a POST /post form
#[derive(Debug, Default)]
struct PostForm {
    message: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    image: Option<MediaUpload>,
}

impl PostForm {
    fn into_parts(self) -> Result<(String, Location, Option<MediaUpload>)> {
        let message = self
            .message
            .ok_or_else(|| AppError::BadRequest("message is required".into()))?;
        let lat = parse_coordinate("lat", self.lat)?;
        let lon = parse_coordinate("lon", self.lon)?;
        Ok((message, Location::new(lat, lon), self.image))
    }
}

fn parse_coordinate(name: &str, raw: Option<String>) -> Result<f64> {
    let raw = raw.ok_or_else(|| AppError::BadRequest(format!("{name} is required")))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("{name} must be a number")))
}

/// Drain a field, failing once more than `limit` bytes arrive.
async fn read_field(field: &mut Field, limit: usize) -> std::result::Result<Bytes, FieldReadError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| FieldReadError::Stream(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(FieldReadError::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

enum FieldReadError {
    TooLarge,
    Stream(String),
}

async fn read_text(field: &mut Field, name: &str, limit: usize) -> Result<String> {
    let bytes = read_field(field, limit)
        .await
        .map_err(|e| match e {
            FieldReadError::TooLarge if name == "message" => {
                AppError::PayloadTooLarge(format!("message exceeds {limit} bytes"))
            }
            FieldReadError::TooLarge => AppError::BadRequest(format!("{name} is too long")),
            FieldReadError::Stream(reason) => {
                AppError::BadRequest(format!("could not read {name}: {reason}"))
            }
        })?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| AppError::BadRequest(format!("{name} must be UTF-8 text")))
}

async fn read_form(mut payload: Multipart, max_media_bytes: usize) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "message" => {
                form.message = Some(read_text(&mut field, "message", MAX_MESSAGE_BYTES).await?)
            }
            "lat" => form.lat = Some(read_text(&mut field, "lat", MAX_COORDINATE_BYTES).await?),
            "lon" => form.lon = Some(read_text(&mut field, "lon", MAX_COORDINATE_BYTES).await?),
            "image" => {
                let content_type = field.content_type().map(|mime| mime.to_string());
                let content = read_field(&mut field, max_media_bytes)
                    .await
                    .map_err(|e| match e {
                        FieldReadError::TooLarge => AppError::PayloadTooLarge(format!(
                            "image exceeds {max_media_bytes} bytes"
                        )),
                        FieldReadError::Stream(reason) => {
                            tracing::error!("Error reading image field: {}", reason);
                            AppError::Internal(format!("could not read image: {reason}"))
                        }
                    })?;
                form.image = Some(MediaUpload {
                    content,
                    content_type,
                });
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
                }
            }
        }
    }

    Ok(form)
}

/// POST /post (multipart: message, lat, lon, optional image)
///
/// The author is the authenticated user, never a form field.
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let (message, location, image) = read_form(payload, state.max_media_bytes)
        .await?
        .into_parts()?;

    let id = state
        .posts
        .create_post(&user.0, &message, location, image)
        .await?;

    Ok(HttpResponse::Ok().json(CreatePostResponse {
        id,
        message: format!("Post received: {message}"),
    }))
}
