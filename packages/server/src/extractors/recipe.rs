use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use foodgram_common::image::{self, DecodedImage, ImageError};
use foodgram_common::model::{IngredientSpec, RecipeDraft, RecipePatch};
use foodgram_common::storage::AssetKey;

use super::json::AppJson;
use crate::error::AppError;
use crate::models::recipe::{IngredientAmountRequest, RecipeRequest};

/// Recipe payload sent either as JSON (image as a data URI) or as
/// `multipart/form-data` (image as a file part).
///
/// Multipart fields: `image`, `name`, `text`, `cooking_time`, `tags` (repeated
/// or comma-separated ids) and `ingredients` (a JSON array of `{id, amount}`).
pub struct RecipeSubmission {
    pub request: RecipeRequest,
    pub image: Option<DecodedImage>,
}

impl RecipeSubmission {
    /// Converts a create payload into a draft plus the image to store.
    /// Every field is required; the draft's image is the content key the
    /// asset store will assign.
    pub fn into_draft(self) -> Result<(RecipeDraft, DecodedImage), AppError> {
        let r = self.request;
        let draft = RecipeDraft {
            name: required(r.name, "name")?,
            image: String::new(),
            text: required(r.text, "text")?,
            cooking_time: required(r.cooking_time, "cooking_time")?,
            tag_ids: required(r.tags, "tags")?,
            ingredients: specs(required(r.ingredients, "ingredients")?),
        };
        let image = required(self.image, "image")?;
        let key = AssetKey::for_content(&image.bytes, &image.extension);
        Ok((
            RecipeDraft {
                image: key.to_string(),
                ..draft
            },
            image,
        ))
    }

    pub fn into_patch(self, image_key: Option<String>) -> RecipePatch {
        let r = self.request;
        RecipePatch {
            name: r.name,
            image: image_key,
            text: r.text,
            cooking_time: r.cooking_time,
            tag_ids: r.tags,
            ingredients: r.ingredients.map(specs),
        }
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::invalid_field(field, "This field is required"))
}

fn specs(items: Vec<IngredientAmountRequest>) -> Vec<IngredientSpec> {
    items.into_iter().map(IngredientSpec::from).collect()
}

impl<S> FromRequest<S> for RecipeSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            return from_multipart(multipart).await;
        }

        let AppJson(mut request) = AppJson::<RecipeRequest>::from_request(req, state).await?;
        let image = request
            .image
            .take()
            .map(|uri| image::decode_data_uri(&uri))
            .transpose()?;
        Ok(Self { request, image })
    }
}

async fn from_multipart(mut multipart: Multipart) -> Result<RecipeSubmission, AppError> {
    let mut request = RecipeRequest::default();
    let mut image = None;
    let mut tags: Option<Vec<i32>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "image" => image = Some(read_image(field).await?),
            "name" => request.name = Some(read_text(field).await?),
            "text" => request.text = Some(read_text(field).await?),
            "cooking_time" => {
                request.cooking_time = Some(parse_id("cooking_time", &read_text(field).await?)?)
            }
            "tags" => {
                let raw = read_text(field).await?;
                let ids = tags.get_or_insert_with(Vec::new);
                for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    ids.push(parse_id("tags", part)?);
                }
            }
            "ingredients" => {
                let raw = read_text(field).await?;
                let items = serde_json::from_str(&raw).map_err(|e| {
                    AppError::invalid_field("ingredients", format!("Invalid ingredients: {e}"))
                })?;
                request.ingredients = Some(items);
            }
            _ => {}
        }
    }

    request.tags = tags;
    Ok(RecipeSubmission { request, image })
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))
}

fn parse_id(field: &'static str, raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_field(field, format!("Expected an integer, got {raw:?}")))
}

/// A file part is typed by its content type, falling back to the file name.
/// A plain text part is read as a data URI.
async fn read_image(field: Field<'_>) -> Result<DecodedImage, AppError> {
    let file_name = field.file_name().map(str::to_owned);
    let content_type = field
        .content_type()
        .filter(|ct| !ct.starts_with("application/octet-stream") && !ct.starts_with("text/"))
        .map(str::to_owned);

    if file_name.is_none() && content_type.is_none() {
        return Ok(image::decode_data_uri(&read_text(field).await?)?);
    }

    let mime = content_type
        .or_else(|| {
            file_name
                .as_deref()
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.essence_str().to_owned())
        })
        .ok_or_else(|| ImageError::UnsupportedType("unknown".into()))?;
    let extension = image::extension_for_mime(&mime)?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?;
    if bytes.is_empty() {
        return Err(ImageError::Empty.into());
    }
    Ok(DecodedImage {
        bytes: bytes.to_vec(),
        extension,
    })
}
