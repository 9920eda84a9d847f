//! Generation request validation.
//!
//! Turns the loosely typed field bag that arrives over HTTP (multipart form
//! fields are all strings, JSON bodies may already be structured) into a
//! [`GenerationRequest`]. Nothing here performs I/O; a request that fails
//! validation never reaches the model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{GenerationRequest, ImageData, Satisfaction};

pub const MIN_IMAGES: usize = 1;
pub const MAX_IMAGES: usize = 4;

/// Menus as sent by a client: a real list, or a JSON string holding one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenusField {
    List(Vec<String>),
    Encoded(String),
}

impl MenusField {
    fn into_list(self) -> Result<Vec<String>, ValidationError> {
        match self {
            MenusField::List(menus) => Ok(menus),
            MenusField::Encoded(text) => {
                serde_json::from_str::<Vec<String>>(&text).map_err(|_| ValidationError::MalformedMenus)
            }
        }
    }
}

/// Unvalidated generation input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerationFields {
    #[serde(default)]
    pub images: Vec<ImageData>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub menus: Option<MenusField>,
    #[serde(default)]
    pub satisfaction: Option<String>,
}

impl From<GenerationRequest> for RawGenerationFields {
    fn from(request: GenerationRequest) -> Self {
        Self {
            images: request.images,
            restaurant_name: request.restaurant_name,
            menus: Some(MenusField::List(request.menus)),
            satisfaction: Some(request.satisfaction.as_str().to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected {MIN_IMAGES}-{MAX_IMAGES} images, got {0}")]
    ImageCount(usize),
    #[error("menus must be a list of strings")]
    MalformedMenus,
    #[error("at least one menu is required")]
    EmptyMenus,
    #[error("unknown satisfaction: {0:?}")]
    InvalidSatisfaction(Option<String>),
}

impl ValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::ImageCount(_) => "images",
            ValidationError::MalformedMenus | ValidationError::EmptyMenus => "menus",
            ValidationError::InvalidSatisfaction(_) => "satisfaction",
        }
    }

    /// Localized message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::ImageCount(0) => "이미지를 하나 이상 업로드해주세요.".to_string(),
            ValidationError::ImageCount(_) => {
                format!("이미지는 최대 {MAX_IMAGES}개까지 업로드할 수 있습니다.")
            }
            ValidationError::MalformedMenus => "메뉴 형식이 올바르지 않습니다.".to_string(),
            ValidationError::EmptyMenus => "메뉴를 하나 이상 입력해주세요.".to_string(),
            ValidationError::InvalidSatisfaction(_) => "만족도를 선택해주세요.".to_string(),
        }
    }
}

/// Validate `fields` into a [`GenerationRequest`].
///
/// Checks run in field order (images, menus, satisfaction) and the first
/// failure is returned. A blank restaurant name becomes `None`; every other
/// value passes through unchanged.
pub fn validate_generation(
    fields: RawGenerationFields,
) -> Result<GenerationRequest, ValidationError> {
    let count = fields.images.len();
    if !(MIN_IMAGES..=MAX_IMAGES).contains(&count) {
        return Err(ValidationError::ImageCount(count));
    }

    let menus = fields
        .menus
        .ok_or(ValidationError::MalformedMenus)?
        .into_list()?;
    if menus.is_empty() {
        return Err(ValidationError::EmptyMenus);
    }

    let satisfaction = fields
        .satisfaction
        .as_deref()
        .and_then(|s| s.parse::<Satisfaction>().ok())
        .ok_or_else(|| ValidationError::InvalidSatisfaction(fields.satisfaction.clone()))?;

    let restaurant_name = fields.restaurant_name.filter(|name| !name.trim().is_empty());

    Ok(GenerationRequest {
        images: fields.images,
        restaurant_name,
        menus,
        satisfaction,
    })
}
