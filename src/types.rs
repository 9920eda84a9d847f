//! Shared data model for generation requests, tweet variations, and share
//! records.
//!
//! These types cross every boundary in the crate: the HTTP surface
//! deserializes them from request bodies, the generation client and share
//! store consume them, and the CLI client deserializes them back from
//! responses. JSON field names are camelCase to match the browser client.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How much the user liked the meal. Serialized as the Korean label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Satisfaction {
    #[serde(rename = "애매함")]
    Meh,
    #[serde(rename = "나쁘지 않음")]
    NotBad,
    #[serde(rename = "맛있음")]
    Tasty,
    #[serde(rename = "개쩜")]
    Amazing,
}

impl Satisfaction {
    pub const ALL: [Satisfaction; 4] = [
        Satisfaction::Meh,
        Satisfaction::NotBad,
        Satisfaction::Tasty,
        Satisfaction::Amazing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Satisfaction::Meh => "애매함",
            Satisfaction::NotBad => "나쁘지 않음",
            Satisfaction::Tasty => "맛있음",
            Satisfaction::Amazing => "개쩜",
        }
    }
}

impl fmt::Display for Satisfaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Satisfaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Satisfaction::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Register of a generated tweet.
///
/// - `Honest` (솔직톤): blunt, plain
/// - `Meme` (드립톤): meme-inflected, self-deprecating jokes
/// - `Extreme` (극단톤): hyperbolic praise or roast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "솔직톤")]
    Honest,
    #[serde(rename = "드립톤")]
    Meme,
    #[serde(rename = "극단톤")]
    Extreme,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Honest, Tone::Meme, Tone::Extreme];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Honest => "솔직톤",
            Tone::Meme => "드립톤",
            Tone::Extreme => "극단톤",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque image payload.
///
/// Held as raw bytes in memory; serialized as standard base64 text. A
/// `data:<mime>;base64,` prefix is accepted on input and stripped.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData(Vec<u8>);

impl ImageData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn from_base64(text: &str) -> Result<Self, base64::DecodeError> {
        let payload = match text.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => text,
        };
        BASE64.decode(payload.trim()).map(Self)
    }

    /// MIME type sniffed from the leading bytes; `image/jpeg` when unknown.
    pub fn mime_type(&self) -> &'static str {
        image::guess_format(&self.0)
            .map(|format| format.to_mime_type())
            .unwrap_or("image/jpeg")
    }

    /// Inline data URL labelled with [`ImageData::mime_type`].
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageData({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ImageData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ImageData::from_base64(&text).map_err(serde::de::Error::custom)
    }
}

/// A validated request to generate tweet drafts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// 1–4 photos, in upload order.
    pub images: Vec<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    /// At least one menu item, in the order the user entered them.
    pub menus: Vec<String>,
    pub satisfaction: Satisfaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetVariation {
    pub content: String,
    pub tone: Tone,
}

/// Result of a generation call. Zero variations is a valid outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub variations: Vec<TweetVariation>,
}

/// Body of `POST /api/share`: the generation inputs plus what was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub images: Vec<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    pub menus: Vec<String>,
    pub satisfaction: Satisfaction,
    pub variations: Vec<TweetVariation>,
}

impl ShareRequest {
    pub fn from_generation(request: &GenerationRequest, variations: Vec<TweetVariation>) -> Self {
        Self {
            images: request.images.clone(),
            restaurant_name: request.restaurant_name.clone(),
            menus: request.menus.clone(),
            satisfaction: request.satisfaction,
            variations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_id: String,
}

/// A persisted, immutable snapshot of a generation result and its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTweetRecord {
    pub id: String,
    pub images: Vec<ImageData>,
    pub restaurant_name: Option<String>,
    pub menus: Vec<String>,
    pub satisfaction: Satisfaction,
    pub variations: Vec<TweetVariation>,
    pub created_at: DateTime<Utc>,
}
