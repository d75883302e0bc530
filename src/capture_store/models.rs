//! Catalog models stored in the captures database.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub friendly_name: Option<String>,
}

impl Artist {
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub id: i64,
    pub artist: Option<Artist>,
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
}

/// Field data submitted when creating or editing a capture.
///
/// Every field is optional on the wire so that a partially filled form still
/// reaches validation and gets per-field errors back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureForm {
    pub name: String,
    pub description: String,
    pub artist_id: Option<i64>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
}

impl From<&Capture> for CaptureForm {
    fn from(capture: &Capture) -> Self {
        CaptureForm {
            name: capture.name.clone(),
            description: capture.description.clone(),
            artist_id: capture.artist.as_ref().map(|artist| artist.id),
            sku: capture.sku.clone(),
            price: Some(capture.price),
            rating: capture.rating,
            image_url: capture.image_url.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOrderKey {
    /// `LOWER(name)`
    NameCaseInsensitive,
    /// Name of the associated artist, captures without one first.
    ArtistName,
    /// A capture column named verbatim by the caller.
    Field(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureOrdering {
    pub key: CaptureOrderKey,
    pub descending: bool,
}

/// Filters and ordering applied by `CaptureStore::query_captures`.
///
/// Filters combine conjunctively. Without an ordering captures come back by
/// ascending id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureQuery {
    pub artist_names: Option<Vec<String>>,
    pub text: Option<String>,
    pub ordering: Option<CaptureOrdering>,
}
