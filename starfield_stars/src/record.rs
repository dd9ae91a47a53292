//! Wire format of the public star feed and its validation into typed records.

use serde::Deserialize;
use starfield_scene::glam::Vec3;
use starfield_scene::{Color, ColorError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct StarRecord {
    pub id: String,
    pub position: Vec3,
    pub color: Color,
    /// Feed-side emphasis; highlighted just like ids in the manager's highlight set.
    pub related: bool,
    pub public_name: Option<String>,
}

impl StarRecord {
    pub fn new(id: impl Into<String>, position: Vec3, color: Color) -> Self {
        Self {
            id: id.into(),
            position,
            color,
            related: false,
            public_name: None,
        }
    }

    pub fn with_related(mut self, related: bool) -> Self {
        self.related = related;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIssue {
    #[error("missing or empty id")]
    MissingId,
    #[error("id `{0}` has leading or trailing whitespace")]
    PaddedId(String),
    #[error("coordinate `{0}` is not a finite number")]
    NonFinite(char),
    #[error(transparent)]
    Color(#[from] ColorError),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("star #{index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("star #{index} (`{id}`) is invalid: {issue}")]
    Invalid {
        index: usize,
        id: String,
        #[source]
        issue: RecordIssue,
    },
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    #[serde(default)]
    stars: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawStarRecord {
    #[serde(rename = "_id", alias = "id", default)]
    id: String,
    x: f64,
    y: f64,
    z: f64,
    color: String,
    #[serde(default)]
    related: bool,
    #[serde(rename = "publicName", default)]
    public_name: Option<String>,
}

impl TryFrom<RawStarRecord> for StarRecord {
    type Error = RecordIssue;

    fn try_from(raw: RawStarRecord) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err(RecordIssue::MissingId);
        }
        if raw.id.trim() != raw.id {
            return Err(RecordIssue::PaddedId(raw.id));
        }
        let mut position = [0.0f32; 3];
        for (slot, (axis, value)) in position
            .iter_mut()
            .zip([('x', raw.x), ('y', raw.y), ('z', raw.z)])
        {
            let value = value as f32;
            if !value.is_finite() {
                return Err(RecordIssue::NonFinite(axis));
            }
            *slot = value;
        }
        Ok(Self {
            id: raw.id,
            position: Vec3::from(position),
            color: raw.color.parse()?,
            related: raw.related,
            public_name: raw.public_name,
        })
    }
}

/// Parses `{ "stars": [...] }`. A missing or null `stars` array is an empty feed; the
/// first malformed entry rejects the whole feed.
pub fn parse_star_feed(json: &str) -> Result<Vec<StarRecord>, RecordError> {
    let envelope: FeedEnvelope = serde_json::from_str(json)?;
    let entries = envelope.stars.unwrap_or_default();
    let mut records = Vec::with_capacity(entries.len());
    for (index, value) in entries.into_iter().enumerate() {
        let raw: RawStarRecord = serde_json::from_value(value)
            .map_err(|source| RecordError::Malformed { index, source })?;
        let id = raw.id.clone();
        let record =
            StarRecord::try_from(raw).map_err(|issue| RecordError::Invalid { index, id, issue })?;
        records.push(record);
    }
    Ok(records)
}
