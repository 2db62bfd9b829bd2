use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single published audio sermon.
///
/// Field names are serialized in camelCase because the on-disk layout and the
/// import/export format store records verbatim in that shape. Deserialization
/// is lenient: absent fields fill with defaults, since imported backups are
/// stored as-is and their element shape is not validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sermon {
    pub id: String,
    pub title: String,
    pub preacher: String,
    pub series: String,
    /// ISO calendar date (`YYYY-MM-DD`). The sole sort key, descending.
    pub date: String,
    pub scripture: String,
    pub description: String,
    pub audio_url: String,
    /// Display string only. The authoritative duration comes from the
    /// transport at playback time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Sermon {
    pub fn into_fields(self) -> SermonFields {
        SermonFields {
            title: self.title,
            preacher: self.preacher,
            series: self.series,
            date: self.date,
            scripture: self.scripture,
            description: self.description,
            audio_url: self.audio_url,
            duration: self.duration,
            tags: self.tags,
        }
    }

    pub fn from_fields(id: String, fields: SermonFields) -> Self {
        Self {
            id,
            title: fields.title,
            preacher: fields.preacher,
            series: fields.series,
            date: fields.date,
            scripture: fields.scripture,
            description: fields.description,
            audio_url: fields.audio_url,
            duration: fields.duration,
            tags: fields.tags,
        }
    }
}

/// Every `Sermon` field except `id` — the document body written to the remote
/// collection, whose identifier lives outside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SermonFields {
    pub title: String,
    pub preacher: String,
    pub series: String,
    pub date: String,
    pub scripture: String,
    pub description: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Whether `id` is a provisional identifier: one minted on-device and not yet
/// replaced by a server-assigned id. Provisional ids are purely numeric
/// (epoch milliseconds); server ids always contain non-digit characters.
///
/// Disambiguating by string shape is fragile, but the wire format stores ids
/// as plain strings. If a tagged id type ever replaces the heuristic, this
/// predicate is the seam.
pub fn is_provisional_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Mint a provisional id from the current epoch milliseconds.
pub fn provisional_id() -> String {
    Utc::now().timestamp_millis().to_string()
}
