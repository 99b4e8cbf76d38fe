use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Optional unique id; absent for records never persisted remotely.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Identifier {
    pub id: Option<Uuid>,
}

/// An identified record that may belong to some other entity.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct EntityTrait {
    #[serde(flatten)]
    pub identifier: Identifier,
    #[serde(rename = "entityId")]
    pub entity_id: Option<Uuid>,
}

/// Creation/update instants. Informational only.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Timestamps {
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One downloadable artifact of a release.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(flatten)]
    pub entity: EntityTrait,

    #[serde(rename = "type", default)]
    pub file_type: String,
    pub url: String,
    pub mime: Option<String>,
    /// Declared byte count; used for the idempotent-download check.
    pub size: Option<i64>,
    #[serde(default)]
    pub version: i32,
    #[serde(rename = "deploymentType", default)]
    pub deployment: String,
    #[serde(default)]
    pub platform: String,
    /// Relative path preserving the release directory structure on disk.
    pub original_path: Option<String>,

    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl File {
    /// Local target path: `originalPath`, or the id string when absent.
    /// A file carrying neither cannot be placed on disk.
    pub fn local_path(&self) -> Option<String> {
        match self.original_path.as_deref() {
            Some(path) if !path.is_empty() => Some(path.to_string()),
            _ => self.entity.identifier.id.map(|id| id.to_string()),
        }
    }

    pub fn expected_size(&self) -> i64 {
        self.size.unwrap_or(0)
    }
}

/// One release as described by the API: app identity plus the ordered
/// file manifest to download.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMetadata {
    #[serde(flatten)]
    pub identifier: Identifier,
    #[serde(default)]
    pub app_id: Uuid,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub version: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<File>,
}

/// The API wraps release metadata under a `data` envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseMetadataContainer {
    pub data: ReleaseMetadata,
}

/// Shape of the `/auth/login` response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub status: String,
    pub data: Option<String>,
    pub message: Option<String>,
}
