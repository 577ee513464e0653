//! Whiteboard drawings and their uploaded images.
//!
//! Images live on disk under `<images_dir>/<user>/<drawing>/<image file>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};
use crate::id::{nullable, parse_nullable_id, parse_optional_id};

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    /// Opaque editor scene (`elements`, `appState`, `files`).
    pub scene_data: Value,
    pub folder_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub collaborators: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn empty_scene() -> Value {
    json!({ "elements": [], "appState": {} })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDrawing {
    #[serde(default)]
    pub title: String,
    pub scene_data: Option<Value>,
    pub folder_id: Option<String>,
}

impl NewDrawing {
    pub fn into_drawing(self, user_id: &str, now: DateTime<Utc>) -> SuiteResult<Drawing> {
        if self.title.is_empty() {
            return Err(SuiteError::validation("Title is required"));
        }
        let folder_id = parse_optional_id(self.folder_id.as_deref(), "folder")?;

        Ok(Drawing {
            id: crate::id::new_id(),
            user_id: user_id.to_string(),
            title: self.title,
            scene_data: self.scene_data.unwrap_or_else(empty_scene),
            folder_id,
            thumbnail: None,
            collaborators: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingChanges {
    pub title: Option<String>,
    pub scene_data: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub folder_id: Option<Option<String>>,
    pub thumbnail: Option<String>,
}

impl DrawingChanges {
    pub fn apply(self, drawing: &mut Drawing, now: DateTime<Utc>) -> SuiteResult<()> {
        let title = self.title.filter(|t| !t.is_empty());
        let thumbnail = self.thumbnail.filter(|t| !t.is_empty());
        if title.is_none() && self.scene_data.is_none() && self.folder_id.is_none() && thumbnail.is_none() {
            return Err(SuiteError::validation("Nothing to update"));
        }
        let folder = parse_nullable_id(self.folder_id.as_ref(), "folder")?;

        if let Some(title) = title {
            drawing.title = title;
        }
        if let Some(scene_data) = self.scene_data {
            drawing.scene_data = scene_data;
        }
        if let Some(folder_id) = folder {
            drawing.folder_id = folder_id;
        }
        if let Some(thumbnail) = thumbnail {
            drawing.thumbnail = Some(thumbnail);
        }
        drawing.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    /// Sniff the format from the file's magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<ImageKind> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageKind::Webp)
        } else {
            None
        }
    }

    pub fn from_extension(ext: &str) -> Option<ImageKind> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Webp => "webp",
        }
    }
}

/// Strip everything but `[A-Za-z0-9._-]`.
pub fn sanitize_file_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub image_id: String,
    pub url: String,
    pub mime_type: &'static str,
}

/// Filesystem store for drawing images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base_dir: PathBuf,
}

impl ImageStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        ImageStore {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn drawing_dir(&self, user_id: &str, drawing_id: Uuid) -> PathBuf {
        self.base_dir
            .join(sanitize_file_id(user_id))
            .join(drawing_id.to_string())
    }

    pub fn save(&self, user_id: &str, drawing_id: Uuid, bytes: &[u8]) -> SuiteResult<StoredImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(SuiteError::validation("Image exceeds the 10MB limit"));
        }
        let kind = ImageKind::detect(bytes).ok_or_else(|| {
            SuiteError::validation("Invalid image type. Only PNG, JPEG, and WebP are allowed.")
        })?;

        let dir = self.drawing_dir(user_id, drawing_id);
        fs::create_dir_all(&dir)?;
        restrict_permissions(&dir, 0o700)?;

        let file_name = format!("{}.{}", crate::id::timestamped_id(), kind.extension());
        let path = dir.join(&file_name);
        fs::write(&path, bytes)?;
        restrict_permissions(&path, 0o600)?;

        tracing::debug!(drawing = %drawing_id, file = %file_name, "stored drawing image");

        Ok(StoredImage {
            url: format!("/api/drawings/{drawing_id}/images/{file_name}"),
            image_id: file_name,
            mime_type: kind.mime_type(),
        })
    }

    /// Resolve an image path, refusing anything outside the drawing's directory.
    pub fn locate(&self, user_id: &str, drawing_id: Uuid, image_id: &str) -> SuiteResult<PathBuf> {
        let file_name = sanitize_file_id(image_id);
        if file_name.is_empty() || file_name.chars().all(|c| c == '.') {
            return Err(SuiteError::NotFound("Image"));
        }

        let dir = self.drawing_dir(user_id, drawing_id);
        let allowed = dir.canonicalize().map_err(|_| SuiteError::NotFound("Image"))?;
        let real = dir
            .join(&file_name)
            .canonicalize()
            .map_err(|_| SuiteError::NotFound("Image"))?;

        if !real.starts_with(&allowed) || !real.is_file() {
            return Err(SuiteError::Forbidden("Invalid path".into()));
        }
        Ok(real)
    }

    pub fn read(&self, user_id: &str, drawing_id: Uuid, image_id: &str) -> SuiteResult<(Vec<u8>, &'static str)> {
        let path = self.locate(user_id, drawing_id, image_id)?;
        let bytes = fs::read(&path)?;
        let mime = ImageKind::detect(&bytes)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageKind::from_extension)
            })
            .map_or("application/octet-stream", ImageKind::mime_type);
        Ok((bytes, mime))
    }

    pub fn delete(&self, user_id: &str, drawing_id: Uuid, image_id: &str) -> SuiteResult<()> {
        let path = self.locate(user_id, drawing_id, image_id)?;
        fs::remove_file(path)?;
        Ok(())
    }

    /// Remove every image of a drawing. Missing directories are fine.
    pub fn remove_drawing(&self, user_id: &str, drawing_id: Uuid) -> SuiteResult<()> {
        let dir = self.drawing_dir(user_id, drawing_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> SuiteResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> SuiteResult<()> {
    Ok(())
}
