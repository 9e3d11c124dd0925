use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// File extensions the catalog treats as images (compared case-insensitively).
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

const MAX_ID_LEN: usize = 255;
const FALLBACK_STEM: &str = "image";

/// Stable, externally addressable name of one stored image.
///
/// An identifier doubles as the blob's file name in the store directory, so
/// it is restricted to `[A-Za-z0-9._-]`, may not start with `.` and is at
/// most 255 bytes. Hidden names are reserved for in-flight temporary files.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

impl ImageId {
    /// Validate and wrap an identifier.
    pub fn parse(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        let invalid = |reason: &str| TypeError::InvalidImageId {
            id: s.clone(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty"));
        }
        if s.len() > MAX_ID_LEN {
            return Err(invalid("longer than 255 bytes"));
        }
        if s.starts_with('.') {
            return Err(invalid("leading dot"));
        }
        if let Some(c) = s.chars().find(|c| !is_allowed(*c)) {
            return Err(invalid(&format!("disallowed character {c:?}")));
        }
        Ok(Self(s))
    }

    /// Assign a fresh identifier for an upload named `original_name`.
    ///
    /// The result is `<uuid-v7>-<sanitised name>`. `sniffed_extension` is
    /// appended when the name carries no recognised image extension.
    pub fn assign(original_name: &str, sniffed_extension: Option<&str>) -> Self {
        let mut name = sanitize_file_name(original_name);
        if !has_recognized_extension(&name) {
            if let Some(ext) = sniffed_extension {
                name.push('.');
                name.push_str(ext);
            }
        }
        let mut id = format!("{}-{}", Uuid::now_v7().simple(), name);
        if id.len() > MAX_ID_LEN {
            // Trim the middle of the name so the extension survives.
            let ext = extension_of(&id)
                .filter(|e| e.len() <= 16)
                .map(|e| format!(".{e}"))
                .unwrap_or_default();
            id.truncate(MAX_ID_LEN - ext.len());
            id.push_str(&ext);
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text after the final `.`, if any.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.0)
    }

    /// Whether the identifier ends in one of [`RECOGNIZED_EXTENSIONS`].
    pub fn has_image_extension(&self) -> bool {
        has_recognized_extension(&self.0)
    }

    /// MIME type implied by the extension.
    pub fn content_type(&self) -> Option<&'static str> {
        self.extension().and_then(content_type_for_extension)
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImageId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

/// MIME type for a recognised image extension.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

fn has_recognized_extension(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| {
        RECOGNIZED_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}

/// Reduce an uploaded file name to a safe final path component.
fn sanitize_file_name(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}
