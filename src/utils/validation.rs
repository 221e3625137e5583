use anyhow::{Result, anyhow};
use uuid::Uuid;

/// Prefix under which every uploaded blob is stored
pub const UPLOAD_PREFIX: &str = "uploads";

const MAX_FILENAME_BYTES: usize = 255;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Sanitizes an uploaded filename to a single safe path segment.
/// Browsers may send full client paths with either separator, so only the last
/// component is kept.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or("")
        .trim();

    if name != filename.trim() {
        tracing::warn!("Stripped client path from uploaded filename: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(sanitized)
}

/// Builds a fresh storage key for a sanitized filename. The random directory
/// keeps keys unique while the last segment stays the original name.
pub fn storage_key_for(filename: &str) -> String {
    format!("{}/{}/{}", UPLOAD_PREFIX, Uuid::new_v4(), filename)
}

/// A storage key must be relative and must not escape the storage root.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
