//! Inline image payloads.
//!
//! Images are stored inside the note as `data:image/<subtype>;base64,<payload>`
//! URLs, at most one per note.

use crate::model::note::NoteValidationError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static DATA_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/]+={0,2})$")
        .expect("valid data url regex")
});

/// Checks that `value` is a base64 image data URL with a decodable payload.
pub fn validate_image(value: &str) -> Result<(), NoteValidationError> {
    let caps = DATA_URL_RE.captures(value).ok_or_else(|| {
        NoteValidationError::InvalidImage("expected `data:image/<type>;base64,<payload>`".into())
    })?;

    let payload = caps.get(2).map_or("", |m| m.as_str());
    STANDARD
        .decode(payload)
        .map_err(|err| NoteValidationError::InvalidImage(format!("bad base64 payload: {err}")))?;
    Ok(())
}

/// Encodes raw image bytes as a data URL.
///
/// `mime` must be an `image/*` type and `bytes` must not be empty.
pub fn encode_image(mime: &str, bytes: &[u8]) -> Result<String, NoteValidationError> {
    if !mime.starts_with("image/") {
        return Err(NoteValidationError::InvalidImage(format!(
            "unsupported media type `{mime}`"
        )));
    }
    if bytes.is_empty() {
        return Err(NoteValidationError::InvalidImage("image is empty".into()));
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Guesses an image media type from a file extension.
pub fn image_mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_image, image_mime_for_path, validate_image};
    use std::path::Path;

    #[test]
    fn encoded_image_passes_validation() {
        let url = encode_image("image/png", &[0x89, b'P', b'N', b'G']).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        validate_image(&url).unwrap();
    }

    #[test]
    fn rejects_non_image_and_broken_payloads() {
        assert!(validate_image("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(validate_image("data:image/png;base64,a").is_err());
        assert!(validate_image("https://example.com/cat.png").is_err());
        assert!(encode_image("text/plain", b"x").is_err());
        assert!(encode_image("image/png", b"").is_err());
    }

    #[test]
    fn mime_lookup_is_case_insensitive() {
        assert_eq!(image_mime_for_path(Path::new("a/CAT.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(image_mime_for_path(Path::new("noext")), None);
    }
}
