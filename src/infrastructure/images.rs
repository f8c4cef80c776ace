use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// A data URI decoded into servable bytes.
pub struct DecodedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// File extension for the `Content-Disposition` filename.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Decode a `data:image/...;base64,...` URI produced by the image model.
/// Returns `None` for anything malformed; callers skip such images with a
/// warning rather than failing the batch.
pub fn decode_data_uri(uri: &str) -> Option<DecodedImage> {
    let rest = uri.strip_prefix("data:")?;
    let (metadata, payload) = rest.split_once(',')?;
    let media_type = metadata.strip_suffix(";base64")?;

    if !media_type.starts_with("image/") {
        return None;
    }

    let bytes = BASE64.decode(payload.trim()).ok()?;
    if bytes.is_empty() {
        return None;
    }

    Some(DecodedImage {
        content_type: media_type.to_string(),
        bytes,
    })
}
