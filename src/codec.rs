use crate::error::AnalyzerError;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::Path;

/// Reads an image from disk and returns its bytes as standard base64.
///
/// The codec does not look at the image format; extension checks are done by
/// the caller.
pub fn encode_image(path: impl AsRef<Path>) -> Result<String, AnalyzerError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AnalyzerError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Encoded {} ({} bytes)", path.display(), bytes.len());

    Ok(encode_bytes(&bytes))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Builds a `data:` URI so the browser can display an already encoded image.
pub fn data_uri(file_name: &str, payload: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    format!("data:image/{ext};base64,{payload}")
}
