use crate::{codec, error::AnalyzerError, model::normalize_model_name};
use std::path::Path;

/// Image file extensions accepted by both front ends.
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif"];

/// Checks the text after the last `.` against the allow-list, ignoring case.
pub fn is_allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Returns the trimmed prompt, or a validation error if nothing is left.
pub fn validate_prompt(prompt: &str) -> Result<String, AnalyzerError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AnalyzerError::validation("No prompt provided"));
    }
    Ok(prompt.to_string())
}

/// A validated analysis call: one prompt, one model and 1..N encoded images.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
}

/// Text produced by the model for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResponse {
    pub text: String,
}

impl AnalysisRequest {
    /// Builds a request from already encoded images.
    pub fn new(model: &str, prompt: &str, images: Vec<String>) -> Result<Self, AnalyzerError> {
        let prompt = validate_prompt(prompt)?;
        if images.is_empty() {
            return Err(AnalyzerError::validation("No valid images provided"));
        }

        Ok(Self {
            model: normalize_model_name(model),
            prompt,
            images,
        })
    }

    /// Validates the inputs and encodes every image from disk, in order.
    ///
    /// The prompt and extensions are checked before any file is read, so bad
    /// input is rejected without touching the filesystem or the backend.
    pub fn from_paths<P: AsRef<Path>>(
        model: &str,
        prompt: &str,
        paths: &[P],
    ) -> Result<Self, AnalyzerError> {
        let prompt = validate_prompt(prompt)?;
        if paths.is_empty() {
            return Err(AnalyzerError::validation("No images provided"));
        }

        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            if !is_allowed_file(name) {
                return Err(AnalyzerError::validation(format!(
                    "Unsupported image format: {} (allowed: {})",
                    path.display(),
                    ALLOWED_EXTENSIONS.join(", ")
                )));
            }
        }

        let images = paths
            .iter()
            .map(codec::encode_image)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(model, &prompt, images)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions_pass() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(is_allowed_file(&format!("x.{ext}")), "{ext} should pass");
            assert!(
                is_allowed_file(&format!("x.{}", ext.to_uppercase())),
                "{ext} should pass in upper case"
            );
        }
    }

    #[test]
    fn test_other_extensions_rejected() {
        for name in ["x.pdf", "x.svg", "x.webp", "x.dwg", "x.png.exe", "x", "png", "x."] {
            assert!(!is_allowed_file(name), "{name} should be rejected");
        }
    }

    #[test]
    fn test_blank_prompts_rejected() {
        for prompt in ["", "   ", "\n\t "] {
            assert!(matches!(
                validate_prompt(prompt),
                Err(AnalyzerError::Validation(_))
            ));
        }
        assert_eq!(validate_prompt("  Scale?  ").unwrap(), "Scale?");
    }

    #[test]
    fn test_new_normalizes_model_and_trims_prompt() {
        let request =
            AnalysisRequest::new("llava", "  List the dimensions ", vec!["AAAA".into()]).unwrap();
        assert_eq!(request.model(), "llava:latest");
        assert_eq!(request.prompt(), "List the dimensions");
        assert_eq!(request.image_count(), 1);
    }

    #[test]
    fn test_new_requires_an_image() {
        assert!(matches!(
            AnalysisRequest::new("llava", "What is this?", Vec::new()),
            Err(AnalyzerError::Validation(_))
        ));
    }

    #[test]
    fn test_from_paths_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("front.png");
        let second = dir.path().join("side.JPG");
        std::fs::write(&first, b"front").unwrap();
        std::fs::write(&second, b"side").unwrap();

        let request = AnalysisRequest::from_paths("moondream", "Compare", &[&first, &second]).unwrap();
        assert_eq!(
            request.images(),
            &[codec::encode_bytes(b"front"), codec::encode_bytes(b"side")]
        );
        assert_eq!(request.model(), "moondream:latest");
    }

    #[test]
    fn test_from_paths_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            AnalysisRequest::from_paths("llava", "Scale?", &[missing]),
            Err(AnalyzerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_from_paths_rejects_before_reading() {
        // None of these paths exist, so a NotFound would mean a file was read.
        assert!(matches!(
            AnalysisRequest::from_paths("llava", " ", &["missing.png"]),
            Err(AnalyzerError::Validation(_))
        ));
        assert!(matches!(
            AnalysisRequest::from_paths("llava", "Scale?", &["missing.pdf"]),
            Err(AnalyzerError::Validation(_))
        ));
        assert!(matches!(
            AnalysisRequest::from_paths::<&str>("llava", "Scale?", &[]),
            Err(AnalyzerError::Validation(_))
        ));
    }
}
