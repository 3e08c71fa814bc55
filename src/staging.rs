use crate::{error::AnalyzerError, request::is_allowed_file};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Upper bound for the images of one upload.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Reduces an uploaded file name to a safe, flat ASCII name.
///
/// Path separators become word breaks, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9._-]` is dropped and leading/trailing `.`/`_` are
/// stripped, so the result can never escape the staging directory.
pub fn sanitize_filename(name: &str) -> String {
    let flattened = name.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Name an upload is staged under.
///
/// Uses the sanitized name when it still carries an allowed extension;
/// otherwise (e.g. a name written entirely in non-ASCII characters) falls back
/// to `upload-{index}.{ext}` with the extension of the original name.
pub fn staged_name(index: usize, original: &str) -> String {
    let sanitized = sanitize_filename(original);
    if is_allowed_file(&sanitized) {
        return sanitized;
    }

    let ext = original
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    format!("upload-{index}.{ext}")
}

/// Tracks how many image bytes one upload has consumed.
#[derive(Debug)]
pub struct UploadBudget {
    limit: usize,
    used: usize,
}

impl UploadBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    pub fn consume(&mut self, len: usize) -> Result<(), AnalyzerError> {
        self.used = self.used.saturating_add(len);
        if self.used > self.limit {
            return Err(AnalyzerError::PayloadTooLarge { limit: self.limit });
        }
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

impl Default for UploadBudget {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_BYTES)
    }
}

/// Per-request directory inside the uploads folder.
///
/// Files are written here only long enough to be read back for encoding; the
/// directory and everything in it is removed when the area is dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn create(upload_dir: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let upload_dir = upload_dir.as_ref();
        std::fs::create_dir_all(upload_dir)?;

        let dir = tempfile::Builder::new()
            .prefix("analysis-")
            .tempdir_in(upload_dir)?;

        log::debug!("Staging uploads in {}", dir.path().display());

        Ok(Self { dir })
    }

    /// Writes one uploaded file under an already sanitized name.
    ///
    /// A name already used in this area gets a `-N` suffix before the
    /// extension, so every upload keeps its own file.
    pub fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AnalyzerError> {
        let mut path = self.dir.path().join(file_name);

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{ext}")),
            None => (file_name, String::new()),
        };
        let mut suffix = 1;
        while path.exists() {
            path = self.dir.path().join(format!("{stem}-{suffix}{ext}"));
            suffix += 1;
        }

        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("bracket_rev-B.png"), "bracket_rev-B.png");
    }

    #[test]
    fn test_sanitize_flattens_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\drawings\\plan.png"), "C_drawings_plan.png");
        assert_eq!(sanitize_filename("/abs/part.tif"), "abs_part.tif");
    }

    #[test]
    fn test_sanitize_whitespace_and_symbols() {
        assert_eq!(sanitize_filename("my  drawing (v2).jpg"), "my_drawing_v2.jpg");
        assert_eq!(sanitize_filename("  .hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_staged_name_keeps_clean_names() {
        assert_eq!(staged_name(0, "plan.png"), "plan.png");
        assert_eq!(staged_name(3, "my plan.TIF"), "my_plan.TIF");
    }

    #[test]
    fn test_staged_name_falls_back_for_non_ascii() {
        assert_eq!(staged_name(0, "正面図.png"), "upload-0.png");
        assert_eq!(staged_name(2, "断面.JPEG"), "upload-2.jpeg");
    }

    #[test]
    fn test_stage_never_overwrites() {
        let uploads = tempfile::tempdir().unwrap();
        let staging = StagingArea::create(uploads.path()).unwrap();

        let first = staging.stage("plan.png", b"first").unwrap();
        let second = staging.stage("plan.png", b"second").unwrap();
        let third = staging.stage("plan.png", b"third").unwrap();

        assert_eq!(first.file_name().unwrap(), "plan.png");
        assert_eq!(second.file_name().unwrap(), "plan-1.png");
        assert_eq!(third.file_name().unwrap(), "plan-2.png");
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn test_budget_allows_up_to_limit() {
        let mut budget = UploadBudget::new(10);
        budget.consume(4).unwrap();
        budget.consume(6).unwrap();
        assert_eq!(budget.used(), 10);
        assert!(matches!(
            budget.consume(1),
            Err(AnalyzerError::PayloadTooLarge { limit: 10 })
        ));
    }

    #[test]
    fn test_default_budget_is_sixteen_mebibytes() {
        let mut budget = UploadBudget::default();
        budget.consume(16 * 1024 * 1024).unwrap();
        assert!(budget.consume(1).is_err());
    }

    #[test]
    fn test_staging_area_removed_on_drop() {
        let uploads = tempfile::tempdir().unwrap();
        let staged_dir;
        {
            let staging = StagingArea::create(uploads.path().join("uploads")).unwrap();
            let path = staging.stage("plan.png", b"bytes").unwrap();
            assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
            assert!(path.starts_with(staging.path()));
            staged_dir = staging.path().to_path_buf();
        }
        assert!(!staged_dir.exists());
        assert!(uploads.path().join("uploads").exists());
    }
}
