use std::path::Path;

use mcqgen_core::config::BatchConfig;

use crate::error::PipelineError;

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it by its final path component.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }
}

/// Documents to process, with optional per-run overrides of the configured
/// chunking parameters.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub files: Vec<InputFile>,
    pub questions_per_pdf: Option<usize>,
    pub chunk_size: Option<usize>,
    pub overlap: Option<usize>,
}

impl BatchRequest {
    pub fn new(files: Vec<InputFile>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }
}

/// Check the whole file list before anything is processed.
pub fn validate_files(limits: &BatchConfig, files: &[InputFile]) -> Result<(), PipelineError> {
    if files.is_empty() {
        return Err(PipelineError::NoFiles);
    }
    if files.len() > limits.max_files {
        return Err(PipelineError::TooManyFiles {
            count: files.len(),
            max: limits.max_files,
        });
    }
    for file in files {
        if !limits.is_allowed(&file.filename) {
            return Err(PipelineError::UnsupportedFileType(file.filename.clone()));
        }
        let size = file.bytes.len() as u64;
        if size > limits.max_file_bytes {
            return Err(PipelineError::FileTooLarge {
                filename: file.filename.clone(),
                size,
                max: limits.max_file_bytes,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, len: usize) -> InputFile {
        InputFile::new(name, vec![0u8; len])
    }

    #[test]
    fn empty_request_rejected() {
        assert!(matches!(
            validate_files(&BatchConfig::default(), &[]),
            Err(PipelineError::NoFiles)
        ));
    }

    #[test]
    fn too_many_files_rejected() {
        let files: Vec<_> = (0..4).map(|i| pdf(&format!("{i}.pdf"), 1)).collect();
        assert!(matches!(
            validate_files(&BatchConfig::default(), &files),
            Err(PipelineError::TooManyFiles { count: 4, max: 3 })
        ));
    }

    #[test]
    fn wrong_extension_rejected_even_after_good_files() {
        let files = vec![pdf("a.pdf", 1), pdf("b.docx", 1)];
        match validate_files(&BatchConfig::default(), &files) {
            Err(PipelineError::UnsupportedFileType(name)) => assert_eq!(name, "b.docx"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn size_limit_applies() {
        let limits = BatchConfig {
            max_file_bytes: 10,
            ..Default::default()
        };
        assert!(validate_files(&limits, &[pdf("a.PDF", 10)]).is_ok());
        let err = validate_files(&limits, &[pdf("a.pdf", 11)]).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(err, PipelineError::FileTooLarge { size: 11, .. }));
    }

    #[test]
    fn from_path_uses_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let file = InputFile::from_path(&path).unwrap();
        assert_eq!(file.filename, "notes.txt");
        assert_eq!(file.bytes, b"hello");
    }
}
