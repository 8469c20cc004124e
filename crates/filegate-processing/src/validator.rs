use filegate_core::models::{Category, FileMetadata, ValidationResult};
use filegate_core::policy::{normalize_mime_type, FilePolicy};

use crate::filename::{check_filename, final_segment, split_extension};
use crate::format::format_bytes;

/// Warning attached to every failed binary-signature check.
pub const SPOOFING_WARNING: &str = "Possible file type spoofing detected";

/// Validation failures. The `Display` text is what ends up in
/// `ValidationResult::errors`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No file provided")]
    NoFile,

    #[error("File is empty")]
    EmptyFile,

    #[error("MIME type \"{mime_type}\" is not allowed. Allowed types: {allowed}")]
    MimeTypeNotAllowed { mime_type: String, allowed: String },

    #[error("File extension \".{extension}\" does not match MIME type \"{mime_type}\"")]
    ExtensionMismatch {
        extension: String,
        mime_type: String,
    },

    #[error("File size {size} exceeds maximum allowed size {max} for {category} files")]
    FileTooLarge {
        size: String,
        max: String,
        category: String,
    },

    #[error("File binary signature does not match declared MIME type \"{mime_type}\"")]
    SignatureMismatch { mime_type: String },

    #[error("File is too small to be valid {mime_type} content ({actual} of {expected} signature bytes)")]
    TooSmallForSignature {
        mime_type: String,
        actual: usize,
        expected: usize,
    },

    #[error("Path traversal detected in filename")]
    PathTraversal,

    #[error("Filename contains illegal characters")]
    IllegalCharacters,

    #[error("Filename is a reserved system name")]
    ReservedName,

    #[error("Filename is too long (max {max} characters)")]
    NameTooLong { max: usize },
}

impl ValidationError {
    /// Whether this failure means the content may be lying about its type.
    pub fn is_spoofing_signal(&self) -> bool {
        matches!(
            self,
            ValidationError::SignatureMismatch { .. } | ValidationError::TooSmallForSignature { .. }
        )
    }
}

/// Upload validator
///
/// Runs the whitelist, extension, size, binary-signature and filename checks
/// against a fixed `FilePolicy`. Checks accumulate: one call reports every
/// problem found, except for an empty upload which short-circuits.
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    policy: FilePolicy,
}

impl FileValidator {
    pub fn new(policy: FilePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FilePolicy {
        &self.policy
    }

    /// Validate an upload that may be missing entirely.
    pub fn validate_upload(&self, file: Option<&FileMetadata>) -> ValidationResult {
        match file {
            Some(file) => self.validate(file),
            None => {
                tracing::warn!("File validation failed: no file provided");
                ValidationResult::rejected(ValidationError::NoFile.to_string())
            }
        }
    }

    pub fn validate(&self, file: &FileMetadata) -> ValidationResult {
        if file.size_bytes == 0 {
            tracing::warn!(
                filename = %file.original_name,
                "File validation failed: empty file"
            );
            return ValidationResult::rejected(ValidationError::EmptyFile.to_string());
        }

        let mime_type = normalize_mime_type(&file.declared_mime_type);
        let mut errors = Vec::new();

        if let Err(e) = self.check_mime_type(&file.declared_mime_type, &mime_type) {
            errors.push(e);
        }
        if let Err(e) =
            self.check_extension(&file.original_name, &file.declared_mime_type, &mime_type)
        {
            errors.push(e);
        }
        if let Err(e) = self.check_size(file.size_bytes, &mime_type) {
            errors.push(e);
        }
        if let Err(e) = self.check_signature(&file.content, &file.declared_mime_type, &mime_type) {
            errors.push(e);
        }
        errors.extend(check_filename(&file.original_name));

        let warnings = if errors.iter().any(ValidationError::is_spoofing_signal) {
            vec![SPOOFING_WARNING.to_string()]
        } else {
            Vec::new()
        };

        let result = ValidationResult::new(
            errors.iter().map(ToString::to_string).collect(),
            warnings,
        );

        if result.is_valid() {
            tracing::debug!(
                filename = %file.original_name,
                size_bytes = file.size_bytes,
                mime_type = %mime_type,
                "File validation passed"
            );
        } else {
            tracing::warn!(
                filename = %file.original_name,
                errors = %result.errors().join(", "),
                "File validation failed"
            );
        }

        result
    }

    pub fn category_of(&self, mime_type: &str) -> Option<Category> {
        self.policy.category_of(mime_type)
    }

    /// Category name for a MIME type, `"unknown"` when it is not whitelisted.
    pub fn get_category(&self, mime_type: &str) -> &'static str {
        self.category_of(mime_type)
            .map(|c| c.as_str())
            .unwrap_or("unknown")
    }

    fn check_mime_type(&self, declared: &str, normalized: &str) -> Result<(), ValidationError> {
        if self.policy.is_allowed(normalized) {
            return Ok(());
        }
        Err(ValidationError::MimeTypeNotAllowed {
            mime_type: declared.to_string(),
            allowed: self.policy.allowed_mime_types().join(", "),
        })
    }

    fn check_extension(
        &self,
        filename: &str,
        declared: &str,
        normalized: &str,
    ) -> Result<(), ValidationError> {
        let Some(extension) = split_extension(final_segment(filename)).1.map(str::to_lowercase) else {
            return Ok(());
        };

        match self.policy.canonical_mime_for_extension(&extension) {
            Some(canonical) if canonical != normalized => Err(ValidationError::ExtensionMismatch {
                extension,
                mime_type: declared.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn check_size(&self, size_bytes: u64, mime_type: &str) -> Result<(), ValidationError> {
        let category = self.policy.category_of(mime_type);
        let max = self.policy.max_size_for(category);
        if size_bytes <= max {
            return Ok(());
        }
        Err(ValidationError::FileTooLarge {
            size: format_bytes(size_bytes),
            max: format_bytes(max),
            category: category.map(|c| c.as_str()).unwrap_or("default").to_string(),
        })
    }

    fn check_signature(
        &self,
        content: &[u8],
        declared: &str,
        normalized: &str,
    ) -> Result<(), ValidationError> {
        let Some(signature) = self.policy.magic_number_for(normalized) else {
            return Ok(());
        };

        if content.len() < signature.len() {
            return Err(ValidationError::TooSmallForSignature {
                mime_type: declared.to_string(),
                actual: content.len(),
                expected: signature.len(),
            });
        }

        if !content.starts_with(signature) {
            tracing::warn!(
                mime_type = %normalized,
                "Binary signature mismatch, possible file type spoofing"
            );
            return Err(ValidationError::SignatureMismatch {
                mime_type: declared.to_string(),
            });
        }

        Ok(())
    }
}
