//! File policy tables
//!
//! The MIME whitelist, per-category size limits, magic-number table and
//! extension map. A `FilePolicy` is built once at startup (defaults plus
//! environment overrides, see `config`) and handed to the validation engine;
//! it is never mutated afterwards.

use std::collections::{BTreeMap, HashMap};

use crate::models::Category;

const MB: u64 = 1024 * 1024;

pub const DEFAULT_DOCUMENT_MAX_BYTES: u64 = 100 * MB;
pub const DEFAULT_IMAGE_MAX_BYTES: u64 = 20 * MB;
pub const DEFAULT_ARCHIVE_MAX_BYTES: u64 = 500 * MB;
pub const DEFAULT_DATA_MAX_BYTES: u64 = 10 * MB;
pub const DEFAULT_UNMAPPED_MAX_BYTES: u64 = 50 * MB;

/// Leading byte sequence that a format must start with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicNumber {
    pub mime_type: String,
    pub signature: Vec<u8>,
}

impl MagicNumber {
    pub fn new(mime_type: &str, signature: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            signature: signature.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilePolicy {
    mime_whitelist: BTreeMap<Category, Vec<String>>,
    size_limits: BTreeMap<Category, u64>,
    default_max_size: u64,
    magic_numbers: Vec<MagicNumber>,
    extension_mime: HashMap<String, String>,
}

/// Normalize MIME type by stripping parameters and case
/// (e.g. "Image/JPEG; charset=utf-8" -> "image/jpeg").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for FilePolicy {
    fn default() -> Self {
        let mut mime_whitelist = BTreeMap::new();
        mime_whitelist.insert(
            Category::Document,
            strings(&[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.oasis.opendocument.text",
                "application/rtf",
                "text/plain",
            ]),
        );
        mime_whitelist.insert(
            Category::Image,
            strings(&[
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/svg+xml",
            ]),
        );
        mime_whitelist.insert(
            Category::Archive,
            strings(&[
                "application/zip",
                "application/x-tar",
                "application/gzip",
                "application/x-7z-compressed",
            ]),
        );
        mime_whitelist.insert(
            Category::Data,
            strings(&[
                "application/json",
                "application/xml",
                "text/xml",
                "text/csv",
            ]),
        );

        let mut size_limits = BTreeMap::new();
        size_limits.insert(Category::Document, DEFAULT_DOCUMENT_MAX_BYTES);
        size_limits.insert(Category::Image, DEFAULT_IMAGE_MAX_BYTES);
        size_limits.insert(Category::Archive, DEFAULT_ARCHIVE_MAX_BYTES);
        size_limits.insert(Category::Data, DEFAULT_DATA_MAX_BYTES);

        let magic_numbers = vec![
            MagicNumber::new("application/pdf", &[0x25, 0x50, 0x44, 0x46]),
            MagicNumber::new("image/jpeg", &[0xFF, 0xD8, 0xFF]),
            MagicNumber::new("image/png", &[0x89, 0x50, 0x4E, 0x47]),
            MagicNumber::new("application/zip", &[0x50, 0x4B, 0x03, 0x04]),
            MagicNumber::new("application/gzip", &[0x1F, 0x8B]),
        ];

        let extension_mime = [
            ("pdf", "application/pdf"),
            ("doc", "application/msword"),
            (
                "docx",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            ("odt", "application/vnd.oasis.opendocument.text"),
            ("rtf", "application/rtf"),
            ("txt", "text/plain"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("png", "image/png"),
            ("gif", "image/gif"),
            ("webp", "image/webp"),
            ("svg", "image/svg+xml"),
            ("zip", "application/zip"),
            ("tar", "application/x-tar"),
            ("gz", "application/gzip"),
            ("json", "application/json"),
            ("xml", "application/xml"),
            ("csv", "text/csv"),
        ]
        .into_iter()
        .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
        .collect();

        Self {
            mime_whitelist,
            size_limits,
            default_max_size: DEFAULT_UNMAPPED_MAX_BYTES,
            magic_numbers,
            extension_mime,
        }
    }
}

impl FilePolicy {
    /// Replace the allowed MIME types of one category.
    pub fn with_allowed_types(mut self, category: Category, mime_types: Vec<String>) -> Self {
        let normalized = mime_types
            .iter()
            .map(|m| normalize_mime_type(m))
            .filter(|m| !m.is_empty())
            .collect();
        self.mime_whitelist.insert(category, normalized);
        self
    }

    pub fn with_size_limit(mut self, category: Category, max_bytes: u64) -> Self {
        self.size_limits.insert(category, max_bytes);
        self
    }

    pub fn with_default_size_limit(mut self, max_bytes: u64) -> Self {
        self.default_max_size = max_bytes;
        self
    }

    /// Add or replace the signature required for a MIME type.
    pub fn with_magic_number(mut self, magic: MagicNumber) -> Self {
        let mime = normalize_mime_type(&magic.mime_type);
        self.magic_numbers.retain(|m| m.mime_type != mime);
        self.magic_numbers.push(MagicNumber {
            mime_type: mime,
            signature: magic.signature,
        });
        self
    }

    pub fn with_extension_mapping(mut self, extension: &str, mime_type: &str) -> Self {
        self.extension_mime.insert(
            extension.trim_start_matches('.').to_lowercase(),
            normalize_mime_type(mime_type),
        );
        self
    }

    /// Category whose whitelist contains the MIME type.
    pub fn category_of(&self, mime_type: &str) -> Option<Category> {
        let normalized = normalize_mime_type(mime_type);
        self.mime_whitelist
            .iter()
            .find(|(_, mimes)| mimes.iter().any(|m| *m == normalized))
            .map(|(category, _)| *category)
    }

    pub fn is_allowed(&self, mime_type: &str) -> bool {
        self.category_of(mime_type).is_some()
    }

    /// Every whitelisted MIME type, in category order.
    pub fn allowed_mime_types(&self) -> Vec<&str> {
        self.mime_whitelist
            .values()
            .flat_map(|mimes| mimes.iter().map(String::as_str))
            .collect()
    }

    pub fn allowed_types_for(&self, category: Category) -> &[String] {
        self.mime_whitelist
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Size limit for a category; unmapped types get the default limit.
    pub fn max_size_for(&self, category: Option<Category>) -> u64 {
        category
            .and_then(|c| self.size_limits.get(&c).copied())
            .unwrap_or(self.default_max_size)
    }

    pub fn magic_number_for(&self, mime_type: &str) -> Option<&[u8]> {
        let normalized = normalize_mime_type(mime_type);
        self.magic_numbers
            .iter()
            .find(|m| m.mime_type == normalized)
            .map(|m| m.signature.as_slice())
    }

    pub fn canonical_mime_for_extension(&self, extension: &str) -> Option<&str> {
        self.extension_mime
            .get(&extension.to_lowercase())
            .map(String::as_str)
    }
}
