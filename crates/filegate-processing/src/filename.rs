//! Filename safety checks and sanitization.
//!
//! Trust decisions are made on the raw name with `check_filename`;
//! `sanitize_filename` only produces a display/storage-safe variant.

use crate::validator::ValidationError;

pub const MAX_FILENAME_LENGTH: usize = 255;
const MAX_SANITIZED_STEM_LENGTH: usize = 200;
const ILLEGAL_CHARACTERS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];
const RESERVED_NAMES: [&str; 4] = ["CON", "PRN", "AUX", "NUL"];

fn is_illegal(c: char) -> bool {
    c.is_control() || ILLEGAL_CHARACTERS.contains(&c)
}

/// Final path segment, splitting on both `/` and `\`.
pub(crate) fn final_segment(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name)
}

fn has_drive_prefix(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

fn is_reserved_name(stem: &str) -> bool {
    let upper = stem.to_ascii_uppercase();
    if RESERVED_NAMES.contains(&upper.as_str()) {
        return true;
    }
    match upper.strip_prefix("COM").or_else(|| upper.strip_prefix("LPT")) {
        Some(digit) => digit.len() == 1 && matches!(digit.as_bytes()[0], b'1'..=b'9'),
        None => false,
    }
}

/// Split a filename into stem and extension. A leading dot does not start an
/// extension (`.env` has none), the extension excludes the dot.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Safety checks on a raw filename. Every failing check contributes one error.
pub fn check_filename(name: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let base = final_segment(name);

    if base != name || base == "." || base == ".." || has_drive_prefix(name) {
        errors.push(ValidationError::PathTraversal);
    }

    if base.chars().any(is_illegal) {
        errors.push(ValidationError::IllegalCharacters);
    }

    let (stem, _) = split_extension(base);
    if is_reserved_name(stem) {
        errors.push(ValidationError::ReservedName);
    }

    if base.chars().count() > MAX_FILENAME_LENGTH {
        errors.push(ValidationError::NameTooLong {
            max: MAX_FILENAME_LENGTH,
        });
    }

    errors
}

/// Storage-safe variant of a filename: path stripped, illegal and control
/// characters removed, whitespace runs collapsed to `_`, stem capped at 200
/// characters. Never used for trust decisions.
pub fn sanitize_filename(name: &str) -> String {
    let base = final_segment(name);
    let (stem, extension) = split_extension(base);

    let mut sanitized = String::with_capacity(stem.len());
    let mut in_whitespace = false;
    for c in stem.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if !is_illegal(c) {
            sanitized.push(c);
        }
    }

    let mut sanitized: String = sanitized.chars().take(MAX_SANITIZED_STEM_LENGTH).collect();
    if sanitized.chars().all(|c| c == '.' || c == '_') {
        sanitized = "file".to_string();
    }

    let extension: String = extension
        .unwrap_or_default()
        .chars()
        .filter(|c| !is_illegal(*c) && !c.is_whitespace())
        .collect();

    if extension.is_empty() {
        sanitized
    } else {
        format!("{}.{}", sanitized, extension)
    }
}
