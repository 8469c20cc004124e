use bytes::Bytes;

/// An upload handed to the gate by the transport layer.
///
/// `size_bytes` is the size the caller declared; it is what size limits are
/// checked against, while signature checks look at `content` itself.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub original_name: String,
    pub declared_mime_type: String,
    pub size_bytes: u64,
    pub content: Bytes,
}

impl FileMetadata {
    /// Build metadata whose declared size is the content length.
    pub fn new(
        original_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            original_name: original_name.into(),
            declared_mime_type: declared_mime_type.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// Override the declared size (multipart parsers report it separately).
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_takes_size_from_content() {
        let file = FileMetadata::new("a.txt", "text/plain", b"hello".to_vec());
        assert_eq!(file.size_bytes, 5);
        assert_eq!(file.content.as_ref(), b"hello");
    }

    #[test]
    fn with_size_overrides_declared_size() {
        let file = FileMetadata::new("a.pdf", "application/pdf", &b"%PDF"[..]).with_size(1024);
        assert_eq!(file.size_bytes, 1024);
        assert_eq!(file.content.len(), 4);
    }
}
